//! Account creation from a phone number shared with the Telegram bot.

use thiserror::Error;
use uuid::Uuid;

use crate::core::redis::BOT_CONTACT_LIMIT;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserType;
use crate::repositories;

const NATIONAL_PHONE_LEN: usize = 9;
const COUNTRY_CODE: &str = "998";

/// A contact message as the bot received it.
#[derive(Debug, Clone)]
pub(crate) struct ContactShare {
    pub(crate) phone_number: String,
    /// Telegram id attached to the contact card; absent for address-book entries.
    pub(crate) contact_user_id: Option<i64>,
    pub(crate) sender_id: i64,
    pub(crate) sender_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RegistrationOutcome {
    Registered { password: String },
    AlreadyRegistered,
    ForeignContact,
    InvalidPhone,
    RateLimited,
}

#[derive(Debug, Error)]
pub(crate) enum RegistrationError {
    #[error("password hashing failed")]
    Hashing(#[from] security::SecurityError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Keeps the digits and reduces `998XXXXXXXXX` to the nine-digit national number.
pub(crate) fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let national = match digits.len() {
        NATIONAL_PHONE_LEN => digits,
        12 if digits.starts_with(COUNTRY_CODE) => digits[COUNTRY_CODE.len()..].to_string(),
        _ => return None,
    };

    Some(national)
}

pub(crate) fn generated_password(phone_number: &str, tg_id: i64) -> String {
    format!("{phone_number}{tg_id}")
}

/// Telegram username when set, otherwise the numeric id.
pub(crate) fn display_name(username: Option<&str>, tg_id: i64) -> String {
    username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| tg_id.to_string())
}

pub(crate) async fn register_from_contact(
    state: &AppState,
    contact: &ContactShare,
) -> Result<RegistrationOutcome, RegistrationError> {
    if contact.contact_user_id != Some(contact.sender_id) {
        return Ok(RegistrationOutcome::ForeignContact);
    }

    let Some(phone_number) = normalize_phone(&contact.phone_number) else {
        return Ok(RegistrationOutcome::InvalidPhone);
    };

    match state.redis().allow(BOT_CONTACT_LIMIT, &contact.sender_id.to_string()).await {
        Ok(true) => {}
        Ok(false) => {
            crate::core::metrics::record_rate_limited(BOT_CONTACT_LIMIT.scope);
            return Ok(RegistrationOutcome::RateLimited);
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rate limit check failed; allowing bot contact");
        }
    }

    if repositories::users::exists_by_phone_or_tg_id(state.db(), &phone_number, contact.sender_id)
        .await?
    {
        return Ok(RegistrationOutcome::AlreadyRegistered);
    }

    let password = generated_password(&phone_number, contact.sender_id);
    let name = display_name(contact.sender_username.as_deref(), contact.sender_id);
    let hashed_password = security::hash_password(&password)?;

    // Unique phone and tg_id constraints settle concurrent contacts for the same person.
    let created = repositories::users::create_if_absent(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            phone_number: &phone_number,
            username: &name,
            first_name: "",
            last_name: &name,
            hashed_password,
            user_type: UserType::Student,
            tg_id: Some(contact.sender_id),
            has_registered_bot: true,
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    match created {
        Some(user) => {
            tracing::info!(user_id = %user.id, tg_id = contact.sender_id, "Registered user from Telegram contact");
            Ok(RegistrationOutcome::Registered { password })
        }
        None => Ok(RegistrationOutcome::AlreadyRegistered),
    }
}
