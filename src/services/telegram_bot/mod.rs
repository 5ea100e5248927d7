use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::core::metrics::record_bot_event;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::services::bot_registration::{self, ContactShare, RegistrationOutcome};

const BOT_OFFSET_KEY: &str = "registration";
const RETRY_DELAY: Duration = Duration::from_secs(3);

const ASK_PHONE_TEXT: &str = "nomeringizni kiriting ☎";
const PHONE_BUTTON_TEXT: &str = "phone_button";
const ALREADY_REGISTERED_TEXT: &str = "siz royxatdan o'tkansiz 😊";
const FOREIGN_CONTACT_TEXT: &str = "Iltimos, o'zingizning raqamingizni yuboring ☎";
const INVALID_PHONE_TEXT: &str = "Raqam noto'g'ri formatda. +998XXXXXXXXX ko'rinishida yuboring";
const RATE_LIMITED_TEXT: &str = "Juda ko'p urinish. Birozdan so'ng qayta urinib ko'ring";

#[derive(Clone)]
pub(crate) struct TelegramBotRuntime {
    state: AppState,
    client: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct TgGetUpdatesResponse {
    ok: bool,
    result: Vec<TgUpdate>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
    contact: Option<TgContact>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
    #[serde(rename = "type")]
    chat_type: String,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgContact {
    phone_number: String,
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TgOkResponse {
    ok: bool,
    description: Option<String>,
}

/// What the bot does with one incoming message.
#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    Start,
    Contact(ContactShareParts),
    Other,
}

#[derive(Debug, PartialEq, Eq)]
struct ContactShareParts {
    phone_number: String,
    contact_user_id: Option<i64>,
}

fn classify(message: &TgMessage) -> Incoming {
    if let Some(contact) = &message.contact {
        return Incoming::Contact(ContactShareParts {
            phone_number: contact.phone_number.clone(),
            contact_user_id: contact.user_id,
        });
    }

    match message.text.as_deref().map(str::trim) {
        Some(text) if text == "/start" || text.starts_with("/start ") => Incoming::Start,
        _ => Incoming::Other,
    }
}

fn contact_keyboard() -> Value {
    json!({
        "keyboard": [[{ "text": PHONE_BUTTON_TEXT, "request_contact": true }]],
        "resize_keyboard": true,
        "one_time_keyboard": true,
    })
}

fn site_link_html(site_url: &str) -> String {
    let site = escape_html(site_url);
    format!("link in site <a href=\"{site}\">{site}</a>")
}

impl TelegramBotRuntime {
    pub(crate) fn new(state: AppState) -> Self {
        Self { token: state.settings().telegram().token.clone(), state, client: Client::new() }
    }

    pub(crate) async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if !self.state.settings().telegram().enabled {
            tracing::info!("Telegram bot is disabled, runtime exits");
            return Ok(());
        }

        if self.token.is_empty() {
            return Err(anyhow!("TG_TOKEN is empty while TELEGRAM_BOT_ENABLED=true"));
        }

        tracing::info!("Telegram bot runtime started");

        let mut offset = crate::repositories::telegram_offsets::load(self.state.db(), BOT_OFFSET_KEY)
            .await
            .context("Failed to load persisted Telegram updates offset")?
            .unwrap_or(0);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let updates = tokio::select! {
                _ = shutdown.changed() => break,
                fetched = self.get_updates(offset) => fetched,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(error) => {
                    tracing::error!(error = %error, "Failed to fetch Telegram updates");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = update.update_id + 1;
                if let Some(message) = update.message {
                    if let Err(error) = self.handle_message(message).await {
                        record_bot_event("error");
                        tracing::error!(error = %error, "Failed to handle Telegram message");
                    }
                }
                if let Err(error) = crate::repositories::telegram_offsets::store(
                    self.state.db(),
                    BOT_OFFSET_KEY,
                    offset,
                    primitive_now_utc(),
                )
                .await
                {
                    tracing::error!(
                        error = %error,
                        offset,
                        "Failed to persist Telegram updates offset"
                    );
                }
            }
        }

        tracing::info!(offset, "Telegram bot runtime stopped");
        Ok(())
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<TgUpdate>> {
        let timeout = self.state.settings().telegram().poll_timeout_seconds;
        let response = self
            .client
            .get(format!("https://api.telegram.org/bot{}/getUpdates", self.token))
            .query(&[
                ("timeout", timeout.to_string()),
                ("offset", offset.to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await
            .context("Telegram getUpdates request failed")?;

        let parsed: TgGetUpdatesResponse =
            response.json().await.context("Failed to decode Telegram getUpdates payload")?;

        if !parsed.ok {
            return Err(anyhow!("Telegram API returned ok=false for getUpdates"));
        }

        Ok(parsed.result)
    }

    async fn handle_message(&self, message: TgMessage) -> Result<()> {
        let Some(from) = message.from.as_ref() else {
            return Ok(());
        };
        if message.chat.chat_type != "private" {
            return Ok(());
        }
        let chat_id = message.chat.id;

        match classify(&message) {
            Incoming::Start => {
                record_bot_event("start");
                self.send(chat_id, ASK_PHONE_TEXT, None, Some(contact_keyboard())).await
            }
            Incoming::Contact(parts) => {
                record_bot_event("contact");
                let share = ContactShare {
                    phone_number: parts.phone_number,
                    contact_user_id: parts.contact_user_id,
                    sender_id: from.id,
                    sender_username: from.username.clone(),
                };
                self.handle_contact(chat_id, &share).await
            }
            Incoming::Other => Ok(()),
        }
    }

    async fn handle_contact(&self, chat_id: i64, share: &ContactShare) -> Result<()> {
        let outcome = bot_registration::register_from_contact(&self.state, share)
            .await
            .context("Failed to register user from contact")?;

        match outcome {
            RegistrationOutcome::Registered { password } => {
                record_bot_event("registered");
                self.send(chat_id, &format!("Your password is {password}"), None, None).await?;
                let site = site_link_html(&self.state.settings().api().site_url);
                self.send(chat_id, &site, Some("HTML"), None).await
            }
            RegistrationOutcome::AlreadyRegistered => {
                record_bot_event("already_registered");
                self.send(chat_id, ALREADY_REGISTERED_TEXT, None, None).await
            }
            RegistrationOutcome::ForeignContact => {
                self.send(chat_id, FOREIGN_CONTACT_TEXT, None, Some(contact_keyboard())).await
            }
            RegistrationOutcome::InvalidPhone => {
                self.send(chat_id, INVALID_PHONE_TEXT, None, Some(contact_keyboard())).await
            }
            RegistrationOutcome::RateLimited => {
                record_bot_event("rate_limited");
                self.send(chat_id, RATE_LIMITED_TEXT, None, None).await
            }
        }
    }

    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        reply_markup: Option<Value>,
    ) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup;
        }

        let response = self
            .client
            .post(format!("https://api.telegram.org/bot{}/sendMessage", self.token))
            .json(&body)
            .send()
            .await
            .context("Telegram sendMessage request failed")?;

        let parsed: TgOkResponse =
            response.json().await.context("Failed to decode Telegram sendMessage payload")?;
        if !parsed.ok {
            return Err(anyhow!(
                "Telegram sendMessage failed: {}",
                parsed.description.unwrap_or_else(|| "unknown error".to_string())
            ));
        }

        Ok(())
    }
}

fn escape_html(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

pub(crate) async fn run(state: AppState, shutdown: watch::Receiver<bool>) -> Result<()> {
    TelegramBotRuntime::new(state).run(shutdown).await
}
