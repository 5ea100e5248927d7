use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{DeletedUser, Device, User};
use crate::db::types::UserType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    pub(crate) phone_number: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    pub(crate) confirm_password: String,
    #[validate(length(min = 1, max = 150, message = "first_name must be 1-150 characters"))]
    pub(crate) first_name: String,
    #[validate(length(min = 1, max = 150, message = "last_name must be 1-150 characters"))]
    pub(crate) last_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) phone_number: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhoneCheckRequest {
    pub(crate) phone_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PasswordChangeRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    pub(crate) confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserCreate {
    pub(crate) phone_number: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) username: Option<String>,
    #[serde(default)]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) last_name: String,
    #[serde(default = "default_user_type")]
    pub(crate) user_type: UserType,
    #[serde(default = "default_true")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserUpdate {
    #[serde(default)]
    pub(crate) username: Option<String>,
    #[serde(default)]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) user_type: Option<UserType>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
    #[serde(default)]
    pub(crate) bot_options: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default, rename = "type")]
    pub(crate) user_type: Option<UserType>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) phone_number: String,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) user_type: UserType,
    pub(crate) tg_id: Option<i64>,
    pub(crate) balance: i64,
    pub(crate) has_registered_bot: bool,
    pub(crate) not_read_message_count: i32,
    pub(crate) payme_balance: i64,
    pub(crate) photo: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            user_type: user.user_type,
            tg_id: user.tg_id,
            balance: user.balance,
            has_registered_bot: user.has_registered_bot,
            not_read_message_count: user.not_read_message_count,
            payme_balance: user.payme_balance,
            photo: user.photo,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }
}

/// Profile card; `photo_url` is a short-lived link when object storage is configured.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) photo: String,
    pub(crate) photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherResponse {
    pub(crate) id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) photo: String,
}

impl TeacherResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self { id: user.id, first_name: user.first_name, last_name: user.last_name, photo: user.photo }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) created_at: String,
    pub(crate) current: bool,
}

impl DeviceResponse {
    pub(crate) fn from_db(device: Device, current_device: Option<&str>) -> Self {
        Self {
            current: current_device == Some(device.id.as_str()),
            id: device.id,
            title: device.title,
            created_at: format_primitive(device.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletedUserResponse {
    pub(crate) id: String,
    pub(crate) phone_number: String,
    pub(crate) username: Option<String>,
    pub(crate) created_at: String,
}

impl DeletedUserResponse {
    pub(crate) fn from_db(row: DeletedUser) -> Self {
        Self {
            id: row.id,
            phone_number: row.phone_number,
            username: row.username,
            created_at: format_primitive(row.created_at),
        }
    }
}

fn default_user_type() -> UserType {
    UserType::Student
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn register_request_rejects_short_password() {
        let payload: RegisterRequest = serde_json::from_value(serde_json::json!({
            "phone_number": "901234567",
            "password": "short",
            "confirm_password": "short",
            "first_name": "Ali",
            "last_name": "Valiyev"
        }))
        .unwrap();

        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("at least 8"));
    }

    #[test]
    fn user_list_query_reads_type_filter() {
        let query: UserListQuery =
            serde_json::from_value(serde_json::json!({"type": "teacher"})).unwrap();
        assert_eq!(query.user_type, Some(UserType::Teacher));
        assert_eq!(query.limit, 100);
        assert_eq!(query.skip, 0);
    }
}
