use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::schemas::user::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TokenUser {
    pub(crate) user_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) phone: String,
}

impl TokenUser {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenPairResponse {
    pub(crate) access: String,
    pub(crate) refresh: String,
    pub(crate) user: TokenUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    pub(crate) refresh: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessResponse {
    pub(crate) access: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceLoginResponse {
    pub(crate) token: String,
    pub(crate) expiry: String,
    pub(crate) user: UserResponse,
}
