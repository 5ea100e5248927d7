use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod auth;
pub(crate) mod certificate;
pub(crate) mod course;
pub(crate) mod dates;
pub(crate) mod lesson;
pub(crate) mod module;
pub(crate) mod payment;
pub(crate) mod progress;
pub(crate) mod task;
pub(crate) mod user;
pub(crate) mod video;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}
