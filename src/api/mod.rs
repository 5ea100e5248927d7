pub(crate) mod account;
pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod certificates;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod lessons;
pub(crate) mod modules;
pub(crate) mod pagination;
pub(crate) mod payments;
pub(crate) mod progress;
pub(crate) mod router;
pub(crate) mod tasks;
pub(crate) mod users;
pub(crate) mod validation;
pub(crate) mod videos;
