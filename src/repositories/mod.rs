pub(crate) mod certificates;
pub(crate) mod counters;
pub(crate) mod courses;
pub(crate) mod deleted_users;
pub(crate) mod devices;
pub(crate) mod health;
pub(crate) mod lesson_questions;
pub(crate) mod lessons;
pub(crate) mod modules;
pub(crate) mod payments;
pub(crate) mod progress;
pub(crate) mod task_chats;
pub(crate) mod tasks;
pub(crate) mod telegram_offsets;
pub(crate) mod users;
pub(crate) mod videos;
