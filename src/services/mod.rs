pub(crate) mod bot_registration;
pub(crate) mod devices;
pub(crate) mod slug;
pub(crate) mod storage;
pub(crate) mod telegram_bot;
