//! Intake gateway: Telegram webhook parsing, commands, validation, enqueue.

pub mod gateway;
pub mod messages;
pub mod update;

pub use gateway::{handle_update, parse_command, Command};
pub use update::TelegramUpdate;
