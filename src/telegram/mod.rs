pub mod channel;
pub mod formatters;

pub use channel::TelegramChannel;
