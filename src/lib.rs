pub mod config;
pub mod error;
pub mod jobs;
pub mod lightning;
pub mod market;
pub mod notifications;
pub mod reclaim;
pub mod rewards;
pub mod storage;
pub mod telegram;
pub mod utils;

pub use config::Config;
pub use error::{MaintenanceError, Result};
