use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Account {0} has no incentive profile")]
    MissingProfile(i64),

    #[error("Payment routing failed: {0}")]
    Routing(String),

    #[error("Lightning node HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification delivery failed: {0}")]
    Delivery(#[from] teloxide::RequestError),

    #[error("Unknown notification kind: {0}")]
    UnknownNotification(String),

    #[error("Invalid notification subject: {0}")]
    InvalidSubject(String),

    #[error("Exchange rate source error: {0}")]
    RateSource(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Job {name} exceeded its time limit of {limit_secs}s")]
    TimedOut { name: &'static str, limit_secs: u64 },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaintenanceError {
    /// Short machine-readable code used when a batch skips a record.
    pub fn reason_code(&self) -> &'static str {
        match self {
            MaintenanceError::Database(rusqlite::Error::SqliteFailure(e, _))
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                "store_contention"
            }
            MaintenanceError::Database(_) => "store_error",
            MaintenanceError::NotFound(_) => "record_vanished",
            MaintenanceError::MissingProfile(_) => "missing_profile",
            _ => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, MaintenanceError>;
