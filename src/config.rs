use serde::Deserialize;

/// Default budget for a single payout attempt, in seconds.
pub const DEFAULT_PAYOUT_TIMEOUT_SECONDS: u64 = 90;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub payouts: PayoutConfig,
    pub lightning: LightningConfig,
    pub telegram: Option<TelegramConfig>,
    pub market: Option<MarketConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Settings consumed by the settlement tracker.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PayoutConfig {
    /// When set, every payout is held back and the tracker returns without
    /// touching the node.
    #[serde(default)]
    pub permissioned: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            permissioned: false,
            timeout_seconds: DEFAULT_PAYOUT_TIMEOUT_SECONDS,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_PAYOUT_TIMEOUT_SECONDS
}

#[derive(Debug, Deserialize, Clone)]
pub struct LightningConfig {
    pub rest_url: String,
    #[serde(default)]
    pub macaroon_hex: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub rates_url: String,
}

impl Config {
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("database.path", "janitor.db")?
            .set_default("payouts.permissioned", false)?
            .set_default("payouts.timeout_seconds", DEFAULT_PAYOUT_TIMEOUT_SECONDS)?
            .set_default("lightning.rest_url", "https://127.0.0.1:8080")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("JANITOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("database.path cannot be empty");
        }
        if self.payouts.timeout_seconds == 0 {
            anyhow::bail!("payouts.timeout_seconds must be positive");
        }
        Ok(())
    }

    pub fn telegram_config(&self) -> crate::error::Result<&TelegramConfig> {
        self.telegram
            .as_ref()
            .ok_or_else(|| crate::error::MaintenanceError::Config("Telegram configuration missing".to_string()))
    }

    pub fn market_config(&self) -> crate::error::Result<&MarketConfig> {
        self.market
            .as_ref()
            .ok_or_else(|| crate::error::MaintenanceError::Config("Market configuration missing".to_string()))
    }
}
