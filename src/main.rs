mod cli;

use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trade_janitor::{
    config::Config,
    error::{MaintenanceError, Result},
    jobs::{run_job, JobKind},
    lightning::{LndRouter, SettlementTracker},
    market::{JsonRateSource, MarketPriceCache},
    notifications::{NotificationDispatcher, NotificationEvent, NotificationKind, NotificationSubject},
    reclaim::{PaymentsCleansing, UsersCleansing},
    rewards::RewardRollup,
    storage::Database,
    telegram::TelegramChannel,
    utils,
};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trade_janitor=debug,info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match Config::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::UsersCleansing => users_cleansing(&config).await,
        Commands::GiveRewards => give_rewards(&config).await,
        Commands::FollowSendPayment { hash } => follow_send_payment(&config, &hash).await,
        Commands::PaymentsCleansing => payments_cleansing(&config).await,
        Commands::CacheMarket => cache_market(&config).await,
        Commands::SendNotification {
            message,
            order_id,
            chat_message_id,
        } => send_notification(&config, &message, order_id, chat_message_id).await,
        Commands::Jobs => {
            list_jobs();
            Ok(())
        }
        Commands::Init => initialize(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn print_summary<T: Serialize>(summary: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

async fn users_cleansing(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let summary = run_job(JobKind::UsersCleansing, async {
        UsersCleansing::new(&db).run(Utc::now())
    })
    .await?;
    print_summary(&summary)
}

async fn give_rewards(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let summary = run_job(JobKind::GiveRewards, async { RewardRollup::new(&db).run() }).await?;
    print_summary(&summary)
}

async fn follow_send_payment(config: &Config, hash: &str) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let router = LndRouter::new(&config.lightning)?;
    let tracker = SettlementTracker::new(&db, &router, config.payouts.clone());

    let outcome = run_job(JobKind::FollowSendPayment, tracker.track(hash, Utc::now())).await?;
    print_summary(&outcome)
}

async fn payments_cleansing(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let summary = run_job(JobKind::PaymentsCleansing, async {
        PaymentsCleansing::new(&db).run(Utc::now())
    })
    .await?;
    print_summary(&summary)
}

async fn cache_market(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let source = JsonRateSource::new(config.market_config()?);
    let summary = run_job(
        JobKind::CacheMarket,
        MarketPriceCache::new(&db, &source).run(Utc::now()),
    )
    .await?;
    print_summary(&summary)
}

async fn send_notification(
    config: &Config,
    message: &str,
    order_id: Option<i64>,
    chat_message_id: Option<i64>,
) -> Result<()> {
    let kind: NotificationKind = message.parse().map_err(|e: MaintenanceError| {
        error!("Refusing to dispatch: {}", e);
        e
    })?;

    let subject = match (order_id, chat_message_id) {
        (Some(id), None) => NotificationSubject::Order(id),
        (None, Some(id)) => NotificationSubject::ChatMessage(id),
        _ => {
            return Err(MaintenanceError::InvalidSubject(
                "pass exactly one of --order-id or --chat-message-id".to_string(),
            ))
        }
    };

    let db = Database::new(&config.database.path)?;
    let channel = TelegramChannel::new(config.telegram_config()?);
    let dispatcher = NotificationDispatcher::new(&db, &channel);
    let event = NotificationEvent::new(kind, subject);

    run_job(JobKind::SendNotification, dispatcher.dispatch(&event)).await?;
    info!("{} handled", kind);
    Ok(())
}

fn list_jobs() {
    println!("{}", "=== Maintenance Jobs ===".cyan().bold());
    utils::print_table_border(48);
    utils::print_table_row(&["Job", "Time limit"], &[32, 12]);
    utils::print_table_border(48);
    for job in JobKind::ALL {
        utils::print_table_row(&[job.name(), &utils::format_limit(job.time_limit())], &[32, 12]);
    }
    utils::print_table_border(48);
}

fn initialize(config: &Config) -> Result<()> {
    println!("{}", "Initializing trade janitor...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Database:       {}", config.database.path);
    println!("  LND REST:       {}", config.lightning.rest_url);
    println!("  Payouts:        {}", if config.payouts.permissioned { "permissioned (suppressed)".yellow() } else { "enabled".green() });
    println!("  Payout timeout: {}s", config.payouts.timeout_seconds);
    println!("  Telegram:       {}", if config.telegram.is_some() { "configured" } else { "not configured" });
    println!("  Market rates:   {}", config.market.as_ref().map_or("not configured", |m| m.rates_url.as_str()));

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to see every job", "trade-janitor jobs".yellow());
    println!("  {} to delete unused accounts", "trade-janitor users-cleansing".yellow());
    Ok(())
}
