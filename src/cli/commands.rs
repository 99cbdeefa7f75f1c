use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trade-janitor")]
#[command(about = "Background maintenance jobs for a Lightning P2P exchange")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (without extension)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete accounts that were never really used
    UsersCleansing,

    /// Promote pending referral rewards to earned
    GiveRewards,

    /// Pay out a Lightning payment and follow it until the node reports back
    FollowSendPayment {
        /// Payment hash of the payout
        hash: String,
    },

    /// Delete cancelled payments of long-expired orders
    PaymentsCleansing,

    /// Refresh cached exchange rates
    CacheMarket,

    /// Notify the participants of an order
    #[command(group(ArgGroup::new("subject").required(true).args(["order_id", "chat_message_id"])))]
    SendNotification {
        /// Notification kind, e.g. order_published
        #[arg(short, long)]
        message: String,

        /// Order the notification is about
        #[arg(long)]
        order_id: Option<i64>,

        /// Chat message the notification is about
        #[arg(long)]
        chat_message_id: Option<i64>,
    },

    /// List jobs and their time limits
    Jobs,

    /// Initialize database and show configuration
    Init,
}
