//! Store capabilities consumed by the maintenance jobs.
//!
//! Each job depends only on the traits it needs so it can be exercised with
//! mocks instead of a full database.

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::storage::models::{
    Account, CachedPrice, ChatMessage, IncentiveProfile, LightningPayment, OnchainPayment,
    OrderContext, RewardCandidate,
};

#[cfg_attr(test, automock)]
pub trait AccountStore {
    /// Non-privileged accounts whose last login is before `inactive_since`
    /// or that never logged in.
    fn inactive_accounts(&self, inactive_since: DateTime<Utc>) -> Result<Vec<Account>>;

    fn profile(&self, account_id: i64) -> Result<Option<IncentiveProfile>>;

    /// Deletes the account together with its profile.
    fn delete_account(&self, account_id: i64) -> Result<()>;
}

/// Answers whether an account is still bound to an open trade.
#[cfg_attr(test, automock)]
pub trait EngagementOracle {
    fn has_active_engagement(&self, account_id: i64) -> Result<bool>;
}

#[cfg_attr(test, automock)]
pub trait RewardStore {
    /// Profiles with a positive pending balance.
    fn pending_rewards(&self) -> Result<Vec<RewardCandidate>>;

    /// Moves `amount` from pending to earned in a single write and returns
    /// the resulting earned balance, or `None` when the pending balance no
    /// longer covers `amount` (another run already promoted it).
    fn promote_pending(&self, account_id: i64, amount: u64) -> Result<Option<u64>>;
}

#[cfg_attr(test, automock)]
pub trait PaymentStore {
    /// Cancelled Lightning payments whose made or taken order expired before
    /// `expired_before`.
    fn stale_lightning_payments(&self, expired_before: DateTime<Utc>) -> Result<Vec<LightningPayment>>;

    /// Cancelled or never-broadcast on-chain payments whose order expired
    /// before `expired_before`, or that have no order.
    fn stale_onchain_payments(&self, expired_before: DateTime<Utc>) -> Result<Vec<OnchainPayment>>;

    fn delete_lightning_payment(&self, payment_hash: &str) -> Result<()>;

    fn delete_onchain_payment(&self, id: i64) -> Result<()>;

    fn lightning_payment(&self, payment_hash: &str) -> Result<Option<LightningPayment>>;

    fn stamp_routing_attempt(&self, payment_hash: &str, at: DateTime<Utc>) -> Result<()>;
}

#[cfg_attr(test, automock)]
pub trait OrderStore {
    fn order_context(&self, order_id: i64) -> Result<Option<OrderContext>>;

    fn chat_message(&self, message_id: i64) -> Result<Option<ChatMessage>>;
}

#[cfg_attr(test, automock)]
pub trait PriceStore {
    fn upsert_price(&self, price: &CachedPrice) -> Result<()>;
}
