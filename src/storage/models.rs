use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// Staff accounts are never reclaimed.
    pub is_privileged: bool,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncentiveProfile {
    pub account_id: i64,
    pub pending_rewards: u64,
    pub earned_rewards: u64,
    pub claimed_rewards: u64,
    pub telegram_enabled: bool,
    pub telegram_chat_id: Option<i64>,
    pub total_contracts: u32,
}

impl IncentiveProfile {
    /// True when the profile holds any reward balance.
    pub fn has_rewards(&self) -> bool {
        self.pending_rewards > 0 || self.earned_rewards > 0 || self.claimed_rewards > 0
    }
}

/// A profile selected for reward promotion, labelled by its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardCandidate {
    pub username: String,
    pub profile: IncentiveProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Public,
    Paused,
    WaitingMakerBond,
    WaitingTakerBond,
    WaitingBuyerInvoice,
    WaitingTradeEscrow,
    FiatSent,
    InDispute,
    Expired,
    Cancelled,
    CollaborativelyCancelled,
    Success,
    Failed,
    DisputeResolved,
}

impl OrderStatus {
    pub const TERMINAL: [OrderStatus; 6] = [
        OrderStatus::Expired,
        OrderStatus::Cancelled,
        OrderStatus::CollaborativelyCancelled,
        OrderStatus::Success,
        OrderStatus::Failed,
        OrderStatus::DisputeResolved,
    ];
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Public" => Ok(OrderStatus::Public),
            "Paused" => Ok(OrderStatus::Paused),
            "WaitingMakerBond" => Ok(OrderStatus::WaitingMakerBond),
            "WaitingTakerBond" => Ok(OrderStatus::WaitingTakerBond),
            "WaitingBuyerInvoice" => Ok(OrderStatus::WaitingBuyerInvoice),
            "WaitingTradeEscrow" => Ok(OrderStatus::WaitingTradeEscrow),
            "FiatSent" => Ok(OrderStatus::FiatSent),
            "InDispute" => Ok(OrderStatus::InDispute),
            "Expired" => Ok(OrderStatus::Expired),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "CollaborativelyCancelled" => Ok(OrderStatus::CollaborativelyCancelled),
            "Success" => Ok(OrderStatus::Success),
            "Failed" => Ok(OrderStatus::Failed),
            "DisputeResolved" => Ok(OrderStatus::DisputeResolved),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub maker_id: i64,
    pub taker_id: Option<i64>,
    pub status: OrderStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub order_id: i64,
    pub sender: String,
    pub text: String,
}

/// One side of a trade as seen by the notification layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub account_id: i64,
    pub username: String,
    pub telegram_enabled: bool,
    pub telegram_chat_id: Option<i64>,
}

/// An order resolved together with the people it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    pub order: Order,
    pub maker: Participant,
    pub taker: Option<Participant>,
}

impl OrderContext {
    /// Participants that opted in to notifications.
    pub fn subscribers(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.maker)
            .chain(self.taker.iter())
            .filter(|p| p.telegram_enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Cancelled,
    Succeeded,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Cancelled" => Ok(PaymentStatus::Cancelled),
            "Succeeded" => Ok(PaymentStatus::Succeeded),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// Lightning payout or bond tracked by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightningPayment {
    pub payment_hash: String,
    pub invoice: String,
    pub num_satoshis: u64,
    /// Maximum routing fee as parts per million of `num_satoshis`.
    pub routing_budget_ppm: u64,
    pub status: PaymentStatus,
    pub last_routing_time: Option<DateTime<Utc>>,
    pub order_made_expires_at: Option<DateTime<Utc>>,
    pub order_taken_expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Display for LightningPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hash = match self.payment_hash.char_indices().nth(12) {
            Some((end, _)) => &self.payment_hash[..end],
            None => &self.payment_hash,
        };
        write!(f, "LN-{}: {} sats ({})", hash, self.num_satoshis, self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnchainStatus {
    Created,
    Queued,
    Cancelled,
    Sent,
    Failed,
}

impl OnchainStatus {
    /// Statuses that never produced a transaction and can be reclaimed.
    pub const RECLAIMABLE: [OnchainStatus; 2] = [OnchainStatus::Cancelled, OnchainStatus::Created];
}

impl std::fmt::Display for OnchainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for OnchainStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Created" => Ok(OnchainStatus::Created),
            "Queued" => Ok(OnchainStatus::Queued),
            "Cancelled" => Ok(OnchainStatus::Cancelled),
            "Sent" => Ok(OnchainStatus::Sent),
            "Failed" => Ok(OnchainStatus::Failed),
            other => Err(format!("unknown onchain status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnchainPayment {
    pub id: i64,
    pub num_satoshis: u64,
    pub status: OnchainStatus,
    pub order_expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Display for OnchainPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TX-{}: {} sats ({})", self.id, self.num_satoshis, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrice {
    pub currency_id: i64,
    pub code: String,
    pub exchange_rate: f64,
    pub timestamp: DateTime<Utc>,
}
