pub mod db;
pub mod models;
pub mod ports;

pub use db::Database;
pub use models::{
    Account, CachedPrice, ChatMessage, IncentiveProfile, LightningPayment, OnchainPayment,
    OnchainStatus, Order, OrderContext, OrderStatus, Participant, PaymentStatus, RewardCandidate,
};
pub use ports::{AccountStore, EngagementOracle, OrderStore, PaymentStore, PriceStore, RewardStore};
