use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    error::Result,
    storage::models::{ChatMessage, OrderContext},
};

/// Where notifications are delivered. One method per notification kind.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn welcome(&self, context: &OrderContext) -> Result<()>;
    async fn order_expired_untaken(&self, context: &OrderContext) -> Result<()>;
    async fn trade_successful(&self, context: &OrderContext) -> Result<()>;
    async fn public_order_cancelled(&self, context: &OrderContext) -> Result<()>;
    async fn taker_expired_before_bond(&self, context: &OrderContext) -> Result<()>;
    async fn order_published(&self, context: &OrderContext) -> Result<()>;
    async fn order_taken_confirmed(&self, context: &OrderContext) -> Result<()>;
    async fn fiat_exchange_starts(&self, context: &OrderContext) -> Result<()>;
    async fn dispute_opened(&self, context: &OrderContext) -> Result<()>;
    async fn collaborative_cancelled(&self, context: &OrderContext) -> Result<()>;
    async fn new_chat_message(&self, context: &OrderContext, message: &ChatMessage) -> Result<()>;
}
