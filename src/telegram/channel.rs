use async_trait::async_trait;
use futures::future::join_all;
use teloxide::requests::Requester;
use teloxide::types::ChatId;
use teloxide::Bot;
use tracing::{error, info};

use crate::{
    config::TelegramConfig,
    error::Result,
    notifications::{DeliveryChannel, NotificationKind},
    storage::models::{ChatMessage, OrderContext},
    telegram::formatters::render,
};

/// Delivers notifications to each opted-in trade participant over Telegram.
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(config.bot_token.clone()),
        }
    }

    async fn notify(
        &self,
        kind: NotificationKind,
        context: &OrderContext,
        message: Option<&ChatMessage>,
    ) -> Result<()> {
        let sends = context
            .subscribers()
            .filter_map(|participant| participant.telegram_chat_id.map(|chat_id| (participant, chat_id)))
            .map(|(participant, chat_id)| {
                let text = render(kind, participant, context.order.id, message);
                async move {
                    let result = self.bot.send_message(ChatId(chat_id), text).await;
                    (chat_id, result)
                }
            });

        let mut first_error = None;
        for (chat_id, result) in join_all(sends).await {
            match result {
                Ok(_) => info!("{} sent to chat {}", kind, chat_id),
                Err(e) => {
                    error!("Failed to send {} to chat {}: {}", kind, chat_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn welcome(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::Welcome, context, None).await
    }

    async fn order_expired_untaken(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::OrderExpiredUntaken, context, None).await
    }

    async fn trade_successful(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::TradeSuccessful, context, None).await
    }

    async fn public_order_cancelled(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::PublicOrderCancelled, context, None).await
    }

    async fn taker_expired_before_bond(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::TakerExpiredBeforeBond, context, None).await
    }

    async fn order_published(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::OrderPublished, context, None).await
    }

    async fn order_taken_confirmed(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::OrderTakenConfirmed, context, None).await
    }

    async fn fiat_exchange_starts(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::FiatExchangeStarts, context, None).await
    }

    async fn dispute_opened(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::DisputeOpened, context, None).await
    }

    async fn collaborative_cancelled(&self, context: &OrderContext) -> Result<()> {
        self.notify(NotificationKind::CollaborativeCancelled, context, None).await
    }

    async fn new_chat_message(&self, context: &OrderContext, message: &ChatMessage) -> Result<()> {
        self.notify(NotificationKind::NewChatMessage, context, Some(message)).await
    }
}
