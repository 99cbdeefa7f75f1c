use tracing::{debug, error, info};

use crate::{
    error::{MaintenanceError, Result},
    notifications::{channel::DeliveryChannel, kinds::NotificationKind},
    storage::{
        models::{ChatMessage, OrderContext},
        ports::OrderStore,
    },
};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSubject {
    Order(i64),
    ChatMessage(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub subject: NotificationSubject,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind, subject: NotificationSubject) -> Self {
        Self { kind, subject }
    }
}

pub struct NotificationDispatcher<'a, S: OrderStore + ?Sized, C: DeliveryChannel + ?Sized> {
    store: &'a S,
    channel: &'a C,
}

impl<'a, S: OrderStore + ?Sized, C: DeliveryChannel + ?Sized> NotificationDispatcher<'a, S, C> {
    pub fn new(store: &'a S, channel: &'a C) -> Self {
        Self { store, channel }
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<()> {
        let (context, message) = self.resolve(event.subject)?;

        if event.kind == NotificationKind::NewChatMessage && message.is_none() {
            error!("{} requires a chat message subject, got {:?}", event.kind, event.subject);
            return Err(MaintenanceError::InvalidSubject(format!(
                "{} needs a chat message",
                event.kind
            )));
        }

        let taker_enabled = context.taker.as_ref().map_or(false, |t| t.telegram_enabled);
        if !(context.maker.telegram_enabled || taker_enabled) {
            debug!("No participant of order {} wants {}", context.order.id, event.kind);
            return Ok(());
        }

        info!("Sending {} for order {}", event.kind, context.order.id);
        let channel = self.channel;
        match event.kind {
            NotificationKind::Welcome => channel.welcome(&context).await,
            NotificationKind::OrderExpiredUntaken => channel.order_expired_untaken(&context).await,
            NotificationKind::TradeSuccessful => channel.trade_successful(&context).await,
            NotificationKind::PublicOrderCancelled => channel.public_order_cancelled(&context).await,
            NotificationKind::TakerExpiredBeforeBond => channel.taker_expired_before_bond(&context).await,
            NotificationKind::OrderPublished => channel.order_published(&context).await,
            NotificationKind::OrderTakenConfirmed => channel.order_taken_confirmed(&context).await,
            NotificationKind::FiatExchangeStarts => channel.fiat_exchange_starts(&context).await,
            NotificationKind::DisputeOpened => channel.dispute_opened(&context).await,
            NotificationKind::CollaborativeCancelled => channel.collaborative_cancelled(&context).await,
            NotificationKind::NewChatMessage => {
                let message = message
                    .as_ref()
                    .ok_or_else(|| MaintenanceError::InvalidSubject(event.kind.to_string()))?;
                channel.new_chat_message(&context, message).await
            }
        }
    }

    fn resolve(&self, subject: NotificationSubject) -> Result<(OrderContext, Option<ChatMessage>)> {
        match subject {
            NotificationSubject::Order(order_id) => Ok((self.order_context(order_id)?, None)),
            NotificationSubject::ChatMessage(message_id) => {
                let message = self
                    .store
                    .chat_message(message_id)?
                    .ok_or_else(|| MaintenanceError::NotFound(format!("chat message {}", message_id)))?;
                let context = self.order_context(message.order_id)?;
                Ok((context, Some(message)))
            }
        }
    }

    fn order_context(&self, order_id: i64) -> Result<OrderContext> {
        self.store
            .order_context(order_id)?
            .ok_or_else(|| MaintenanceError::NotFound(format!("order {}", order_id)))
    }
}
