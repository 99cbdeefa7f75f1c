use crate::{
    notifications::NotificationKind,
    storage::models::{ChatMessage, Participant},
};

/// Plain-text body for a notification addressed to `recipient`.
pub fn render(
    kind: NotificationKind,
    recipient: &Participant,
    order_id: i64,
    message: Option<&ChatMessage>,
) -> String {
    let name = &recipient.username;
    match kind {
        NotificationKind::Welcome => format!(
            "🔔 Hey {}, notifications are enabled. You will hear from me when order {} changes.",
            name, order_id
        ),
        NotificationKind::OrderExpiredUntaken => format!(
            "⌛ Hey {}, order {} expired without being taken.",
            name, order_id
        ),
        NotificationKind::TradeSuccessful => format!(
            "🥳 Hey {}, order {} finished successfully. Thanks for trading!",
            name, order_id
        ),
        NotificationKind::PublicOrderCancelled => format!(
            "❌ Hey {}, public order {} was cancelled.",
            name, order_id
        ),
        NotificationKind::TakerExpiredBeforeBond => format!(
            "⏳ Hey {}, the taker of order {} did not lock the bond in time. The order is public again.",
            name, order_id
        ),
        NotificationKind::OrderPublished => format!(
            "📢 Hey {}, order {} is now public in the order book.",
            name, order_id
        ),
        NotificationKind::OrderTakenConfirmed => format!(
            "✅ Hey {}, order {} was taken and the taker bond is locked.",
            name, order_id
        ),
        NotificationKind::FiatExchangeStarts => format!(
            "💸 Hey {}, the escrow of order {} is locked. The fiat exchange can start now.",
            name, order_id
        ),
        NotificationKind::DisputeOpened => format!(
            "⚖️ Hey {}, a dispute was opened on order {}. Please submit your statement.",
            name, order_id
        ),
        NotificationKind::CollaborativeCancelled => format!(
            "🤝 Hey {}, order {} was cancelled collaboratively.",
            name, order_id
        ),
        NotificationKind::NewChatMessage => match message {
            Some(message) => format!(
                "💬 Hey {}, new message from {} on order {}.",
                name, message.sender, order_id
            ),
            None => format!("💬 Hey {}, new chat message on order {}.", name, order_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> Participant {
        Participant {
            account_id: 1,
            username: "SwiftTurtle".to_string(),
            telegram_enabled: true,
            telegram_chat_id: Some(9),
        }
    }

    #[test]
    fn test_every_kind_names_recipient_and_order() {
        for kind in NotificationKind::ALL {
            let text = render(kind, &recipient(), 42, None);
            assert!(text.contains("SwiftTurtle"), "{}", kind);
            assert!(text.contains("42"), "{}", kind);
        }
    }

    #[test]
    fn test_chat_message_names_sender() {
        let message = ChatMessage {
            id: 3,
            order_id: 42,
            sender: "CalmOtter".to_string(),
            text: "hello".to_string(),
        };
        let text = render(NotificationKind::NewChatMessage, &recipient(), 42, Some(&message));
        assert!(text.contains("CalmOtter"));
        assert!(!text.contains("hello"));
    }
}
