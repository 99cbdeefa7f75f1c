use serde::Serialize;

use crate::error::MaintenanceError;

/// Every event the platform can notify about. Each maps to exactly one
/// delivery template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Welcome,
    OrderExpiredUntaken,
    TradeSuccessful,
    PublicOrderCancelled,
    TakerExpiredBeforeBond,
    OrderPublished,
    OrderTakenConfirmed,
    FiatExchangeStarts,
    DisputeOpened,
    CollaborativeCancelled,
    NewChatMessage,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 11] = [
        NotificationKind::Welcome,
        NotificationKind::OrderExpiredUntaken,
        NotificationKind::TradeSuccessful,
        NotificationKind::PublicOrderCancelled,
        NotificationKind::TakerExpiredBeforeBond,
        NotificationKind::OrderPublished,
        NotificationKind::OrderTakenConfirmed,
        NotificationKind::FiatExchangeStarts,
        NotificationKind::DisputeOpened,
        NotificationKind::CollaborativeCancelled,
        NotificationKind::NewChatMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Welcome => "welcome",
            NotificationKind::OrderExpiredUntaken => "order_expired_untaken",
            NotificationKind::TradeSuccessful => "trade_successful",
            NotificationKind::PublicOrderCancelled => "public_order_cancelled",
            NotificationKind::TakerExpiredBeforeBond => "taker_expired_b4bond",
            NotificationKind::OrderPublished => "order_published",
            NotificationKind::OrderTakenConfirmed => "order_taken_confirmed",
            NotificationKind::FiatExchangeStarts => "fiat_exchange_starts",
            NotificationKind::DisputeOpened => "dispute_opened",
            NotificationKind::CollaborativeCancelled => "collaborative_cancelled",
            NotificationKind::NewChatMessage => "new_chat_message",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = MaintenanceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MaintenanceError::UnknownNotification(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_parses_from_its_name() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(matches!(
            "order_teleported".parse::<NotificationKind>(),
            Err(MaintenanceError::UnknownNotification(_))
        ));
    }
}
