use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::PayoutConfig,
    error::{MaintenanceError, Result},
    lightning::{
        budget::fee_limit_sat,
        router::{PaymentRouter, RoutingOutcome},
    },
    storage::ports::PaymentStore,
    utils::format_sats,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TrackOutcome {
    /// Payouts are switched off; nothing was touched.
    PayoutsSuppressed,
    Routed { outcome: RoutingOutcome },
}

/// Sends a payout through the node and reports what the node observed.
pub struct SettlementTracker<'a, S: PaymentStore + ?Sized, R: PaymentRouter + ?Sized> {
    store: &'a S,
    router: &'a R,
    config: PayoutConfig,
}

impl<'a, S: PaymentStore + ?Sized, R: PaymentRouter + ?Sized> SettlementTracker<'a, S, R> {
    pub fn new(store: &'a S, router: &'a R, config: PayoutConfig) -> Self {
        Self { store, router, config }
    }

    pub async fn track(&self, payment_hash: &str, now: DateTime<Utc>) -> Result<TrackOutcome> {
        if self.config.permissioned {
            info!("Payouts are permissioned, not following {}", payment_hash);
            return Ok(TrackOutcome::PayoutsSuppressed);
        }

        let payment = self
            .store
            .lightning_payment(payment_hash)?
            .ok_or_else(|| MaintenanceError::NotFound(format!("lightning payment {}", payment_hash)))?;

        // The stamp marks the attempt even if the node never answers.
        self.store.stamp_routing_attempt(&payment.payment_hash, now)?;

        let fee_limit = fee_limit_sat(payment.num_satoshis, payment.routing_budget_ppm);
        info!(
            "Following payout {} ({}, fee limit {}, timeout {}s)",
            payment.payment_hash,
            format_sats(payment.num_satoshis),
            format_sats(fee_limit),
            self.config.timeout_seconds
        );

        let outcome = self
            .router
            .follow_send_payment(&payment, fee_limit, self.config.timeout_seconds)
            .await
            .map_err(|e| {
                warn!("Routing {} failed: {}", payment.payment_hash, e);
                match e {
                    MaintenanceError::Routing(_) => e,
                    other => MaintenanceError::Routing(other.to_string()),
                }
            })?;

        Ok(TrackOutcome::Routed { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightning::router::MockPaymentRouter;
    use crate::storage::models::{LightningPayment, PaymentStatus};
    use crate::storage::ports::MockPaymentStore;
    use mockall::predicate::*;
    use mockall::Sequence;

    fn payment() -> LightningPayment {
        LightningPayment {
            payment_hash: "f00d".to_string(),
            invoice: "lnbc1000u1".to_string(),
            num_satoshis: 100_000,
            routing_budget_ppm: 1_000,
            status: PaymentStatus::Pending,
            last_routing_time: None,
            order_made_expires_at: None,
            order_taken_expires_at: None,
        }
    }

    fn config(permissioned: bool) -> PayoutConfig {
        PayoutConfig {
            permissioned,
            timeout_seconds: 90,
        }
    }

    #[tokio::test]
    async fn test_suppressed_payouts_touch_nothing() {
        let mut store = MockPaymentStore::new();
        store.expect_lightning_payment().never();
        store.expect_stamp_routing_attempt().never();
        let mut router = MockPaymentRouter::new();
        router.expect_follow_send_payment().never();

        let tracker = SettlementTracker::new(&store, &router, config(true));
        let outcome = tracker.track("f00d", Utc::now()).await.unwrap();

        assert_eq!(outcome, TrackOutcome::PayoutsSuppressed);
    }

    #[tokio::test]
    async fn test_stamps_before_routing_with_budget() {
        let now = Utc::now();
        let mut seq = Sequence::new();
        let mut store = MockPaymentStore::new();
        let mut router = MockPaymentRouter::new();

        store
            .expect_lightning_payment()
            .with(eq("f00d"))
            .returning(|_| Ok(Some(payment())));
        store
            .expect_stamp_routing_attempt()
            .with(eq("f00d"), eq(now))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        router
            .expect_follow_send_payment()
            .withf(|p, fee, timeout| p.payment_hash == "f00d" && *fee == 100 && *timeout == 90)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Ok(RoutingOutcome::Succeeded {
                    fee_paid_sat: 12,
                    preimage: "beef".to_string(),
                })
            });

        let tracker = SettlementTracker::new(&store, &router, config(false));
        let outcome = tracker.track("f00d", now).await.unwrap();

        assert_eq!(
            outcome,
            TrackOutcome::Routed {
                outcome: RoutingOutcome::Succeeded {
                    fee_paid_sat: 12,
                    preimage: "beef".to_string()
                }
            }
        );
    }

    #[tokio::test]
    async fn test_failed_outcome_is_surfaced_unmodified() {
        let mut store = MockPaymentStore::new();
        store.expect_lightning_payment().returning(|_| Ok(Some(payment())));
        store.expect_stamp_routing_attempt().returning(|_, _| Ok(()));
        let mut router = MockPaymentRouter::new();
        router.expect_follow_send_payment().returning(|_, _, _| {
            Ok(RoutingOutcome::Failed {
                reason: "FAILURE_REASON_NO_ROUTE".to_string(),
            })
        });

        let tracker = SettlementTracker::new(&store, &router, config(false));
        let outcome = tracker.track("f00d", Utc::now()).await.unwrap();

        assert_eq!(
            outcome,
            TrackOutcome::Routed {
                outcome: RoutingOutcome::Failed {
                    reason: "FAILURE_REASON_NO_ROUTE".to_string()
                }
            }
        );
    }

    #[tokio::test]
    async fn test_router_error_propagates_after_stamp() {
        let mut store = MockPaymentStore::new();
        store.expect_lightning_payment().returning(|_| Ok(Some(payment())));
        store.expect_stamp_routing_attempt().times(1).returning(|_, _| Ok(()));
        let mut router = MockPaymentRouter::new();
        router
            .expect_follow_send_payment()
            .returning(|_, _, _| Err(MaintenanceError::Routing("node unreachable".to_string())));

        let tracker = SettlementTracker::new(&store, &router, config(false));
        let result = tracker.track("f00d", Utc::now()).await;

        assert!(matches!(result, Err(MaintenanceError::Routing(_))));
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let mut store = MockPaymentStore::new();
        store.expect_lightning_payment().returning(|_| Ok(None));
        store.expect_stamp_routing_attempt().never();
        let mut router = MockPaymentRouter::new();
        router.expect_follow_send_payment().never();

        let tracker = SettlementTracker::new(&store, &router, config(false));
        let result = tracker.track("f00d", Utc::now()).await;

        assert!(matches!(result, Err(MaintenanceError::NotFound(_))));
    }
}
