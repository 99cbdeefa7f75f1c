use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    error::Result,
    reclaim::batch::{BatchReconciler, BatchSummary},
    storage::ports::PaymentStore,
};

/// Cancelled payments are kept this many days after their order expired.
/// Orders usually expire a day after finishing, so a payment that never
/// locked is gone roughly four days later.
pub const RETENTION_DAYS: i64 = 3;

pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RETENTION_DAYS)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentsCleansingSummary {
    pub lightning: BatchSummary,
    pub onchain: BatchSummary,
}

/// Deletes cancelled Lightning payments and unsent on-chain payments whose
/// orders are long gone.
pub struct PaymentsCleansing<'a, S: PaymentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PaymentStore + ?Sized> PaymentsCleansing<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn run(&self, now: DateTime<Utc>) -> Result<PaymentsCleansingSummary> {
        let cutoff = retention_cutoff(now);

        let lightning = BatchReconciler::new("payments_cleansing.lightning").reconcile(
            self.store.stale_lightning_payments(cutoff)?,
            |payment| payment.to_string(),
            |_| Ok(true),
            |payment| self.store.delete_lightning_payment(&payment.payment_hash),
        );

        let onchain = BatchReconciler::new("payments_cleansing.onchain").reconcile(
            self.store.stale_onchain_payments(cutoff)?,
            |payment| payment.to_string(),
            |_| Ok(true),
            |payment| self.store.delete_onchain_payment(payment.id),
        );

        Ok(PaymentsCleansingSummary { lightning, onchain })
    }
}
