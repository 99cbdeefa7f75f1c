use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::Result,
    reclaim::{
        batch::{BatchReconciler, BatchSummary},
        eligibility::EligibilityEvaluator,
    },
    storage::ports::{AccountStore, EngagementOracle},
};

/// Deletes accounts that were never really used.
pub struct UsersCleansing<'a, S: AccountStore + EngagementOracle + ?Sized> {
    store: &'a S,
}

impl<'a, S: AccountStore + EngagementOracle + ?Sized> UsersCleansing<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn run(&self, now: DateTime<Utc>) -> Result<BatchSummary> {
        let evaluator = EligibilityEvaluator::new(self.store);
        let candidates = self.store.inactive_accounts(evaluator.inactive_since(now))?;
        info!("Found {} inactive accounts", candidates.len());

        let summary = BatchReconciler::new("users_cleansing").reconcile(
            candidates,
            |account| account.username.clone(),
            |account| {
                let profile = self.store.profile(account.id)?;
                evaluator.is_reclaimable(account, profile.as_ref(), now)
            },
            |account| self.store.delete_account(account.id),
        );

        Ok(summary)
    }
}
