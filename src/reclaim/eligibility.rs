use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{MaintenanceError, Result},
    storage::{models::{Account, IncentiveProfile}, ports::EngagementOracle},
};

/// Accounts seen within this many hours are never reclaimed.
pub const ACTIVITY_WINDOW_HOURS: i64 = 6;

/// First rule that kept an account alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IneligibleReason {
    Privileged,
    RecentlyActive,
    HoldsRewards,
    NotificationsEnabled,
    HasContracts,
    ActiveEngagement,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IneligibleReason::Privileged => "account is privileged (protected)",
            IneligibleReason::RecentlyActive => "account logged in recently",
            IneligibleReason::HoldsRewards => "account holds pending, earned or claimed rewards",
            IneligibleReason::NotificationsEnabled => "account has notifications enabled",
            IneligibleReason::HasContracts => "account has completed contracts",
            IneligibleReason::ActiveEngagement => "account is maker or taker of an open order",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Reclaimable,
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_reclaimable(&self) -> bool {
        matches!(self, Eligibility::Reclaimable)
    }
}

/// Decides whether an account carries no residual value or obligation.
pub struct EligibilityEvaluator<'a, O: EngagementOracle + ?Sized> {
    oracle: &'a O,
    activity_window: Duration,
}

impl<'a, O: EngagementOracle + ?Sized> EligibilityEvaluator<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            activity_window: Duration::hours(ACTIVITY_WINDOW_HOURS),
        }
    }

    /// Logins before this instant count as inactive.
    pub fn inactive_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.activity_window
    }

    /// Check if an account can be deleted
    ///
    /// An account is reclaimable if all of these hold:
    /// 1. It is not privileged
    /// 2. It has not logged in within the activity window ending at `now`
    /// 3. It holds no rewards and has notifications disabled
    /// 4. It never completed a contract
    /// 5. It is not maker or taker of an open order
    ///
    /// A missing profile is an error, never a signal of emptiness.
    pub fn assess(
        &self,
        account: &Account,
        profile: Option<&IncentiveProfile>,
        now: DateTime<Utc>,
    ) -> Result<Eligibility> {
        if account.is_privileged {
            return Ok(Eligibility::Ineligible(IneligibleReason::Privileged));
        }

        if let Some(last_login) = account.last_login {
            if last_login >= self.inactive_since(now) {
                return Ok(Eligibility::Ineligible(IneligibleReason::RecentlyActive));
            }
        }

        let profile = profile.ok_or(MaintenanceError::MissingProfile(account.id))?;

        if profile.has_rewards() {
            return Ok(Eligibility::Ineligible(IneligibleReason::HoldsRewards));
        }
        if profile.telegram_enabled {
            return Ok(Eligibility::Ineligible(IneligibleReason::NotificationsEnabled));
        }
        if profile.total_contracts > 0 {
            return Ok(Eligibility::Ineligible(IneligibleReason::HasContracts));
        }

        if self.oracle.has_active_engagement(account.id)? {
            return Ok(Eligibility::Ineligible(IneligibleReason::ActiveEngagement));
        }

        debug!("Account {} is reclaimable", account.username);
        Ok(Eligibility::Reclaimable)
    }

    pub fn is_reclaimable(
        &self,
        account: &Account,
        profile: Option<&IncentiveProfile>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.assess(account, profile, now)?.is_reclaimable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ports::MockEngagementOracle;

    fn idle_account(now: DateTime<Utc>) -> Account {
        Account {
            id: 7,
            username: "idle".to_string(),
            is_privileged: false,
            last_login: Some(now - Duration::hours(12)),
        }
    }

    fn empty_profile() -> IncentiveProfile {
        IncentiveProfile {
            account_id: 7,
            ..Default::default()
        }
    }

    fn oracle(engaged: bool) -> MockEngagementOracle {
        let mut oracle = MockEngagementOracle::new();
        oracle.expect_has_active_engagement().returning(move |_| Ok(engaged));
        oracle
    }

    #[test]
    fn test_empty_idle_account_is_reclaimable() {
        let now = Utc::now();
        let oracle = oracle(false);
        let evaluator = EligibilityEvaluator::new(&oracle);

        assert!(evaluator
            .is_reclaimable(&idle_account(now), Some(&empty_profile()), now)
            .unwrap());
    }

    #[test]
    fn test_privileged_never_reclaimable() {
        let now = Utc::now();
        let mut oracle = MockEngagementOracle::new();
        oracle.expect_has_active_engagement().never();
        let evaluator = EligibilityEvaluator::new(&oracle);

        let mut account = idle_account(now);
        account.is_privileged = true;

        assert_eq!(
            evaluator.assess(&account, Some(&empty_profile()), now).unwrap(),
            Eligibility::Ineligible(IneligibleReason::Privileged)
        );
        assert!(!evaluator.is_reclaimable(&account, None, now).unwrap());
    }

    #[test]
    fn test_recent_login_never_reclaimable() {
        let now = Utc::now();
        let oracle = oracle(false);
        let evaluator = EligibilityEvaluator::new(&oracle);

        for minutes in [0, 1, 90, 359, 360] {
            let mut account = idle_account(now);
            account.last_login = Some(now - Duration::minutes(minutes));
            assert!(
                !evaluator.is_reclaimable(&account, Some(&empty_profile()), now).unwrap(),
                "login {} minutes ago should keep the account",
                minutes
            );
        }

        let mut account = idle_account(now);
        account.last_login = Some(now - Duration::minutes(361));
        assert!(evaluator.is_reclaimable(&account, Some(&empty_profile()), now).unwrap());
    }

    #[test]
    fn test_never_logged_in_counts_as_inactive() {
        let now = Utc::now();
        let oracle = oracle(false);
        let evaluator = EligibilityEvaluator::new(&oracle);
        let mut account = idle_account(now);
        account.last_login = None;

        assert!(evaluator.is_reclaimable(&account, Some(&empty_profile()), now).unwrap());
    }

    #[test]
    fn test_profile_value_blocks_reclaim() {
        let now = Utc::now();
        let oracle = oracle(false);
        let evaluator = EligibilityEvaluator::new(&oracle);
        let account = idle_account(now);

        let cases = [
            (IncentiveProfile { pending_rewards: 1, ..empty_profile() }, IneligibleReason::HoldsRewards),
            (IncentiveProfile { earned_rewards: 1, ..empty_profile() }, IneligibleReason::HoldsRewards),
            (IncentiveProfile { claimed_rewards: 1, ..empty_profile() }, IneligibleReason::HoldsRewards),
            (IncentiveProfile { telegram_enabled: true, ..empty_profile() }, IneligibleReason::NotificationsEnabled),
            (IncentiveProfile { total_contracts: 3, ..empty_profile() }, IneligibleReason::HasContracts),
        ];

        for (profile, reason) in cases {
            assert_eq!(
                evaluator.assess(&account, Some(&profile), now).unwrap(),
                Eligibility::Ineligible(reason)
            );
        }
    }

    #[test]
    fn test_active_engagement_blocks_reclaim() {
        let now = Utc::now();
        let oracle = oracle(true);
        let evaluator = EligibilityEvaluator::new(&oracle);

        assert_eq!(
            evaluator.assess(&idle_account(now), Some(&empty_profile()), now).unwrap(),
            Eligibility::Ineligible(IneligibleReason::ActiveEngagement)
        );
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        let now = Utc::now();
        let oracle = oracle(false);
        let evaluator = EligibilityEvaluator::new(&oracle);

        let result = evaluator.is_reclaimable(&idle_account(now), None, now);
        assert!(matches!(result, Err(MaintenanceError::MissingProfile(7))));
    }
}
