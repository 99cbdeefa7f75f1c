use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::{error::Result, storage::ports::RewardStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardGrant {
    pub given_reward: u64,
    pub earned_rewards: u64,
}

/// Grants keyed by username.
pub type RewardRollupSummary = BTreeMap<String, RewardGrant>;

/// Promotes pending referral rewards to earned.
///
/// Runs detached from the trades that created the rewards so the referral
/// program cannot be used to link a reward to the trade that caused it.
/// Promoted profiles drop out of the candidate set, so a rerun after a crash
/// only finishes what is left.
pub struct RewardRollup<'a, S: RewardStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RewardStore + ?Sized> RewardRollup<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn run(&self) -> Result<RewardRollupSummary> {
        let candidates = self.store.pending_rewards()?;
        info!("Promoting pending rewards for {} profiles", candidates.len());

        let mut summary = RewardRollupSummary::new();
        for candidate in candidates {
            let given_reward = candidate.profile.pending_rewards;
            if given_reward == 0 {
                continue;
            }

            let Some(earned_rewards) = self
                .store
                .promote_pending(candidate.profile.account_id, given_reward)?
            else {
                debug!(
                    "{}: pending balance already promoted, skipping",
                    candidate.username
                );
                continue;
            };
            debug!(
                "{}: {} sats promoted, {} earned",
                candidate.username, given_reward, earned_rewards
            );

            summary.insert(
                candidate.username,
                RewardGrant {
                    given_reward,
                    earned_rewards,
                },
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaintenanceError;
    use crate::storage::models::{IncentiveProfile, RewardCandidate};
    use crate::storage::ports::MockRewardStore;
    use mockall::predicate::*;

    fn candidate(id: i64, pending: u64, earned: u64) -> RewardCandidate {
        RewardCandidate {
            username: format!("robot{}", id),
            profile: IncentiveProfile {
                account_id: id,
                pending_rewards: pending,
                earned_rewards: earned,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_rollup_promotes_each_profile() {
        let mut store = MockRewardStore::new();
        store
            .expect_pending_rewards()
            .times(1)
            .returning(|| Ok(vec![candidate(1, 300, 0), candidate(2, 50, 1_000)]));
        store
            .expect_promote_pending()
            .with(eq(1), eq(300))
            .times(1)
            .returning(|_, _| Ok(Some(300)));
        store
            .expect_promote_pending()
            .with(eq(2), eq(50))
            .times(1)
            .returning(|_, _| Ok(Some(1_050)));

        let summary = RewardRollup::new(&store).run().unwrap();

        assert_eq!(
            summary.get("robot2"),
            Some(&RewardGrant {
                given_reward: 50,
                earned_rewards: 1_050
            })
        );
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut store = MockRewardStore::new();
        store
            .expect_pending_rewards()
            .returning(|| Ok(vec![candidate(1, 10, 0)]));
        store
            .expect_promote_pending()
            .returning(|_, _| {
                Err(MaintenanceError::Database(rusqlite::Error::InvalidQuery))
            });

        assert!(RewardRollup::new(&store).run().is_err());
    }

    #[test]
    fn test_rollup_is_idempotent_against_database() {
        use crate::storage::{Account, AccountStore, Database};

        let db = Database::in_memory().unwrap();
        for (id, pending, earned, claimed) in [(1, 400, 100, 7), (2, 0, 30, 0)] {
            db.save_account(&Account {
                id,
                username: format!("robot{}", id),
                is_privileged: false,
                last_login: None,
            })
            .unwrap();
            db.save_profile(&IncentiveProfile {
                account_id: id,
                pending_rewards: pending,
                earned_rewards: earned,
                claimed_rewards: claimed,
                ..Default::default()
            })
            .unwrap();
        }

        let first = RewardRollup::new(&db).run().unwrap();
        let after_first = db.profile(1).unwrap().unwrap();

        let second = RewardRollup::new(&db).run().unwrap();
        let after_second = db.profile(1).unwrap().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(after_first.earned_rewards, 500);
        assert_eq!(after_first.claimed_rewards, 7);
        assert!(second.is_empty());
        assert_eq!(after_second, after_first);
        assert_eq!(db.profile(2).unwrap().unwrap().earned_rewards, 30);
    }

    #[test]
    fn test_stale_snapshot_skips_promoted_profile() {
        use crate::storage::{Account, Database};

        let db = Database::in_memory().unwrap();
        for id in [1, 2] {
            db.save_account(&Account {
                id,
                username: format!("robot{}", id),
                is_privileged: false,
                last_login: None,
            })
            .unwrap();
            db.save_profile(&IncentiveProfile {
                account_id: id,
                pending_rewards: 100,
                ..Default::default()
            })
            .unwrap();
        }

        // An overlapping run promotes robot1 after this run took its snapshot.
        let snapshot = db.pending_rewards().unwrap();
        db.promote_pending(1, 100).unwrap();

        let mut store = MockRewardStore::new();
        store.expect_pending_rewards().return_once(move || Ok(snapshot));
        store
            .expect_promote_pending()
            .times(2)
            .returning(move |id, amount| db.promote_pending(id, amount));

        let summary = RewardRollup::new(&store).run().unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(
            summary.get("robot2"),
            Some(&RewardGrant {
                given_reward: 100,
                earned_rewards: 100
            })
        );
    }
}
