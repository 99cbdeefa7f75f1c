pub mod rollup;

pub use rollup::{RewardGrant, RewardRollup, RewardRollupSummary};
