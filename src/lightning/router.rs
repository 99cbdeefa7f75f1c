use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::{error::Result, storage::models::LightningPayment};

/// Latest state of a payout as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutingOutcome {
    Succeeded { fee_paid_sat: u64, preimage: String },
    InFlight,
    Failed { reason: String },
}

/// The node that finds routes and retries payments on our behalf.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentRouter: Send + Sync {
    /// Pays `payment` spending at most `fee_limit_sat` in routing fees and
    /// follows it for up to `timeout_seconds`.
    async fn follow_send_payment(
        &self,
        payment: &LightningPayment,
        fee_limit_sat: u64,
        timeout_seconds: u64,
    ) -> Result<RoutingOutcome>;
}
