pub mod budget;
pub mod lnd;
pub mod router;
pub mod tracker;

pub use budget::fee_limit_sat;
pub use lnd::LndRouter;
pub use router::{PaymentRouter, RoutingOutcome};
pub use tracker::{SettlementTracker, TrackOutcome};
