pub mod batch;
pub mod eligibility;
pub mod payments;
pub mod users;

pub use batch::{BatchReconciler, BatchSummary, RecordOutcome};
pub use eligibility::{Eligibility, EligibilityEvaluator, IneligibleReason};
pub use payments::{PaymentsCleansing, PaymentsCleansingSummary};
pub use users::UsersCleansing;
