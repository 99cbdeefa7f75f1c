use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;

/// What happened to a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Deleted(String),
    Ineligible,
    /// Evaluation or deletion failed; carries the reason code.
    Skipped(&'static str),
}

/// Fail-soft reconciler: every candidate is evaluated and deleted inside its
/// own failure boundary so one bad record never aborts the batch.
pub struct BatchReconciler {
    name: &'static str,
}

impl BatchReconciler {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Process a snapshot of candidates sequentially.
    pub fn reconcile<R, L, E, D>(
        &self,
        candidates: Vec<R>,
        label: L,
        mut evaluate: E,
        mut delete: D,
    ) -> BatchSummary
    where
        L: Fn(&R) -> String,
        E: FnMut(&R) -> Result<bool>,
        D: FnMut(&R) -> Result<()>,
    {
        info!("{}: reconciling {} candidates", self.name, candidates.len());

        let mut summary = BatchSummary::default();
        for record in &candidates {
            let outcome = self.isolate(record, &label, &mut evaluate, &mut delete);
            summary.record(outcome);
        }

        info!(
            "{}: {} deleted, {} skipped",
            self.name,
            summary.num_deleted,
            summary.skipped_total()
        );
        summary
    }

    fn isolate<R, L, E, D>(&self, record: &R, label: &L, evaluate: &mut E, delete: &mut D) -> RecordOutcome
    where
        L: Fn(&R) -> String,
        E: FnMut(&R) -> Result<bool>,
        D: FnMut(&R) -> Result<()>,
    {
        let name = label(record);

        match evaluate(record) {
            Ok(true) => {}
            Ok(false) => {
                debug!("{}: keeping {}", self.name, name);
                return RecordOutcome::Ineligible;
            }
            Err(e) => {
                warn!("{}: skipping {} during evaluation ({}): {}", self.name, name, e.reason_code(), e);
                return RecordOutcome::Skipped(e.reason_code());
            }
        }

        match delete(record) {
            Ok(()) => {
                debug!("{}: deleted {}", self.name, name);
                RecordOutcome::Deleted(name)
            }
            Err(e) => {
                warn!("{}: skipping {} during deletion ({}): {}", self.name, name, e.reason_code(), e);
                RecordOutcome::Skipped(e.reason_code())
            }
        }
    }
}

/// Result of a reconciliation pass. Only successful deletions are listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub num_deleted: usize,
    pub deleted: Vec<String>,
    /// Skipped records counted by reason code.
    pub skipped: BTreeMap<&'static str, usize>,
}

impl BatchSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Deleted(name) => {
                self.num_deleted += 1;
                self.deleted.push(name);
            }
            RecordOutcome::Ineligible => {}
            RecordOutcome::Skipped(reason) => {
                *self.skipped.entry(reason).or_insert(0) += 1;
            }
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}
