use crate::sample::{Outcome, SampleId};
use crate::state::SessionStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Worker entered a candidate URL (plus the expected label in
    /// label-matching variants).
    AddSample { url: String, label: Option<String> },
    /// Gateway finished the add request for a sample.
    SubmitFinished { id: SampleId, outcome: Outcome },
    /// Polling monitor resolved (or timed out) a deferred sample.
    PollFinished { id: SampleId, outcome: Outcome },
    /// Batch verify reported the duplicate subset; empty means all clean.
    VerifyFinished { duplicate_urls: Vec<String> },
    /// Batch verify could not reach the service.
    VerifyFailed { reason: String },
    /// Slow-cadence aggregate refresh, display only.
    StatsUpdated(SessionStats),
    /// Fallback for placeholder wiring.
    NoOp,
}
