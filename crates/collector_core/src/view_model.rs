use crate::sample::SampleState;
use crate::state::{Phase, SessionStats};

/// Snapshot of everything the task page needs to render, recomputed on
/// demand from [`crate::TaskState::view`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskViewModel {
    pub phase: Phase,
    pub gathered: u32,
    pub min_required: Option<u32>,
    pub total_score: u32,
    /// Whether the add control is usable (collecting, under the attempt
    /// cap).
    pub add_enabled: bool,
    pub pending_polls: usize,
    pub rows: Vec<SampleRowView>,
    pub input_error: Option<String>,
    pub stats: Option<SessionStats>,
}

/// One sample line: rejected and duplicate samples stay listed with
/// their reason so the worker sees history, not a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRowView {
    pub url: String,
    pub state: SampleState,
    pub detail: Option<String>,
    pub score: u32,
}
