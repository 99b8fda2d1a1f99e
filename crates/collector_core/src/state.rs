use std::fmt;

use crate::policy::TaskConfig;
use crate::registry::SampleRegistry;
use crate::view_model::{SampleRowView, TaskViewModel};

/// Controller phase. `Complete` is terminal; `Verifying` only occurs in
/// variants with a batch verify step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Collecting,
    Verifying,
    Complete,
}

/// Session-wide aggregate reported by the remote service; display only,
/// never consulted for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub points_gathered: u32,
    pub pending_verifications: u32,
}

/// Problems surfaced to the worker before (or instead of) a server
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    EmptyUrl,
    MalformedUrl(String),
    DuplicateUrl(String),
    AttemptLimitReached,
    VerifyUnreachable(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::EmptyUrl => write!(f, "enter a url first"),
            InputError::MalformedUrl(detail) => write!(f, "not a valid url ({detail})"),
            InputError::DuplicateUrl(url) => write!(f, "{url} is already on the list"),
            InputError::AttemptLimitReached => write!(f, "no more samples can be added"),
            InputError::VerifyUnreachable(detail) => {
                write!(f, "duplicate check failed ({detail}); add or retry a sample")
            }
        }
    }
}

/// One collection session: the registry plus controller bookkeeping.
/// Created once per task instance and alive until the hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    config: TaskConfig,
    registry: SampleRegistry,
    phase: Phase,
    total_score: u32,
    server_all: bool,
    handoff_fired: bool,
    input_error: Option<InputError>,
    stats: Option<SessionStats>,
}

impl TaskState {
    pub fn new(config: TaskConfig) -> Self {
        Self {
            config,
            registry: SampleRegistry::new(),
            phase: Phase::Collecting,
            total_score: 0,
            server_all: false,
            handoff_fired: false,
            input_error: None,
            stats: None,
        }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Samples currently in an accepted terminal state. Always recounted
    /// from the registry, so verify-time demotions are reflected.
    pub fn gathered_count(&self) -> u32 {
        self.registry.gathered_count()
    }

    pub fn server_all(&self) -> bool {
        self.server_all
    }

    pub fn view(&self) -> TaskViewModel {
        TaskViewModel {
            phase: self.phase,
            gathered: self.gathered_count(),
            min_required: self.config.min_required,
            total_score: self.total_score,
            add_enabled: self.phase == Phase::Collecting
                && !self.config.attempts_exhausted(self.registry.len()),
            pending_polls: self.registry.pending_count(),
            rows: self
                .registry
                .iter()
                .map(|sample| SampleRowView {
                    url: sample.url.clone(),
                    state: sample.state,
                    detail: sample.reason.as_ref().map(|reason| reason.to_string()),
                    score: sample.score,
                })
                .collect(),
            input_error: self.input_error.as_ref().map(|err| err.to_string()),
            stats: self.stats,
        }
    }

    pub(crate) fn registry_mut(&mut self) -> &mut SampleRegistry {
        &mut self.registry
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn add_score(&mut self, score: u32) {
        self.total_score += score;
    }

    pub(crate) fn note_server_all(&mut self) {
        self.server_all = true;
    }

    /// Arms the one-shot hand-off. Returns false if it already fired.
    pub(crate) fn mark_handoff(&mut self) -> bool {
        if self.handoff_fired {
            return false;
        }
        self.handoff_fired = true;
        true
    }

    pub(crate) fn set_input_error(&mut self, error: InputError) {
        self.input_error = Some(error);
    }

    pub(crate) fn clear_input_error(&mut self) {
        self.input_error = None;
    }

    pub(crate) fn set_stats(&mut self, stats: SessionStats) {
        self.stats = Some(stats);
    }
}
