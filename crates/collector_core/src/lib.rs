//! Collector core: pure sample-collection state machine and view-model helpers.
mod effect;
mod msg;
mod policy;
mod registry;
mod sample;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use policy::{ScoringPolicy, TaskConfig};
pub use registry::{RegistryError, SampleRegistry};
pub use sample::{
    normalize_url, Outcome, RejectReason, Sample, SampleId, SampleState, Ticket, UrlError, Verdict,
};
pub use state::{InputError, Phase, SessionStats, TaskState};
pub use update::update;
pub use view_model::{SampleRowView, TaskViewModel};
