use crate::sample::{SampleId, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Post one add request for the sample. Never retried automatically.
    Submit {
        id: SampleId,
        url: String,
        label: Option<String>,
    },
    /// Start status polling for a deferred sample.
    Poll { id: SampleId, ticket: Ticket },
    /// Run the batch duplicate check over the accepted set.
    Verify { urls: Vec<String> },
    /// Abort every outstanding status poll.
    CancelPolls,
    /// Hand the accepted set to the enclosing HIT page.
    HandOff { urls: Vec<String> },
}
