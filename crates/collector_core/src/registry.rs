use std::collections::HashMap;
use std::fmt;

use crate::sample::{RejectReason, Sample, SampleId, SampleState, Ticket, Verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The id is already tracked with a non-rejected state; no request
    /// may be issued for it.
    DuplicateLocal(SampleId),
    UnknownSample(SampleId),
    AlreadyResolved(SampleId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateLocal(id) => write!(f, "duplicate sample {id}"),
            RegistryError::UnknownSample(id) => write!(f, "unknown sample {id}"),
            RegistryError::AlreadyResolved(id) => write!(f, "sample {id} already resolved"),
        }
    }
}

/// Insertion-ordered collection of submitted samples, indexed by
/// normalized-URL identity. Exactly one sample per distinct id is ever
/// tracked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleRegistry {
    samples: Vec<Sample>,
    index: HashMap<SampleId, usize>,
}

impl SampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a new `Pending` sample.
    ///
    /// A collision with a non-rejected sample fails with
    /// `DuplicateLocal`. A collision with a `Rejected` sample is a
    /// worker retry: the existing entry is reset to `Pending` in place,
    /// keeping its original display position.
    pub fn add(
        &mut self,
        id: SampleId,
        url: String,
        expected_label: Option<String>,
    ) -> Result<(), RegistryError> {
        if let Some(&pos) = self.index.get(&id) {
            let sample = &mut self.samples[pos];
            if sample.state != SampleState::Rejected {
                return Err(RegistryError::DuplicateLocal(id));
            }
            sample.state = SampleState::Pending;
            sample.reason = None;
            sample.score = 0;
            sample.ticket = None;
            sample.expected_label = expected_label;
            return Ok(());
        }
        let pos = self.samples.len();
        self.samples.push(Sample {
            id: id.clone(),
            url,
            expected_label,
            state: SampleState::Pending,
            reason: None,
            score: 0,
            ticket: None,
        });
        self.index.insert(id, pos);
        Ok(())
    }

    /// Records the poll ticket for a sample awaiting its verdict.
    pub fn attach_ticket(&mut self, id: &SampleId, ticket: Ticket) -> Result<(), RegistryError> {
        let sample = self.pending_mut(id)?;
        sample.ticket = Some(ticket);
        Ok(())
    }

    /// Moves a `Pending` sample to the terminal state named by the
    /// verdict. A `Deferred` verdict only records the ticket and leaves
    /// the sample pending.
    ///
    /// A second resolution for the same id fails with `AlreadyResolved`
    /// rather than being swallowed; duplicate resolution indicates a
    /// monitor bug and the caller decides how loudly to report it.
    pub fn resolve(&mut self, id: &SampleId, verdict: &Verdict) -> Result<(), RegistryError> {
        if let Verdict::Deferred(ticket) = verdict {
            return self.attach_ticket(id, ticket.clone());
        }
        let sample = self.pending_mut(id)?;
        match verdict {
            Verdict::Accepted { score } => {
                sample.state = SampleState::Accepted;
                sample.score = *score;
            }
            Verdict::Matched { score } => {
                sample.state = SampleState::Matched;
                sample.score = *score;
            }
            Verdict::Mismatched => {
                sample.state = SampleState::Mismatched;
            }
            Verdict::Rejected(reason) => {
                sample.state = SampleState::Rejected;
                sample.reason = Some(reason.clone());
            }
            Verdict::Deferred(_) => unreachable!("handled above"),
        }
        sample.ticket = None;
        Ok(())
    }

    /// Demotes the listed samples to `Duplicate`.
    ///
    /// This is the one sanctioned backward transition: the verify
    /// endpoint makes the authoritative dedup decision at batch-submit
    /// time and may overrule an earlier accept. Returns how many
    /// samples actually changed state.
    pub fn mark_duplicates(&mut self, ids: &[SampleId]) -> usize {
        let mut demoted = 0;
        for id in ids {
            if let Some(&pos) = self.index.get(id) {
                let sample = &mut self.samples[pos];
                if sample.state != SampleState::Duplicate {
                    sample.state = SampleState::Duplicate;
                    sample.reason = Some(RejectReason::Duplicate);
                    sample.ticket = None;
                    demoted += 1;
                }
            }
        }
        demoted
    }

    /// URLs of every accepted or matched sample, in insertion order;
    /// this is the finishing payload.
    pub fn accepted_urls(&self) -> Vec<String> {
        self.samples
            .iter()
            .filter(|sample| sample.state.counts_as_gathered())
            .map(|sample| sample.url.clone())
            .collect()
    }

    /// Samples currently counting against the completion threshold.
    pub fn gathered_count(&self) -> u32 {
        self.samples
            .iter()
            .filter(|sample| sample.state.counts_as_gathered())
            .count() as u32
    }

    pub fn pending_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| sample.state == SampleState::Pending)
            .count()
    }

    pub fn get(&self, id: &SampleId) -> Option<&Sample> {
        self.index.get(id).map(|&pos| &self.samples[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn pending_mut(&mut self, id: &SampleId) -> Result<&mut Sample, RegistryError> {
        let Some(&pos) = self.index.get(id) else {
            return Err(RegistryError::UnknownSample(id.clone()));
        };
        let sample = &mut self.samples[pos];
        if sample.state != SampleState::Pending {
            return Err(RegistryError::AlreadyResolved(id.clone()));
        }
        Ok(sample)
    }
}
