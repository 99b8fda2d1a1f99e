use crate::sample::Verdict;

/// How resolved samples convert into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// Every accepted resolution credits the points the server attached.
    PointsPerResolved,
    /// Only label matches credit points; plain accepts collect without
    /// scoring.
    MatchedOnly,
}

impl ScoringPolicy {
    pub fn score_for(self, verdict: &Verdict) -> u32 {
        match (self, verdict) {
            (_, Verdict::Matched { score }) => *score,
            (ScoringPolicy::PointsPerResolved, Verdict::Accepted { score }) => *score,
            _ => 0,
        }
    }
}

/// Task-variant configuration, fixed when the session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Accepted samples needed before the task can finish; absent for
    /// purely server-signaled variants.
    pub min_required: Option<u32>,
    /// Cap on add attempts (all of them, rejects included); absent
    /// means unbounded.
    pub max_allowed: Option<u32>,
    pub scoring: ScoringPolicy,
    /// Whether a batch duplicate check runs before the hand-off.
    pub verify_before_finish: bool,
    /// Whether malformed input is refused without a server round trip.
    pub validate_urls_locally: bool,
}

impl TaskConfig {
    /// Plain "gather N good urls" variant with the batch verify step.
    pub fn threshold_gather(min_required: u32) -> Self {
        Self {
            min_required: Some(min_required),
            max_allowed: None,
            scoring: ScoringPolicy::PointsPerResolved,
            verify_before_finish: true,
            validate_urls_locally: true,
        }
    }

    /// Beat-the-machine variant: server validates everything, points per
    /// resolved sample, no batch verify.
    pub fn beat_the_machine(min_required: u32) -> Self {
        Self {
            min_required: Some(min_required),
            max_allowed: None,
            scoring: ScoringPolicy::PointsPerResolved,
            verify_before_finish: false,
            validate_urls_locally: false,
        }
    }

    /// Label-matching variant: only matches score.
    pub fn label_matching(min_required: u32) -> Self {
        Self {
            min_required: Some(min_required),
            max_allowed: None,
            scoring: ScoringPolicy::MatchedOnly,
            verify_before_finish: false,
            validate_urls_locally: true,
        }
    }

    /// Completion predicate: the server's task-level signal or the local
    /// threshold, whichever fires first.
    pub fn completion_satisfied(&self, gathered: u32, server_all: bool) -> bool {
        server_all || self.min_required.is_some_and(|min| gathered >= min)
    }

    /// Whether the attempt cap forbids further adds.
    pub fn attempts_exhausted(&self, attempts: usize) -> bool {
        self.max_allowed.is_some_and(|max| attempts as u32 >= max)
    }
}
