use std::time::Duration;

use collector_logging::{collector_debug, collector_warn};

use collector_core::{Outcome, RejectReason, Ticket};

use crate::gateway::{PollReply, SampleGateway};

/// Bounds for status polling.
///
/// The service's observed cadence is a fixed 2 s delay with unbounded
/// retry; these bounds replace that with capped exponential backoff and
/// a terminal timeout so an abandoned ticket cannot leak polls forever.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            multiplier: 1.5,
            max_delay: Duration::from_secs(30),
            max_attempts: 40,
        }
    }
}

impl PollSettings {
    /// Delay before the given attempt (1-indexed):
    /// `initial_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        self.max_delay.min(Duration::from_secs_f64(secs))
    }
}

/// Queries the ticket's status address until a verdict arrives or the
/// bounds run out; exhaustion is a terminal timeout rejection.
pub async fn poll_until_resolved(
    gateway: &dyn SampleGateway,
    ticket: &Ticket,
    settings: &PollSettings,
) -> Outcome {
    for attempt in 1..=settings.max_attempts {
        tokio::time::sleep(settings.delay_before(attempt)).await;
        match gateway.poll_status(ticket).await {
            PollReply::Resolved(outcome) => return outcome,
            PollReply::Pending => {
                collector_debug!(
                    "ticket {} still pending (attempt {attempt})",
                    ticket.request_id
                );
            }
            PollReply::Unreachable(detail) => {
                collector_warn!(
                    "status query for ticket {} failed (attempt {attempt}): {detail}",
                    ticket.request_id
                );
            }
        }
    }
    collector_warn!(
        "giving up on ticket {} after {} attempts",
        ticket.request_id,
        settings.max_attempts
    );
    Outcome::rejected(RejectReason::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let settings = PollSettings::default();
        assert_eq!(settings.delay_before(1), Duration::from_secs(2));
        assert_eq!(settings.delay_before(2), Duration::from_secs(3));
        assert!(settings.delay_before(3) > settings.delay_before(2));
        assert_eq!(settings.delay_before(40), Duration::from_secs(30));
    }
}
