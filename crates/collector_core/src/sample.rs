use std::fmt;

use url::Url;

/// Identity of a sample, derived from the normalized URL so duplicate
/// URLs collide by construction before any server round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(String);

impl SampleId {
    /// Builds an id from worker input without URL validation.
    ///
    /// Task variants that leave validation to the server still need a
    /// stable identity for whatever the worker typed; trivial
    /// whitespace and case noise is collapsed.
    pub fn from_raw(input: &str) -> Self {
        Self(input.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    Empty,
    Malformed(String),
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::Empty => write!(f, "empty url"),
            UrlError::Malformed(detail) => write!(f, "malformed url: {detail}"),
        }
    }
}

/// Normalizes worker input into its identity and canonical URL text.
///
/// A missing scheme defaults to `http://`; the parser lowercases scheme
/// and host; a bare trailing slash is dropped so `http://x.com` and
/// `http://x.com/` collide.
pub fn normalize_url(input: &str) -> Result<(SampleId, String), UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let parsed = Url::parse(&candidate).map_err(|err| UrlError::Malformed(err.to_string()))?;
    if !parsed.has_host() {
        return Err(UrlError::Malformed("url has no host".into()));
    }
    let mut normalized = parsed.to_string();
    if parsed.path() == "/" && parsed.query().is_none() && parsed.fragment().is_none() {
        normalized.pop();
    }
    Ok((SampleId(normalized.clone()), normalized))
}

/// Correlation token returned when the service defers its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub request_id: String,
    pub status_url: String,
}

/// Why the service (or the transport) declined a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Duplicate,
    DomainDuplicate,
    MalformedUrl,
    Transport,
    Timeout,
    /// Opaque server text not covered by the known reason codes.
    Server(String),
}

impl RejectReason {
    /// Maps the service's reason string onto the known codes.
    pub fn from_server(reason: &str) -> Self {
        match reason {
            "duplicate" => RejectReason::Duplicate,
            "domain duplicate" => RejectReason::DomainDuplicate,
            "malformed url" => RejectReason::MalformedUrl,
            other => RejectReason::Server(other.to_string()),
        }
    }
}

impl fmt::Display for RejectReason {
    /// Worker-facing description of the rejection.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Duplicate => write!(f, "this url was already collected"),
            RejectReason::DomainDuplicate => write!(f, "too many urls from this domain"),
            RejectReason::MalformedUrl => write!(f, "this is not a valid url"),
            RejectReason::Transport => write!(f, "could not reach the validation service"),
            RejectReason::Timeout => write!(f, "the validation service did not answer in time"),
            RejectReason::Server(text) => f.write_str(text),
        }
    }
}

/// Lifecycle state of one sample; `Pending` is the only non-terminal
/// state, and `Duplicate` is additionally reachable from the accepted
/// states via the batch verify step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleState {
    Pending,
    Accepted,
    Rejected,
    Duplicate,
    Matched,
    Mismatched,
}

impl SampleState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SampleState::Pending)
    }

    /// Whether this state counts against the completion threshold.
    pub fn counts_as_gathered(self) -> bool {
        matches!(self, SampleState::Accepted | SampleState::Matched)
    }
}

impl fmt::Display for SampleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleState::Pending => write!(f, "pending"),
            SampleState::Accepted => write!(f, "accepted"),
            SampleState::Rejected => write!(f, "rejected"),
            SampleState::Duplicate => write!(f, "duplicate"),
            SampleState::Matched => write!(f, "matched"),
            SampleState::Mismatched => write!(f, "mismatched"),
        }
    }
}

/// Normalized result of one add or status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { score: u32 },
    Matched { score: u32 },
    Mismatched,
    Rejected(RejectReason),
    /// No verdict yet; poll the ticket.
    Deferred(Ticket),
}

/// A verdict plus the service's task-level "all collected" signal,
/// which can accompany any response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub all_collected: bool,
}

impl Outcome {
    pub fn terminal(verdict: Verdict) -> Self {
        Self {
            verdict,
            all_collected: false,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self::terminal(Verdict::Rejected(reason))
    }
}

/// One worker-submitted candidate URL and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id: SampleId,
    pub url: String,
    pub expected_label: Option<String>,
    pub state: SampleState,
    pub reason: Option<RejectReason>,
    pub score: u32,
    pub ticket: Option<Ticket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_defaults_missing_scheme_to_http() {
        let (id, url) = normalize_url("example.com/page").unwrap();
        assert_eq!(url, "http://example.com/page");
        assert_eq!(id.as_str(), "http://example.com/page");
    }

    #[test]
    fn normalization_collapses_case_and_trailing_slash() {
        let (a, _) = normalize_url("HTTPS://EXAMPLE.COM").unwrap();
        let (b, _) = normalize_url("  https://example.com/  ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://example.com");
    }

    #[test]
    fn normalization_keeps_non_root_paths_intact() {
        let (_, url) = normalize_url("https://example.com/a/").unwrap();
        assert_eq!(url, "https://example.com/a/");
    }

    #[test]
    fn normalization_rejects_empty_and_garbage() {
        assert_eq!(normalize_url("   "), Err(UrlError::Empty));
        assert!(matches!(
            normalize_url("http://"),
            Err(UrlError::Malformed(_))
        ));
    }

    #[test]
    fn reject_reason_parses_known_codes() {
        assert_eq!(RejectReason::from_server("duplicate"), RejectReason::Duplicate);
        assert_eq!(
            RejectReason::from_server("domain duplicate"),
            RejectReason::DomainDuplicate
        );
        assert_eq!(
            RejectReason::from_server("malformed url"),
            RejectReason::MalformedUrl
        );
        assert_eq!(
            RejectReason::from_server("job inactive"),
            RejectReason::Server("job inactive".to_string())
        );
    }
}
