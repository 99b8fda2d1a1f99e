//! Wire types for the two validation-service contracts, plus the
//! normalization of their heterogeneous response shapes.

use collector_core::{Outcome, RejectReason, Ticket, Verdict};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/sample/add/tagasauris/{job_id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddSampleRequest<'a> {
    pub url: &'a str,
    pub worker_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
}

/// Both observed add-response shapes in one struct; which fields are
/// present decides the outcome.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AddSampleResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub all: Option<bool>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub status_url: Option<String>,
}

impl AddSampleResponse {
    /// Normalizes the response into one outcome: a ticket when the
    /// verdict is deferred, otherwise the direct verdict.
    pub fn into_outcome(self) -> Outcome {
        let all_collected = self.all.unwrap_or(false);
        if let (Some(request_id), Some(status_url)) = (self.request_id, self.status_url) {
            return Outcome {
                verdict: Verdict::Deferred(Ticket {
                    request_id,
                    status_url,
                }),
                all_collected,
            };
        }
        let verdict = match self.result.as_deref() {
            Some("added") => Verdict::Accepted { score: 0 },
            // An empty result with `all` set means the task finished
            // server-side before this sample could be added.
            Some("") => Verdict::Rejected(RejectReason::Server(
                "collection is already complete".to_string(),
            )),
            Some(reason) => Verdict::Rejected(RejectReason::from_server(reason)),
            None => Verdict::Rejected(RejectReason::Server(
                "response carried no verdict".to_string(),
            )),
        };
        Outcome {
            verdict,
            all_collected,
        }
    }
}

/// Body of `GET {status_url}?request_id={id}`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SampleStatusResponse {
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub labels_matched: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub all: Option<bool>,
}

impl SampleStatusResponse {
    /// Extracts the verdict; absence of every verdict field means keep
    /// polling.
    pub fn verdict(&self) -> Option<Verdict> {
        if let Some(matched) = self.labels_matched {
            let score = self.points.unwrap_or(0);
            return Some(if matched {
                Verdict::Matched { score }
            } else {
                Verdict::Mismatched
            });
        }
        self.points.map(|score| Verdict::Accepted { score })
    }
}

/// Body of `POST /api/v1/sample/verify/{job_id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest<'a> {
    pub urls: &'a [String],
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VerifyResponse {
    #[serde(default)]
    pub duplicate_urls: Vec<String>,
}

/// Body of `GET /api/v1/btm/data/tagasauris/{job_id}/`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionStatsResponse {
    #[serde(default)]
    pub points_gathered: u32,
    #[serde(default)]
    pub pending_verifications: u32,
}
