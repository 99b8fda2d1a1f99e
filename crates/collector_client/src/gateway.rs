use std::time::Duration;

use collector_logging::collector_warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use collector_core::{Outcome, RejectReason, SessionStats, Ticket};

use crate::api::{
    AddSampleRequest, AddSampleResponse, SampleStatusResponse, SessionStatsResponse,
    VerifyRequest, VerifyResponse,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("undecodable response body: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Base address of the validation service.
    pub core_url: String,
    pub job_id: String,
    pub worker_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl GatewaySettings {
    pub fn new(
        core_url: impl Into<String>,
        job_id: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            core_url: core_url.into(),
            job_id: job_id.into(),
            worker_id: worker_id.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One reply from the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollReply {
    Resolved(Outcome),
    /// Verdict fields absent; keep polling.
    Pending,
    /// Transport-level failure; counts as a poll attempt.
    Unreachable(String),
}

/// The seam between the state machine and the validation service.
#[async_trait::async_trait]
pub trait SampleGateway: Send + Sync {
    /// Issues exactly one add request, never retried automatically.
    /// Transport failures surface as a `Rejected(Transport)` outcome so
    /// the worker can retry by re-entering the url.
    async fn submit(&self, url: &str, label: Option<&str>) -> Outcome;

    /// One status query for a deferred sample.
    async fn poll_status(&self, ticket: &Ticket) -> PollReply;

    /// Batch duplicate check over the accepted set; returns the urls the
    /// service flags as duplicates.
    async fn verify(&self, urls: &[String]) -> Result<Vec<String>, GatewayError>;

    /// Session-wide aggregate, display only.
    async fn session_stats(&self) -> Result<SessionStats, GatewayError>;
}

/// reqwest-backed gateway speaking the JSON contracts.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    settings: GatewaySettings,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn base(&self) -> &str {
        self.settings.core_url.trim_end_matches('/')
    }

    fn add_address(&self) -> String {
        format!(
            "{}/api/v1/sample/add/tagasauris/{}/",
            self.base(),
            self.settings.job_id
        )
    }

    fn verify_address(&self) -> String {
        format!(
            "{}/api/v1/sample/verify/{}/",
            self.base(),
            self.settings.job_id
        )
    }

    fn stats_address(&self) -> String {
        format!(
            "{}/api/v1/btm/data/tagasauris/{}/",
            self.base(),
            self.settings.job_id
        )
    }

    /// The ticket's status address may be absolute or server-relative.
    fn status_address(&self, ticket: &Ticket) -> String {
        if ticket.status_url.starts_with("http://") || ticket.status_url.starts_with("https://") {
            ticket.status_url.clone()
        } else {
            format!("{}{}", self.base(), ticket.status_url)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        address: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(address)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        address: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(address)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status.as_u16()));
    }
    response
        .json()
        .await
        .map_err(|err| GatewayError::Decode(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait::async_trait]
impl SampleGateway for HttpGateway {
    async fn submit(&self, url: &str, label: Option<&str>) -> Outcome {
        let body = AddSampleRequest {
            url,
            worker_id: &self.settings.worker_id,
            label,
        };
        match self
            .post_json::<_, AddSampleResponse>(&self.add_address(), &body)
            .await
        {
            Ok(response) => response.into_outcome(),
            Err(err) => {
                collector_warn!("add request failed for {url}: {err}");
                Outcome::rejected(RejectReason::Transport)
            }
        }
    }

    async fn poll_status(&self, ticket: &Ticket) -> PollReply {
        let address = self.status_address(ticket);
        match self
            .get_json::<SampleStatusResponse>(
                &address,
                &[("request_id", ticket.request_id.as_str())],
            )
            .await
        {
            Ok(response) => match response.verdict() {
                Some(verdict) => PollReply::Resolved(Outcome {
                    verdict,
                    all_collected: response.all.unwrap_or(false),
                }),
                None => PollReply::Pending,
            },
            Err(err) => PollReply::Unreachable(err.to_string()),
        }
    }

    async fn verify(&self, urls: &[String]) -> Result<Vec<String>, GatewayError> {
        let response: VerifyResponse = self
            .post_json(&self.verify_address(), &VerifyRequest { urls })
            .await?;
        Ok(response.duplicate_urls)
    }

    async fn session_stats(&self) -> Result<SessionStats, GatewayError> {
        let response: SessionStatsResponse = self
            .get_json(
                &self.stats_address(),
                &[("worker_id", self.settings.worker_id.as_str())],
            )
            .await?;
        Ok(SessionStats {
            points_gathered: response.points_gathered,
            pending_verifications: response.pending_verifications,
        })
    }
}
