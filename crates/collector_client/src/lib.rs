//! Collector client: HTTP gateway, polling monitor and effect execution.
mod api;
mod client;
mod gateway;
mod monitor;

pub use api::{
    AddSampleRequest, AddSampleResponse, SampleStatusResponse, SessionStatsResponse,
    VerifyRequest, VerifyResponse,
};
pub use client::{ClientEvent, ClientHandle};
pub use gateway::{GatewayError, GatewaySettings, HttpGateway, PollReply, SampleGateway};
pub use monitor::{poll_until_resolved, PollSettings};
