use collector_client::{ClientEvent, ClientHandle};
use collector_core::{Effect, Msg};
use collector_logging::collector_info;

/// Bridges the pure state machine and the IO client: effects become
/// client commands, client events become messages.
pub struct EffectRunner {
    client: ClientHandle,
}

impl EffectRunner {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    /// Runs effects; returns the hand-off payload once the session
    /// completes.
    pub fn run(&self, effects: Vec<Effect>) -> Option<Vec<String>> {
        let mut handoff = None;
        for effect in effects {
            match effect {
                Effect::Submit { id, url, label } => {
                    collector_info!("submit {id} url_len={}", url.len());
                    self.client.submit(id, url, label);
                }
                Effect::Poll { id, ticket } => {
                    collector_info!("poll {id} request_id={}", ticket.request_id);
                    self.client.poll(id, ticket);
                }
                Effect::Verify { urls } => {
                    collector_info!("verify over {} accepted urls", urls.len());
                    self.client.verify(urls);
                }
                Effect::CancelPolls => {
                    self.client.cancel_polls();
                }
                Effect::HandOff { urls } => {
                    collector_info!("hand-off with {} urls", urls.len());
                    handoff = Some(urls);
                }
            }
        }
        handoff
    }

    /// Drains one pending client event, translated for `update`.
    pub fn next_msg(&self) -> Option<Msg> {
        self.client.try_recv().map(|event| match event {
            ClientEvent::SubmitFinished { id, outcome } => Msg::SubmitFinished { id, outcome },
            ClientEvent::PollFinished { id, outcome } => Msg::PollFinished { id, outcome },
            ClientEvent::VerifyFinished { duplicate_urls } => {
                Msg::VerifyFinished { duplicate_urls }
            }
            ClientEvent::VerifyFailed { reason } => Msg::VerifyFailed { reason },
            ClientEvent::StatsFetched(stats) => Msg::StatsUpdated(stats),
        })
    }
}
