use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use collector_logging::{collector_debug, collector_error};

use collector_core::{Outcome, SampleId, SessionStats, Ticket};

use crate::gateway::{GatewayError, GatewaySettings, HttpGateway, SampleGateway};
use crate::monitor::{poll_until_resolved, PollSettings};

enum ClientCommand {
    Submit {
        id: SampleId,
        url: String,
        label: Option<String>,
    },
    Poll {
        id: SampleId,
        ticket: Ticket,
    },
    Verify {
        urls: Vec<String>,
    },
    CancelPolls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SubmitFinished { id: SampleId, outcome: Outcome },
    PollFinished { id: SampleId, outcome: Outcome },
    VerifyFinished { duplicate_urls: Vec<String> },
    VerifyFailed { reason: String },
    StatsFetched(SessionStats),
}

type PollTasks = Arc<Mutex<HashMap<SampleId, tokio::task::JoinHandle<()>>>>;

/// Handle to the IO thread: commands in, events out via `try_recv`.
///
/// Each in-flight poll is tracked per sample id so `cancel_polls` can
/// abort everything outstanding on completion or teardown. Dropping the
/// handle closes the command channel, which ends the thread and its
/// runtime.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl ClientHandle {
    /// Spawns the IO thread with its own tokio runtime. When
    /// `stats_interval` is set, a detached loop refreshes the session
    /// aggregate at that cadence until the polls are cancelled.
    pub fn new(
        gateway: Arc<dyn SampleGateway>,
        poll_settings: PollSettings,
        stats_interval: Option<Duration>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || run_io_thread(gateway, poll_settings, stats_interval, cmd_rx, event_tx));

        Self { cmd_tx, event_rx }
    }

    /// Convenience constructor over the reqwest gateway.
    pub fn with_http(
        settings: GatewaySettings,
        poll_settings: PollSettings,
        stats_interval: Option<Duration>,
    ) -> Result<Self, GatewayError> {
        let gateway = Arc::new(HttpGateway::new(settings)?);
        Ok(Self::new(gateway, poll_settings, stats_interval))
    }

    pub fn submit(&self, id: SampleId, url: impl Into<String>, label: Option<String>) {
        let _ = self.cmd_tx.send(ClientCommand::Submit {
            id,
            url: url.into(),
            label,
        });
    }

    pub fn poll(&self, id: SampleId, ticket: Ticket) {
        let _ = self.cmd_tx.send(ClientCommand::Poll { id, ticket });
    }

    pub fn verify(&self, urls: Vec<String>) {
        let _ = self.cmd_tx.send(ClientCommand::Verify { urls });
    }

    pub fn cancel_polls(&self) {
        let _ = self.cmd_tx.send(ClientCommand::CancelPolls);
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn run_io_thread(
    gateway: Arc<dyn SampleGateway>,
    poll_settings: PollSettings,
    stats_interval: Option<Duration>,
    cmd_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::Sender<ClientEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            collector_error!("cannot start io runtime: {err}");
            return;
        }
    };
    let polls: PollTasks = Arc::new(Mutex::new(HashMap::new()));

    let stats_task = stats_interval.map(|interval| {
        let gateway = gateway.clone();
        let event_tx = event_tx.clone();
        runtime.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match gateway.session_stats().await {
                    Ok(stats) => {
                        let _ = event_tx.send(ClientEvent::StatsFetched(stats));
                    }
                    Err(err) => collector_debug!("stats fetch failed: {err}"),
                }
            }
        })
    });

    while let Ok(command) = cmd_rx.recv() {
        match command {
            ClientCommand::Submit { id, url, label } => {
                let gateway = gateway.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let outcome = gateway.submit(&url, label.as_deref()).await;
                    let _ = event_tx.send(ClientEvent::SubmitFinished { id, outcome });
                });
            }
            ClientCommand::Poll { id, ticket } => {
                let gateway = gateway.clone();
                let event_tx = event_tx.clone();
                let settings = poll_settings.clone();
                let tasks = polls.clone();
                let task_id = id.clone();
                let handle = runtime.spawn(async move {
                    let outcome =
                        poll_until_resolved(gateway.as_ref(), &ticket, &settings).await;
                    let _ = event_tx.send(ClientEvent::PollFinished {
                        id: task_id.clone(),
                        outcome,
                    });
                    if let Ok(mut tasks) = tasks.lock() {
                        tasks.remove(&task_id);
                    }
                });
                if let Ok(mut tasks) = polls.lock() {
                    if let Some(previous) = tasks.insert(id, handle) {
                        // One poll per sample; a stray second ticket
                        // replaces the first.
                        previous.abort();
                    }
                }
            }
            ClientCommand::Verify { urls } => {
                let gateway = gateway.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match gateway.verify(&urls).await {
                        Ok(duplicate_urls) => ClientEvent::VerifyFinished { duplicate_urls },
                        Err(err) => ClientEvent::VerifyFailed {
                            reason: err.to_string(),
                        },
                    };
                    let _ = event_tx.send(event);
                });
            }
            ClientCommand::CancelPolls => {
                if let Ok(mut tasks) = polls.lock() {
                    let cancelled = tasks.len();
                    for (_, handle) in tasks.drain() {
                        handle.abort();
                    }
                    if cancelled > 0 {
                        collector_debug!("cancelled {cancelled} outstanding polls");
                    }
                }
                if let Some(task) = &stats_task {
                    task.abort();
                }
            }
        }
    }
    // Command channel closed: dropping the runtime aborts what remains.
}
