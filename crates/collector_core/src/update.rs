use collector_logging::{collector_debug, collector_error, collector_warn};

use crate::registry::RegistryError;
use crate::sample::{normalize_url, Outcome, SampleId, UrlError, Verdict};
use crate::state::{InputError, Phase, TaskState};
use crate::{Effect, Msg};

/// Pure update function: applies a message to the session and returns
/// any effects for the IO layer to run.
pub fn update(mut state: TaskState, msg: Msg) -> (TaskState, Vec<Effect>) {
    let effects = match msg {
        Msg::AddSample { url, label } => handle_add(&mut state, &url, label),
        Msg::SubmitFinished { id, outcome } => handle_outcome(&mut state, id, outcome, "submit"),
        Msg::PollFinished { id, outcome } => handle_outcome(&mut state, id, outcome, "poll"),
        Msg::VerifyFinished { duplicate_urls } => handle_verify(&mut state, duplicate_urls),
        Msg::VerifyFailed { reason } => {
            if state.phase() == Phase::Verifying {
                collector_warn!("verify request failed: {reason}");
                state.set_phase(Phase::Collecting);
                state.set_input_error(InputError::VerifyUnreachable(reason));
            }
            Vec::new()
        }
        Msg::StatsUpdated(stats) => {
            state.set_stats(stats);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn handle_add(state: &mut TaskState, url: &str, label: Option<String>) -> Vec<Effect> {
    if state.phase() != Phase::Collecting {
        collector_debug!("ignoring add while {:?}: {url}", state.phase());
        return Vec::new();
    }
    if state.config().attempts_exhausted(state.registry().len()) {
        state.set_input_error(InputError::AttemptLimitReached);
        return Vec::new();
    }

    let trimmed = url.trim();
    let (id, canonical) = match normalize_url(trimmed) {
        Ok(pair) => pair,
        Err(UrlError::Empty) => {
            state.set_input_error(InputError::EmptyUrl);
            return Vec::new();
        }
        Err(UrlError::Malformed(detail)) => {
            if state.config().validate_urls_locally {
                state.set_input_error(InputError::MalformedUrl(detail));
                return Vec::new();
            }
            // This variant leaves validation to the server: submit the
            // raw text and let the service reject it.
            (SampleId::from_raw(trimmed), trimmed.to_string())
        }
    };

    match state
        .registry_mut()
        .add(id.clone(), canonical.clone(), label.clone())
    {
        Ok(()) => {
            state.clear_input_error();
            vec![Effect::Submit {
                id,
                url: canonical,
                label,
            }]
        }
        Err(RegistryError::DuplicateLocal(_)) => {
            state.set_input_error(InputError::DuplicateUrl(canonical));
            Vec::new()
        }
        Err(err) => {
            collector_error!("registry refused add for {id}: {err}");
            Vec::new()
        }
    }
}

fn handle_outcome(
    state: &mut TaskState,
    id: SampleId,
    outcome: Outcome,
    source: &str,
) -> Vec<Effect> {
    match outcome.verdict {
        Verdict::Deferred(ticket) => {
            match state.registry_mut().attach_ticket(&id, ticket.clone()) {
                Ok(()) => vec![Effect::Poll { id, ticket }],
                Err(err) => {
                    collector_error!("{source}: cannot defer {id}: {err}");
                    Vec::new()
                }
            }
        }
        verdict => {
            if let Err(err) = state.registry_mut().resolve(&id, &verdict) {
                // Duplicate or stray resolution: fatal to that poll
                // only, never to the session.
                collector_error!("{source}: dropping resolution for {id}: {err}");
                return Vec::new();
            }
            if outcome.all_collected {
                state.note_server_all();
            }
            let score = state.config().scoring.score_for(&verdict);
            state.add_score(score);
            after_resolution(state)
        }
    }
}

/// Runs the completion policy after an applied resolution. Outside
/// `Collecting` the resolution was bookkeeping only: late polls must
/// never reopen the session or re-trigger the hand-off.
fn after_resolution(state: &mut TaskState) -> Vec<Effect> {
    if state.phase() != Phase::Collecting {
        return Vec::new();
    }
    if !state
        .config()
        .completion_satisfied(state.gathered_count(), state.server_all())
    {
        return Vec::new();
    }
    if state.config().verify_before_finish {
        state.set_phase(Phase::Verifying);
        vec![Effect::Verify {
            urls: state.registry().accepted_urls(),
        }]
    } else {
        complete(state)
    }
}

fn complete(state: &mut TaskState) -> Vec<Effect> {
    if !state.mark_handoff() {
        return Vec::new();
    }
    state.set_phase(Phase::Complete);
    vec![
        Effect::CancelPolls,
        Effect::HandOff {
            urls: state.registry().accepted_urls(),
        },
    ]
}

fn handle_verify(state: &mut TaskState, duplicate_urls: Vec<String>) -> Vec<Effect> {
    if state.phase() != Phase::Verifying {
        collector_debug!("ignoring verify result while {:?}", state.phase());
        return Vec::new();
    }
    if duplicate_urls.is_empty() {
        return complete(state);
    }
    let ids: Vec<SampleId> = duplicate_urls
        .iter()
        .map(|raw| match normalize_url(raw) {
            Ok((id, _)) => id,
            Err(_) => SampleId::from_raw(raw),
        })
        .collect();
    let demoted = state.registry_mut().mark_duplicates(&ids);
    collector_warn!(
        "verify flagged {} urls as duplicates ({demoted} demoted); collecting again",
        ids.len()
    );
    state.set_phase(Phase::Collecting);
    Vec::new()
}
