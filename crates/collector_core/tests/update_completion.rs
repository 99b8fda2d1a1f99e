use std::sync::Once;

use collector_core::{
    update, Effect, Msg, Outcome, Phase, RejectReason, SampleId, TaskConfig, TaskState, Verdict,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(collector_logging::initialize_for_tests);
}

fn add_url(state: TaskState, url: &str) -> (TaskState, SampleId) {
    let (state, effects) = update(
        state,
        Msg::AddSample {
            url: url.to_string(),
            label: None,
        },
    );
    match effects.first() {
        Some(Effect::Submit { id, .. }) => (state, id.clone()),
        other => panic!("expected Submit effect, got {other:?}"),
    }
}

fn accept(state: TaskState, id: SampleId, score: u32) -> (TaskState, Vec<Effect>) {
    update(
        state,
        Msg::SubmitFinished {
            id,
            outcome: Outcome::terminal(Verdict::Accepted { score }),
        },
    )
}

/// Threshold variant without the batch verify step.
fn gather_config(min: u32) -> TaskConfig {
    TaskConfig {
        verify_before_finish: false,
        ..TaskConfig::threshold_gather(min)
    }
}

#[test]
fn three_accepted_samples_complete_the_threshold_task() {
    init_logging();
    let state = TaskState::new(gather_config(3));

    let (state, a) = add_url(state, "http://a.com");
    let (state, b) = add_url(state, "http://b.com");
    let (state, c) = add_url(state, "http://c.com");

    let (state, effects) = accept(state, a, 10);
    assert!(effects.is_empty());
    let (state, effects) = accept(state, b, 10);
    assert!(effects.is_empty());
    let (state, effects) = accept(state, c, 10);

    assert_eq!(state.phase(), Phase::Complete);
    let view = state.view();
    assert_eq!(view.gathered, 3);
    assert_eq!(view.total_score, 30);
    assert!(!view.add_enabled);
    assert_eq!(
        effects,
        vec![
            Effect::CancelPolls,
            Effect::HandOff {
                urls: vec![
                    "http://a.com".to_string(),
                    "http://b.com".to_string(),
                    "http://c.com".to_string(),
                ],
            },
        ]
    );
}

#[test]
fn rejected_attempts_do_not_count_toward_the_threshold() {
    init_logging();
    let state = TaskState::new(gather_config(2));

    let (state, a) = add_url(state, "http://a.com");
    let (state, effects) = update(
        state,
        Msg::SubmitFinished {
            id: a,
            outcome: Outcome::rejected(RejectReason::Duplicate),
        },
    );
    assert!(effects.is_empty());

    let (state, b) = add_url(state, "http://b.com");
    let (state, c) = add_url(state, "http://c.com");
    let (state, _) = accept(state, b, 1);
    assert_eq!(state.phase(), Phase::Collecting);
    let (state, effects) = accept(state, c, 1);
    assert_eq!(state.phase(), Phase::Complete);

    // Only the accepted pair goes into the hand-off.
    assert!(effects.contains(&Effect::HandOff {
        urls: vec!["http://b.com".to_string(), "http://c.com".to_string()],
    }));
}

#[test]
fn handoff_fires_exactly_once() {
    init_logging();
    let state = TaskState::new(gather_config(1));

    let (state, a) = add_url(state, "http://a.com");
    let (state, b) = add_url(state, "http://b.com");

    let (state, effects) = accept(state, a, 10);
    assert_eq!(state.phase(), Phase::Complete);
    assert_eq!(effects.len(), 2);

    // A qualifying late resolution is recorded but never re-fires.
    let (state, effects) = update(
        state,
        Msg::PollFinished {
            id: b,
            outcome: Outcome::terminal(Verdict::Accepted { score: 10 }),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Complete);
    assert_eq!(state.view().gathered, 2);
    assert_eq!(state.view().total_score, 20);
}

#[test]
fn adds_are_ignored_after_completion() {
    init_logging();
    let state = TaskState::new(gather_config(1));
    let (state, a) = add_url(state, "http://a.com");
    let (state, _) = accept(state, a, 1);
    assert_eq!(state.phase(), Phase::Complete);

    let (state, effects) = update(
        state,
        Msg::AddSample {
            url: "http://late.com".to_string(),
            label: None,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().rows.len(), 1);
}

#[test]
fn server_all_signal_completes_regardless_of_count() {
    init_logging();
    let state = TaskState::new(gather_config(10));

    let (state, a) = add_url(state, "http://a.com");
    let (state, effects) = update(
        state,
        Msg::SubmitFinished {
            id: a,
            outcome: Outcome {
                verdict: Verdict::Accepted { score: 0 },
                all_collected: true,
            },
        },
    );
    assert_eq!(state.phase(), Phase::Complete);
    assert!(effects.contains(&Effect::HandOff {
        urls: vec!["http://a.com".to_string()],
    }));
}

#[test]
fn server_all_on_a_rejected_add_still_completes() {
    init_logging();
    let state = TaskState::new(gather_config(10));

    let (state, a) = add_url(state, "http://a.com");
    let (state, b) = add_url(state, "http://b.com");
    let (state, _) = accept(state, a, 1);

    // The service reports the global inventory exhausted while
    // declining this particular sample.
    let (state, effects) = update(
        state,
        Msg::SubmitFinished {
            id: b,
            outcome: Outcome {
                verdict: Verdict::Rejected(RejectReason::Server("".to_string())),
                all_collected: true,
            },
        },
    );
    assert_eq!(state.phase(), Phase::Complete);
    assert!(effects.contains(&Effect::HandOff {
        urls: vec!["http://a.com".to_string()],
    }));
}

#[test]
fn verify_step_runs_before_the_handoff() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(2));

    let (state, a) = add_url(state, "http://a.com");
    let (state, b) = add_url(state, "http://b.com");
    let (state, _) = accept(state, a, 1);
    let (state, effects) = accept(state, b, 1);

    assert_eq!(state.phase(), Phase::Verifying);
    assert_eq!(
        effects,
        vec![Effect::Verify {
            urls: vec!["http://a.com".to_string(), "http://b.com".to_string()],
        }]
    );

    let (state, effects) = update(
        state,
        Msg::VerifyFinished {
            duplicate_urls: Vec::new(),
        },
    );
    assert_eq!(state.phase(), Phase::Complete);
    assert!(effects.contains(&Effect::HandOff {
        urls: vec!["http://a.com".to_string(), "http://b.com".to_string()],
    }));
}

#[test]
fn verify_duplicates_demote_and_reopen_collection() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(2));

    let (state, a) = add_url(state, "http://x.com");
    let (state, b) = add_url(state, "http://b.com");
    let (state, _) = accept(state, a, 1);
    let (state, effects) = accept(state, b, 1);
    assert_eq!(state.phase(), Phase::Verifying);
    assert!(!effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::VerifyFinished {
            duplicate_urls: vec!["http://x.com".to_string()],
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Collecting);
    let view = state.view();
    assert_eq!(view.gathered, 1);
    assert!(view.add_enabled);

    // Replacing the flagged url re-reaches the threshold and verifies
    // again over the corrected set.
    let (state, c) = add_url(state, "http://c.com");
    let (state, effects) = accept(state, c, 1);
    assert_eq!(state.phase(), Phase::Verifying);
    assert_eq!(
        effects,
        vec![Effect::Verify {
            urls: vec!["http://b.com".to_string(), "http://c.com".to_string()],
        }]
    );

    let (state, effects) = update(
        state,
        Msg::VerifyFinished {
            duplicate_urls: Vec::new(),
        },
    );
    assert_eq!(state.phase(), Phase::Complete);
    assert!(effects.contains(&Effect::HandOff {
        urls: vec!["http://b.com".to_string(), "http://c.com".to_string()],
    }));
}

#[test]
fn verify_transport_failure_reopens_collection() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(1));

    let (state, a) = add_url(state, "http://a.com");
    let (state, _) = accept(state, a, 1);
    assert_eq!(state.phase(), Phase::Verifying);

    let (state, effects) = update(
        state,
        Msg::VerifyFailed {
            reason: "connection refused".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Collecting);
    assert!(state
        .view()
        .input_error
        .unwrap()
        .contains("duplicate check failed"));
}

#[test]
fn total_score_never_decreases_on_demotion() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(2));

    let (state, a) = add_url(state, "http://a.com");
    let (state, b) = add_url(state, "http://b.com");
    let (state, _) = accept(state, a, 10);
    let (state, _) = accept(state, b, 10);
    assert_eq!(state.view().total_score, 20);

    let (state, _) = update(
        state,
        Msg::VerifyFinished {
            duplicate_urls: vec!["http://a.com".to_string()],
        },
    );
    // Gathered recounts; the accumulated score does not.
    assert_eq!(state.view().gathered, 1);
    assert_eq!(state.view().total_score, 20);
}
