use std::sync::Once;

use collector_core::{
    update, Effect, InputError, Msg, Outcome, Phase, RejectReason, SampleState, TaskConfig,
    TaskState, Verdict,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(collector_logging::initialize_for_tests);
}

fn add_url(state: TaskState, url: &str) -> (TaskState, Vec<Effect>) {
    update(
        state,
        Msg::AddSample {
            url: url.to_string(),
            label: None,
        },
    )
}

fn submitted_id(effects: &[Effect]) -> collector_core::SampleId {
    match effects.first() {
        Some(Effect::Submit { id, .. }) => id.clone(),
        other => panic!("expected Submit effect, got {other:?}"),
    }
}

#[test]
fn add_emits_one_submit_with_canonical_url() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "  Example.com/page ");

    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::Submit { url, label, .. } => {
            assert_eq!(url, "http://example.com/page");
            assert_eq!(*label, None);
        }
        other => panic!("expected Submit, got {other:?}"),
    }
    let view = state.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].state, SampleState::Pending);
    assert!(view.add_enabled);
}

#[test]
fn second_add_of_same_url_is_duplicate_local() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "http://x.com");
    assert_eq!(effects.len(), 1);

    // Normalized variants of the same url collide without a request.
    let (state, effects) = add_url(state, "HTTP://X.COM/");
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.rows.len(), 1);
    assert!(view.input_error.unwrap().contains("already on the list"));
}

#[test]
fn empty_and_malformed_input_issue_no_request() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "   ");
    assert!(effects.is_empty());
    assert_eq!(
        state.view().input_error.as_deref(),
        Some(&*InputError::EmptyUrl.to_string())
    );

    let (state, effects) = add_url(state, "http://");
    assert!(effects.is_empty());
    assert_eq!(state.view().rows.len(), 0);
    assert!(state.view().input_error.unwrap().contains("not a valid url"));
}

#[test]
fn server_side_validation_variant_submits_raw_input() {
    init_logging();
    let state = TaskState::new(TaskConfig::beat_the_machine(3));

    let (state, effects) = add_url(state, "not a url");
    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::Submit { url, .. } => assert_eq!(url, "not a url"),
        other => panic!("expected Submit, got {other:?}"),
    }
    assert_eq!(state.view().rows.len(), 1);
}

#[test]
fn attempt_cap_disables_further_adds() {
    init_logging();
    let config = TaskConfig {
        max_allowed: Some(2),
        ..TaskConfig::threshold_gather(5)
    };
    let state = TaskState::new(config);

    let (state, _) = add_url(state, "http://a.com");
    let (state, _) = add_url(state, "http://b.com");
    assert!(!state.view().add_enabled);

    let (state, effects) = add_url(state, "http://c.com");
    assert!(effects.is_empty());
    assert_eq!(state.view().rows.len(), 2);
    assert_eq!(
        state.view().input_error.as_deref(),
        Some(&*InputError::AttemptLimitReached.to_string())
    );
}

#[test]
fn rejected_sample_stays_listed_and_can_be_retried() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "http://x.com");
    let id = submitted_id(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmitFinished {
            id,
            outcome: Outcome::rejected(RejectReason::DomainDuplicate),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.rows[0].state, SampleState::Rejected);
    assert!(view.rows[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("too many urls from this domain"));
    assert_eq!(view.gathered, 0);

    // Retry after rejection reuses the same entry.
    let (state, effects) = add_url(state, "http://x.com");
    assert_eq!(effects.len(), 1);
    let view = state.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].state, SampleState::Pending);
}

#[test]
fn transport_failure_is_a_rejected_outcome() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "http://x.com");
    let id = submitted_id(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmitFinished {
            id,
            outcome: Outcome::rejected(RejectReason::Transport),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().rows[0].state, SampleState::Rejected);
    assert_eq!(state.phase(), Phase::Collecting);
}

#[test]
fn resolved_verdict_scores_the_sample() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));

    let (state, effects) = add_url(state, "http://x.com");
    let id = submitted_id(&effects);

    let (state, _) = update(
        state,
        Msg::SubmitFinished {
            id,
            outcome: Outcome::terminal(Verdict::Accepted { score: 10 }),
        },
    );
    let view = state.view();
    assert_eq!(view.rows[0].state, SampleState::Accepted);
    assert_eq!(view.rows[0].score, 10);
    assert_eq!(view.total_score, 10);
    assert_eq!(view.gathered, 1);
}

#[test]
fn stats_update_is_display_only() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(1));

    let (state, effects) = update(
        state,
        Msg::StatsUpdated(collector_core::SessionStats {
            points_gathered: 50,
            pending_verifications: 2,
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Collecting);
    assert_eq!(state.view().stats.unwrap().points_gathered, 50);
}

#[test]
fn update_is_noop_on_noop() {
    init_logging();
    let state = TaskState::new(TaskConfig::threshold_gather(3));
    let (next, effects) = update(state.clone(), Msg::NoOp);
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
