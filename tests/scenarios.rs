//! End-to-end scenarios over the public API

use autostate::state_machine::{
    EventId, FsmModel, GraphBuilder, GuardOutcome, StateId, Transition, Verifier, merge,
    parse_events, simulate, simulator::NO_TRANSITION,
};

fn t(state: &str, event: &str, action: &str, next: &str) -> Transition {
    Transition::new(
        StateId::new(state).unwrap(),
        EventId::new(event).unwrap(),
        action,
        StateId::new(next).unwrap(),
    )
}

fn build(list: &[Transition]) -> FsmModel {
    GraphBuilder::default().build(list, "scenario").unwrap()
}

#[test]
fn test_single_transition_build_and_replay() {
    let model = build(&[t("idle", "start", "activate", "running")]);
    assert_eq!(model.states(), &["idle", "running"]);
    assert_eq!(model.initial_state(), "idle");

    let steps = simulate(&model, &parse_events(&["start"]).unwrap(), None);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].current_state, "idle");
    assert_eq!(steps[0].event, "start");
    assert_eq!(steps[0].next_state, "running");
    assert_eq!(steps[0].action, "activate");
    assert_eq!(steps[0].guard_evaluated, GuardOutcome::NotApplicable);
}

#[test]
fn test_exact_duplicate_transition() {
    let dup = t("idle", "start", "activate", "running");
    let model = build(&[dup.clone(), dup.clone()]);
    let report = Verifier::default().verify(&model);
    assert!(!report.is_deterministic);
    assert_eq!(report.errors.len(), 1);

    let merged = merge(&[dup.clone()], &[dup.clone()]);
    assert_eq!(merged, vec![dup]);
}

#[test]
fn test_unauthorized_without_recovery() {
    let model = build(&[
        t("idle", "start", "activate", "running"),
        t("running", "access", "check", "unauthorized"),
    ]);
    assert_eq!(model.states(), &["idle", "running", "unauthorized"]);

    let report = Verifier::default().verify(&model);
    let security: Vec<&str> = report.security_warnings().collect();
    assert_eq!(security.len(), 1);
    assert!(security[0].contains("'unauthorized'"));
}

#[test]
fn test_unknown_event_does_not_move() {
    let model = build(&[t("idle", "start", "activate", "running")]);
    let steps = simulate(&model, &parse_events(&["ping", "ping"]).unwrap(), None);
    for step in &steps {
        assert_eq!(step.current_state, "idle");
        assert_eq!(step.event, "ping");
        assert_eq!(step.next_state, "idle");
        assert_eq!(step.action, NO_TRANSITION);
        assert_eq!(step.guard_evaluated, GuardOutcome::Failed);
    }
}

#[test]
fn test_states_are_exactly_the_endpoint_union() {
    let list = vec![
        t("a", "x", "", "b"),
        t("c", "y", "", "a"),
        t("b", "z", "", "b"),
    ];
    let model = build(&list);
    let mut states: Vec<&str> = model.states().iter().map(StateId::as_str).collect();
    states.sort_unstable();
    assert_eq!(states, ["a", "b", "c"]);
}

#[test]
fn test_state_without_incoming_edge_is_unreachable() {
    let model = build(&[
        t("idle", "start", "", "running"),
        t("island", "go", "", "running"),
    ]);
    let report = Verifier::default().verify(&model);
    assert!(
        report
            .unreachable_states
            .contains(&StateId::new("island").unwrap())
    );
}

#[test]
fn test_merge_is_idempotent() {
    let existing = vec![t("idle", "start", "a", "running")];
    let incoming = vec![
        t("idle", "start", "b", "elsewhere"),
        t("running", "stop", "c", "idle"),
        t("running", "stop", "d", "halted"),
    ];
    let once = merge(&existing, &incoming);
    let twice = merge(&existing, &once);
    assert_eq!(once, twice);
    assert_eq!(merge(&existing, &[]), existing);
}

#[test]
fn test_model_json_roundtrip_preserves_fields() {
    let model = build(&[
        t("idle", "start", "go", "running").with_guard("ready"),
        t("running", "error", "", "failed")
            .with_source(autostate::state_machine::TransitionSource::LlmInferred),
    ]);
    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["transitions"][1]["source"], "llm_inferred");
    assert_eq!(json["transitions"][0]["guard"], "ready");
    assert_eq!(json["metadata"]["node_count"], 3);

    let back: FsmModel = serde_json::from_value(json).unwrap();
    assert_eq!(back, model);
}
