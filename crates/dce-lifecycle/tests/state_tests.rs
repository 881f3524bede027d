use dce_lifecycle::state_machine::{allowed_transitions, validate_transition, LifecycleState};
use proptest::prelude::*;

#[test]
fn test_draft_ready_transitions() {
    assert!(validate_transition(LifecycleState::DraftReady, LifecycleState::Testing).is_ok());
    assert!(validate_transition(LifecycleState::DraftReady, LifecycleState::Saved).is_ok());
    assert!(validate_transition(LifecycleState::DraftReady, LifecycleState::Previewing).is_ok());

    // Invalid
    assert!(validate_transition(LifecycleState::DraftReady, LifecycleState::Outdated).is_err());
    assert!(validate_transition(LifecycleState::DraftReady, LifecycleState::DraftReady).is_err());
}

#[test]
fn test_terminal_states_only_reset() {
    assert_eq!(allowed_transitions(LifecycleState::Saved), vec![LifecycleState::Idle]);
    assert_eq!(allowed_transitions(LifecycleState::Error), vec![LifecycleState::Idle]);

    assert!(validate_transition(LifecycleState::Error, LifecycleState::DraftReady).is_err());
    assert!(validate_transition(LifecycleState::Saved, LifecycleState::Testing).is_err());
}

#[test]
fn test_outdated_can_reapply() {
    assert!(validate_transition(LifecycleState::Applied, LifecycleState::Outdated).is_ok());
    assert!(validate_transition(LifecycleState::Outdated, LifecycleState::Applied).is_ok());
    assert!(validate_transition(LifecycleState::Outdated, LifecycleState::Saved).is_err());
}

#[test]
fn test_only_draft_ready_enters_testing() {
    for from in LifecycleState::ALL {
        let ok = validate_transition(from, LifecycleState::Testing).is_ok();
        assert_eq!(ok, from == LifecycleState::DraftReady, "{from}");
    }
}

fn any_state() -> impl Strategy<Value = LifecycleState> {
    prop_oneof![
        Just(LifecycleState::Idle),
        Just(LifecycleState::DraftReady),
        Just(LifecycleState::Previewing),
        Just(LifecycleState::Testing),
        Just(LifecycleState::Applied),
        Just(LifecycleState::Saved),
        Just(LifecycleState::Outdated),
        Just(LifecycleState::Error),
    ]
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_state(), to in any_state()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_idle_reachable_from_everywhere(from in any_state()) {
        prop_assert!(validate_transition(from, LifecycleState::Idle).is_ok());
    }

    #[test]
    fn prop_random_walk_stays_legal(steps in prop::collection::vec(0usize..8, 0..40)) {
        let mut state = LifecycleState::Idle;
        for step in steps {
            let options = allowed_transitions(state);
            let next = options[step % options.len()];
            prop_assert!(validate_transition(state, next).is_ok());
            state = next;
        }
    }
}
