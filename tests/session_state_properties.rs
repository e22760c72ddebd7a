//! Property-based tests for the build session state machine
//!
//! **Property 1: Terminal states are absorbing**
//! Once a session reaches succeeded, failed or cancelled, no operation changes
//! its status, exit code or captured output.
//!
//! **Property 2: Only pending -> running -> terminal is reachable**

use proptest::prelude::*;
use relief_process::{BuildSession, BuildTarget, SessionId, SessionStatus};

#[derive(Debug, Clone)]
enum Op {
    Start,
    Output(String),
    Finish(SessionStatus, Option<i32>),
}

fn status_strategy() -> impl Strategy<Value = SessionStatus> {
    prop_oneof![
        Just(SessionStatus::Pending),
        Just(SessionStatus::Running),
        Just(SessionStatus::Succeeded),
        Just(SessionStatus::Failed),
        Just(SessionStatus::Cancelled),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        "[a-z ]{0,12}\n".prop_map(Op::Output),
        (status_strategy(), proptest::option::of(-2i32..3)).prop_map(|(s, c)| Op::Finish(s, c)),
    ]
}

fn new_session() -> BuildSession {
    BuildSession::new(SessionId::from(1), BuildTarget::make("make", "relief"))
}

fn apply(session: &mut BuildSession, op: &Op) -> bool {
    match op {
        Op::Start => session.mark_running(Some(42)),
        Op::Output(text) => session.append_output(text),
        Op::Finish(status, code) => session.finish(*status, *code),
    }
}

proptest! {
    #[test]
    fn prop_terminal_states_are_absorbing(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut session = new_session();
        let mut frozen: Option<(SessionStatus, Option<i32>, String)> = None;

        for op in &ops {
            let changed = apply(&mut session, op);
            if let Some((status, code, output)) = &frozen {
                prop_assert!(!changed, "terminal session accepted {:?}", op);
                prop_assert_eq!(session.status(), *status);
                prop_assert_eq!(session.exit_code(), *code);
                prop_assert_eq!(session.output(), output.as_str());
            } else if session.status().is_terminal() {
                frozen = Some((session.status(), session.exit_code(), session.output().to_string()));
            }
        }
    }

    #[test]
    fn prop_transitions_follow_lifecycle(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut session = new_session();
        for op in &ops {
            let before = session.status();
            apply(&mut session, op);
            let after = session.status();
            let allowed = before == after
                || (before == SessionStatus::Pending && after == SessionStatus::Running)
                || (before == SessionStatus::Running && after.is_terminal());
            prop_assert!(allowed, "{:?} -> {:?} via {:?}", before, after, op);
        }
    }

    #[test]
    fn prop_output_tail_is_suffix(lines in prop::collection::vec("[a-z]{1,8}", 1..30), n in 0usize..40) {
        let mut session = new_session();
        session.mark_running(None);
        for line in &lines {
            session.append_output(&format!("{line}\n"));
        }
        let tail = session.output_tail(n);
        let expected = lines[lines.len().saturating_sub(n)..].join("\n");
        prop_assert_eq!(tail.trim_end_matches('\n'), expected.as_str());
    }
}
