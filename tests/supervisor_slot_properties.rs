//! Property-based tests for the supervisor's single build slot
//!
//! **Property 3: At most one session runs at a time**
//! For any sequence of start, cancel and dispatch calls on a real supervisor,
//! `is_running()` holds exactly when there is an active session, that session
//! is the current one and it is running. A start while busy is rejected with
//! `AlreadyRunning` naming the active session and leaves the session alone.

#![cfg(unix)]

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use relief_process::{
    BuildSupervisor, BuildTarget, ProcessError, SessionId, SessionStatus, SupervisorConfig,
};

#[derive(Debug, Clone)]
enum Op {
    Start { slow: bool },
    Cancel { stale: bool },
    PumpPending,
    Settle,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<bool>().prop_map(|slow| Op::Start { slow }),
        2 => any::<bool>().prop_map(|stale| Op::Cancel { stale }),
        2 => Just(Op::PumpPending),
        1 => Just(Op::Settle),
    ]
}

fn target(slow: bool) -> BuildTarget {
    let script = if slow { "echo begin; sleep 0.2; echo end" } else { "echo quick" };
    BuildTarget::new("make", "sh").args(["-c", script])
}

fn check_slot(supervisor: &BuildSupervisor) -> Result<(), TestCaseError> {
    let active = supervisor.active_session();
    prop_assert_eq!(supervisor.is_running(), active.is_some());
    if let Some(active) = active {
        let session = supervisor.session();
        prop_assert_eq!(session.map(|s| s.id()), Some(active));
        prop_assert_eq!(session.map(|s| s.status()), Some(SessionStatus::Running));
    }
    Ok(())
}

async fn run_ops(ops: &[Op]) -> Result<(), TestCaseError> {
    let dir = std::env::temp_dir();
    let env = HashMap::new();
    let config = SupervisorConfig::default().with_cancel_grace(Duration::from_millis(200));
    let mut supervisor = BuildSupervisor::new(config);

    for op in ops {
        match op {
            Op::Start { slow } => {
                let before = supervisor.active_session();
                let previous = supervisor.session().map(|s| s.id());
                match supervisor.start(&target(*slow), &env, &dir) {
                    Ok(id) => {
                        prop_assert!(before.is_none(), "started {} while {:?} was active", id, before);
                        prop_assert!(previous.map_or(true, |p| p < id));
                    }
                    Err(ProcessError::AlreadyRunning { active }) => {
                        prop_assert_eq!(Some(active), before);
                        prop_assert_eq!(supervisor.session().map(|s| s.id()), previous);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error {e}"))),
                }
            }
            Op::Cancel { stale } => {
                let id = match (supervisor.active_session(), stale) {
                    (Some(active), false) => active,
                    (Some(active), true) => SessionId::from(active.get() + 100),
                    (None, _) => SessionId::from(1),
                };
                let issued = supervisor.cancel(id);
                if *stale || supervisor.active_session() != Some(id) {
                    prop_assert!(!issued);
                }
            }
            Op::PumpPending => {
                supervisor.pump_pending();
            }
            Op::Settle => {
                tokio::time::sleep(Duration::from_millis(30)).await;
                supervisor.pump_pending();
            }
        }
        check_slot(&supervisor)?;
    }

    if let Some(active) = supervisor.active_session() {
        supervisor.cancel(active);
        let outcome = tokio::time::timeout(Duration::from_secs(10), supervisor.wait())
            .await
            .map_err(|_| TestCaseError::fail("build did not finish after cancel"))?;
        prop_assert_eq!(outcome.map(|o| o.session), Some(active));
    }
    check_slot(&supervisor)?;
    prop_assert!(!supervisor.is_running());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_single_session_runs(ops in prop::collection::vec(op_strategy(), 1..16)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_ops(&ops))?;
    }
}
