use super::fake_plane::{FakePlane, Scripted, memory_payload, strategy_payload};
use agentmem::{MemoryError, MemoryManager, ProgressReporter, WaitEvent, WaitOptions};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<WaitEvent>>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &WaitEvent) {
        self.events.lock().expect("lock").push(event.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn wait_returns_after_exactly_three_polls() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    let creating = memory_payload(
        "mem-1",
        "CREATING",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "CREATING")]),
    );
    plane.push_get(Scripted::Memory(creating.clone()));
    plane.push_get(Scripted::Memory(creating));
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "ACTIVE")]),
    )));

    let memory = manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect("third poll is ACTIVE");
    assert_eq!(memory.status_str(), Some("ACTIVE"));
    assert_eq!(plane.call_count("get_memory"), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_resource_stops_polling_immediately() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_get(Scripted::Memory(json!({
        "id": "mem-1",
        "status": "FAILED",
        "failureReason": "execution role is invalid",
    })));
    // A second response exists but must never be fetched.
    plane.push_get(Scripted::Memory(memory_payload("mem-1", "ACTIVE", json!([]))));

    let err = manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect_err("FAILED is terminal");
    match &err {
        MemoryError::ResourceFailed { reason, .. } => {
            assert!(reason.contains("execution role"), "{reason}");
        }
        other => panic!("expected ResourceFailed, got {other}"),
    }
    assert_eq!(plane.call_count("get_memory"), 1);
}

#[tokio::test(start_paused = true)]
async fn active_resource_with_failed_strategy_is_an_error() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([
            strategy_payload("strat-1", "S1", "SEMANTIC", "ACTIVE"),
            strategy_payload("strat-2", "S2", "SUMMARIZATION", "FAILED"),
        ]),
    )));

    let err = manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect_err("a dead strategy fails the wait");
    match &err {
        MemoryError::StrategiesFailed { names, .. } => {
            assert_eq!(names, &vec!["S2".to_string()]);
        }
        other => panic!("expected StrategiesFailed, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn wait_keeps_polling_while_a_strategy_is_nonterminal() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    // Resource ACTIVE but one strategy still CREATING: not done yet.
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "CREATING")]),
    )));
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "ACTIVE")]),
    )));

    manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect("second poll completes");
    assert_eq!(plane.call_count("get_memory"), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_fires_once_the_budget_elapses() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());
    plane.set_get_fallback(memory_payload("mem-1", "CREATING", json!([])));

    let err = manager
        .wait_for_memory_active(
            "mem-1",
            &WaitOptions::new(Duration::from_secs(60), Duration::from_secs(5)),
        )
        .await
        .expect_err("never leaves CREATING");
    assert!(matches!(err, MemoryError::WaitTimeout { .. }));
    let text = err.to_string();
    assert!(text.contains("60"), "{text}");
    assert!(text.contains("mem-1"), "{text}");
    // Budget is checked at the top of each iteration: polls at t=0..=55s.
    assert_eq!(plane.call_count("get_memory"), 12);
}

#[tokio::test(start_paused = true)]
async fn progress_is_reported_at_cadence_not_every_poll() {
    let plane = Arc::new(FakePlane::new());
    let reporter = Arc::new(RecordingReporter::default());
    let manager = MemoryManager::with_reporter(plane.clone(), reporter.clone());

    plane.set_get_fallback(memory_payload("mem-1", "CREATING", json!([])));
    let err = manager
        .wait_for_memory_active(
            "mem-1",
            &WaitOptions::new(Duration::from_secs(60), Duration::from_secs(2)),
        )
        .await
        .expect_err("times out");
    assert!(matches!(err, MemoryError::WaitTimeout { .. }));

    let events = reporter.events.lock().expect("lock");
    let polls = plane.call_count("get_memory");
    assert!(!events.is_empty());
    // 30 polls over 60s at a ~10s reporting cadence: far fewer reports.
    assert!(events.len() < polls, "{} events / {polls} polls", events.len());
    assert!(events
        .iter()
        .all(|e| matches!(e, WaitEvent::Polling { .. })));
}

#[tokio::test(start_paused = true)]
async fn default_tracing_reporter_handles_a_full_wait() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "CREATING",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "CREATING")]),
    )));
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "S1", "SEMANTIC", "ACTIVE")]),
    )));

    let memory = manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect("wait with the default reporter");
    assert_eq!(memory.status_str(), Some("ACTIVE"));
}

#[tokio::test(start_paused = true)]
async fn successful_wait_emits_a_ready_event() {
    let plane = Arc::new(FakePlane::new());
    let reporter = Arc::new(RecordingReporter::default());
    let manager = MemoryManager::with_reporter(plane.clone(), reporter.clone());

    plane.push_get(Scripted::Memory(memory_payload("mem-1", "ACTIVE", json!([]))));
    manager
        .wait_for_memory_active("mem-1", &WaitOptions::default())
        .await
        .expect("immediately active");

    let events = reporter.events.lock().expect("lock");
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], WaitEvent::Ready { .. }));
}
