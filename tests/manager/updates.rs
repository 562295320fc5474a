use super::fake_plane::{FakePlane, Scripted, memory_payload, strategy_payload};
use agentmem::{
    ConsolidationConfig, ExtractionConfig, MemoryError, MemoryManager, StrategyUpdates,
    SummaryStrategy,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn zero_operation_update_is_rejected_before_any_remote_call() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    let err = manager
        .update_memory_strategies("mem-1", &StrategyUpdates::new())
        .await
        .expect_err("no-op updates are a contract violation");
    assert!(matches!(err, MemoryError::Validation(_)));
    assert!(plane.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn add_strategy_sends_the_wire_dict_under_add_mutations() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());
    plane.push_update(Scripted::Memory(memory_payload("mem-1", "CREATING", json!([]))));

    manager
        .add_strategy("mem-1", SummaryStrategy::new("recap"))
        .await
        .expect("add");

    let inputs = plane.update_inputs.lock().expect("lock");
    let body = &inputs[0];
    assert_eq!(body["memoryId"], "mem-1");
    assert_eq!(
        body["memoryStrategies"]["addMemoryStrategies"][0]["summaryMemoryStrategy"]["name"],
        "recap"
    );
    assert!(body["memoryStrategies"].get("modifyMemoryStrategies").is_none());
    assert!(!body["clientToken"].as_str().expect("token").is_empty());
}

#[tokio::test]
async fn add_custom_semantic_strategy_builds_the_override_configuration() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());
    plane.push_update(Scripted::Memory(memory_payload("mem-1", "CREATING", json!([]))));

    manager
        .add_custom_semantic_strategy(
            "mem-1",
            "facts",
            ExtractionConfig::new().append_to_prompt("extract"),
            ConsolidationConfig::new().append_to_prompt("merge"),
            Some("custom extraction"),
            Some(vec!["facts/{actorId}".into()]),
        )
        .await
        .expect("add custom");

    let inputs = plane.update_inputs.lock().expect("lock");
    let added = &inputs[0]["memoryStrategies"]["addMemoryStrategies"][0]["customMemoryStrategy"];
    assert_eq!(added["name"], "facts");
    assert_eq!(added["description"], "custom extraction");
    assert_eq!(added["namespaces"][0], "facts/{actorId}");
    assert_eq!(
        added["configuration"]["semanticOverride"]["extraction"]["appendToPrompt"],
        "extract"
    );
}

#[tokio::test]
async fn modify_resolves_type_from_current_strategies_and_rewraps() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    // The manager fetches current strategies to resolve the id's type.
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "facts", "SEMANTIC", "ACTIVE")]),
    )));
    plane.push_update(Scripted::Memory(memory_payload("mem-1", "UPDATING", json!([]))));

    manager
        .modify_strategy(
            "mem-1",
            "strat-1",
            json!({"configuration": {"consolidation": {"triggerEveryNMessages": 7}}}),
        )
        .await
        .expect("modify");

    assert_eq!(plane.call_count("get_memory"), 1);
    let inputs = plane.update_inputs.lock().expect("lock");
    let modified = &inputs[0]["memoryStrategies"]["modifyMemoryStrategies"][0];
    assert_eq!(modified["memoryStrategyId"], "strat-1");
    assert_eq!(
        modified["configuration"]["consolidation"]["semanticConsolidationConfiguration"]
            ["triggerEveryNMessages"],
        7
    );
}

#[tokio::test]
async fn modify_with_unknown_strategy_id_fails_without_updating() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "facts", "SEMANTIC", "ACTIVE")]),
    )));

    let err = manager
        .modify_strategy("mem-1", "strat-404", json!({"description": "x"}))
        .await
        .expect_err("unknown id");
    assert!(matches!(err, MemoryError::Validation(_)));
    assert_eq!(plane.call_count("update_memory"), 0);
}

#[tokio::test]
async fn delete_strategy_wraps_the_id() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());
    plane.push_update(Scripted::Memory(memory_payload("mem-1", "CREATING", json!([]))));

    manager
        .delete_strategy("mem-1", "strat-1")
        .await
        .expect("delete strategy");

    let inputs = plane.update_inputs.lock().expect("lock");
    assert_eq!(
        inputs[0]["memoryStrategies"]["deleteMemoryStrategies"][0]["memoryStrategyId"],
        "strat-1"
    );
    // Deleting needs no type resolution, so no read happens first.
    assert_eq!(plane.call_count("get_memory"), 0);
}

#[tokio::test(start_paused = true)]
async fn update_and_wait_polls_after_the_mutation() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_update(Scripted::Memory(memory_payload("mem-1", "CREATING", json!([]))));
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "CREATING",
        json!([strategy_payload("strat-1", "recap", "SUMMARIZATION", "CREATING")]),
    )));
    plane.push_get(Scripted::Memory(memory_payload(
        "mem-1",
        "ACTIVE",
        json!([strategy_payload("strat-1", "recap", "SUMMARIZATION", "ACTIVE")]),
    )));

    let memory = manager
        .update_memory_strategies_and_wait(
            "mem-1",
            &StrategyUpdates::new().add(SummaryStrategy::new("recap")),
            &agentmem::WaitOptions::default(),
        )
        .await
        .expect("mutation settles back to ACTIVE");
    assert_eq!(memory.status_str(), Some("ACTIVE"));
}
