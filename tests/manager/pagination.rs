use super::fake_plane::FakePlane;
use agentmem::MemoryManager;
use agentmem::client::ListMemoriesPage;
use serde_json::json;
use std::sync::Arc;

fn summaries(range: std::ops::Range<usize>) -> Vec<serde_json::Value> {
    range
        .map(|i| json!({"id": format!("mem-{i}"), "status": "ACTIVE"}))
        .collect()
}

#[tokio::test]
async fn lists_150_memories_in_exactly_two_requests() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_list_page(ListMemoriesPage {
        memories: summaries(0..100),
        next_token: Some("page-2".into()),
    });
    plane.push_list_page(ListMemoriesPage {
        memories: summaries(100..150),
        next_token: None,
    });

    let listed = manager.list_memories(150).await.expect("list");
    assert_eq!(listed.len(), 150);

    let requests = plane.list_requests.lock().expect("lock");
    assert_eq!(
        *requests,
        vec![(100, None), (50, Some("page-2".to_string()))]
    );

    // Service order is preserved across pages.
    assert_eq!(listed[0].id(), Some("mem-0"));
    assert_eq!(listed[99].id(), Some("mem-99"));
    assert_eq!(listed[149].id(), Some("mem-149"));
}

#[tokio::test]
async fn stops_early_when_the_service_has_fewer_results() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_list_page(ListMemoriesPage {
        memories: summaries(0..7),
        next_token: None,
    });

    let listed = manager.list_memories(150).await.expect("list");
    assert_eq!(listed.len(), 7);
    assert_eq!(plane.call_count("list_memories"), 1);
}

#[tokio::test]
async fn stops_requesting_once_max_results_is_satisfied() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    // The service hands back a token even though the caller is satisfied.
    plane.push_list_page(ListMemoriesPage {
        memories: summaries(0..50),
        next_token: Some("more".into()),
    });

    let listed = manager.list_memories(50).await.expect("list");
    assert_eq!(listed.len(), 50);
    assert_eq!(plane.call_count("list_memories"), 1);
}

#[tokio::test]
async fn both_id_spellings_are_present_on_every_summary() {
    let plane = Arc::new(FakePlane::new());
    let manager = MemoryManager::new(plane.clone());

    plane.push_list_page(ListMemoriesPage {
        memories: vec![
            json!({"id": "mem-a", "status": "ACTIVE"}),
            json!({"memoryId": "mem-b", "status": "ACTIVE"}),
        ],
        next_token: None,
    });

    let listed = manager.list_memories(10).await.expect("list");
    for summary in &listed {
        assert!(summary.get("id").is_some());
        assert!(summary.get("memoryId").is_some());
    }
    assert_eq!(listed[1].id(), Some("mem-b"));
}
