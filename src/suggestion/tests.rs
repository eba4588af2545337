use super::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn alert(robot_id: &str) -> Alert {
    Alert {
        robot_id: robot_id.to_string(),
        alert_type: "low_battery".to_string(),
        title: "Low battery: Scout Alpha".to_string(),
        description: "Scout Alpha battery at 22%.".to_string(),
        reasoning: "Battery under 25%.".to_string(),
        severity: Severity::Warning,
        requires_ai: true,
        proposed_action: Some(ProposedAction::new("return_home", robot_id)),
        related_robot_id: None,
    }
}

fn create(store: &SuggestionStore, robot_id: &str) -> Suggestion {
    let suggestion = store.create(NewSuggestion::from_alert(&alert(robot_id)));
    // Keep creation timestamps distinct for ordering assertions
    thread::sleep(Duration::from_millis(2));
    suggestion
}

#[test]
fn test_from_alert_copies_fields() {
    let a = alert("drone-001");
    let new = NewSuggestion::from_alert(&a);

    assert_eq!(new.robot_id, a.robot_id);
    assert_eq!(new.title, a.title);
    assert_eq!(new.description, a.description);
    assert_eq!(new.reasoning, a.reasoning);
    assert_eq!(new.severity, a.severity);
    assert_eq!(new.proposed_action, a.proposed_action);
    assert_eq!(new.source, SuggestionSource::Heuristic);
    assert_eq!(new.confidence, 1.0);
}

#[test]
fn test_ai_fallback_annotates_reasoning() {
    let a = alert("drone-001");
    let new = NewSuggestion::ai_fallback(&a);

    assert_eq!(new.source, SuggestionSource::Heuristic);
    assert!(new.reasoning.starts_with(&a.reasoning));
    assert!(new.reasoning.contains("AI analysis unavailable"));
}

#[test]
fn test_create_is_pending() {
    let store = SuggestionStore::new();
    let s = create(&store, "drone-001");

    assert_eq!(s.status, SuggestionStatus::Pending);
    assert_eq!(s.id.len(), 36);
    assert_eq!(store.get(&s.id).unwrap().title, s.title);
}

#[test]
fn test_get_pending_filters_by_robot() {
    let store = SuggestionStore::new();
    create(&store, "drone-001");
    create(&store, "rover-001");
    create(&store, "drone-001");

    assert_eq!(store.get_pending(None).len(), 3);
    assert_eq!(store.get_pending(Some("drone-001")).len(), 2);
    assert_eq!(store.get_pending(Some("uuv-001")).len(), 0);
}

#[test]
fn test_get_pending_excludes_decided() {
    let store = SuggestionStore::new();
    let a = create(&store, "drone-001");
    let b = create(&store, "drone-001");
    store.approve(&a.id).unwrap();

    let pending = store.get_pending(None);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, b.id);
}

#[test]
fn test_get_all_most_recent_first_with_limit() {
    let store = SuggestionStore::new();
    let first = create(&store, "drone-001");
    let second = create(&store, "drone-001");
    let third = create(&store, "drone-001");
    store.reject(&second.id).unwrap();

    let all = store.get_all(10);
    let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);

    let limited = store.get_all(2);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, third.id);
}

#[test]
fn test_approve_twice_reports_not_pending() {
    let store = SuggestionStore::new();
    let s = create(&store, "drone-001");

    let approved = store.approve(&s.id).unwrap();
    assert_eq!(approved.status, SuggestionStatus::Approved);
    assert!(store.approve(&s.id).is_none());
    assert!(store.reject(&s.id).is_none());
    assert_eq!(store.get(&s.id).unwrap().status, SuggestionStatus::Approved);
}

#[test]
fn test_unknown_id_is_not_found() {
    let store = SuggestionStore::new();
    assert!(store.approve("missing").is_none());
    assert!(store.reject("missing").is_none());
}

#[test]
fn test_concurrent_approve_and_reject_single_winner() {
    for _ in 0..20 {
        let store = Arc::new(SuggestionStore::new());
        let id = store.create(NewSuggestion::from_alert(&alert("drone-001"))).id;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || {
                    if i % 2 == 0 {
                        store.approve(&id).is_some()
                    } else {
                        store.reject(&id).is_some()
                    }
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}

#[test]
fn test_suggestion_serializes_for_clients() {
    let store = SuggestionStore::new();
    let s = create(&store, "drone-001");
    let value = serde_json::to_value(&s).unwrap();

    assert_eq!(value["robotId"], json!("drone-001"));
    assert_eq!(value["status"], json!("pending"));
    assert_eq!(value["source"], json!("heuristic"));
    assert_eq!(value["severity"], json!("warning"));
    assert_eq!(
        value["proposedAction"],
        json!({"commandType": "return_home", "robotId": "drone-001", "parameters": {}})
    );
    assert!(value.get("createdAt").is_some());
}
