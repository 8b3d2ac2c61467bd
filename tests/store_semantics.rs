// tests/store_semantics.rs
use chrono::{Duration, Utc};
use jobscout::model::NotificationState;
use jobscout::store::{InsertOutcome, RecordStore};
use jobscout::RawPosting;

fn raw(id: &str, title: &str) -> RawPosting {
    RawPosting {
        external_id: id.to_string(),
        title: title.to_string(),
        location: Some("Toronto, ON".to_string()),
        description: None,
        posted_at: None,
        url: Some(format!("https://careers.example.com/{id}")),
    }
}

#[tokio::test]
async fn insert_if_absent_is_idempotent() {
    let store = RecordStore::in_memory().await.unwrap();
    let now = Utc::now();

    let first = store
        .insert_if_absent("acme", &raw("123", "Backend Engineer"), now)
        .await
        .unwrap();
    assert_eq!(first, InsertOutcome::Inserted);

    // Second observation, later, with a different title: no-op, not an update.
    let second = store
        .insert_if_absent(
            "acme",
            &raw("123", "Backend Engineer (retitled)"),
            now + Duration::hours(2),
        )
        .await
        .unwrap();
    assert_eq!(second, InsertOutcome::AlreadyPresent);

    let stored = store.get("acme", "123").await.unwrap().unwrap();
    assert_eq!(stored.title, "Backend Engineer");
    assert_eq!(stored.notification_state, NotificationState::Pending);
    assert!(stored.notified_at.is_none());
}

#[tokio::test]
async fn discovered_at_is_set_once_and_never_revised() {
    let store = RecordStore::in_memory().await.unwrap();
    let t0 = Utc::now();

    store
        .insert_if_absent("acme", &raw("123", "Backend Engineer"), t0)
        .await
        .unwrap();
    let first = store.get("acme", "123").await.unwrap().unwrap();

    store
        .insert_if_absent("acme", &raw("123", "Backend Engineer"), t0 + Duration::days(1))
        .await
        .unwrap();
    let second = store.get("acme", "123").await.unwrap().unwrap();

    assert_eq!(first.discovered_at, second.discovered_at);
}

#[tokio::test]
async fn same_external_id_under_different_sources_is_two_rows() {
    let store = RecordStore::in_memory().await.unwrap();
    let now = Utc::now();

    let a = store
        .insert_if_absent("acme", &raw("123", "Backend Engineer"), now)
        .await
        .unwrap();
    let b = store
        .insert_if_absent("globex", &raw("123", "Backend Engineer"), now)
        .await
        .unwrap();
    assert_eq!(a, InsertOutcome::Inserted);
    assert_eq!(b, InsertOutcome::Inserted);
    assert!(store.exists("acme", "123").await.unwrap());
    assert!(store.exists("globex", "123").await.unwrap());
}

#[tokio::test]
async fn pending_since_honors_window_and_state() {
    let store = RecordStore::in_memory().await.unwrap();
    let t0 = Utc::now();
    let t1 = t0 + Duration::hours(1);

    store
        .insert_if_absent("acme", &raw("old", "Old Posting"), t0 - Duration::days(2))
        .await
        .unwrap();
    store
        .insert_if_absent("acme", &raw("a", "Posting A"), t0)
        .await
        .unwrap();
    store
        .insert_if_absent("acme", &raw("b", "Posting B"), t1)
        .await
        .unwrap();

    let pending = store.pending_since(t0).await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|p| p.external_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    store
        .mark_sent(&[("acme".to_string(), "a".to_string())], Utc::now())
        .await
        .unwrap();
    let pending = store.pending_since(t0).await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|p| p.external_id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[tokio::test]
async fn mark_sent_is_idempotent_and_counts_transitions() {
    let store = RecordStore::in_memory().await.unwrap();
    let now = Utc::now();
    store
        .insert_if_absent("acme", &raw("123", "Backend Engineer"), now)
        .await
        .unwrap();

    let keys = vec![
        ("acme".to_string(), "123".to_string()),
        ("acme".to_string(), "does-not-exist".to_string()),
    ];
    let first = store.mark_sent(&keys, now).await.unwrap();
    assert_eq!(first, 1);
    let after_first = store.get("acme", "123").await.unwrap().unwrap();
    assert_eq!(after_first.notification_state, NotificationState::Sent);
    assert!(after_first.notified_at.is_some());

    let second = store.mark_sent(&keys, now + Duration::minutes(5)).await.unwrap();
    assert_eq!(second, 0);

    // The re-mark was a no-op: notified_at still reflects the first call.
    let after_second = store.get("acme", "123").await.unwrap().unwrap();
    assert_eq!(after_second.notified_at, after_first.notified_at);
}
