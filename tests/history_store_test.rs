//! ファイル永続化つき履歴ストアの統合テスト

use chrono::{TimeZone, Utc};
use fracture_assist::storage::FileStorage;
use fracture_assist_common::{
    HistoryItem, HistoryQuery, HistoryStore, Severity, SortOrder, Status, StatusFilter,
    StorageProvider, HISTORY_STORAGE_KEY,
};
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::tempdir;

fn item(id: &str, name: &str, millis: i64, status: Status) -> HistoryItem {
    HistoryItem {
        id: id.to_string(),
        patient_id: format!("P-2025-{}", id),
        patient_name: name.to_string(),
        body_region: "Tíbia".to_string(),
        fracture_type: None,
        fracture_location: None,
        image_url: Some("data:image/png;base64,AAAA".to_string()),
        timestamp: Utc.timestamp_millis_opt(millis).unwrap(),
        status,
        confidence: if status == Status::Success { Some(90) } else { None },
        severity: Some(Severity::Medium),
        detections: None,
        file_name: None,
    }
}

#[test]
fn test_history_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");

    {
        let mut store = HistoryStore::load(FileStorage::open(&path).unwrap());
        store.add_detection(item("1", "Ana", 1_000, Status::Success)).unwrap();
        store.add_detection(item("2", "Bruno", 2_000, Status::Failed)).unwrap();
    }

    let store = HistoryStore::load(FileStorage::open(&path).unwrap());
    let ids: Vec<&str> = store.get_all().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(store.get_all()[1].timestamp.timestamp_millis(), 1_000);
    assert_eq!(store.get_all()[0].confidence, None);
}

#[test]
fn test_delete_notifies_and_persists() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");

    let mut store = HistoryStore::load(FileStorage::open(&path).unwrap());
    for (id, millis) in [("x", 1), ("y", 2), ("z", 3)] {
        store.add_detection(item(id, "Carla", millis, Status::Success)).unwrap();
    }

    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.subscribe(move |items| {
        sink.borrow_mut().push(items.iter().map(|i| i.id.clone()).collect());
    });

    assert!(store.delete_item("y").unwrap());
    assert!(!store.delete_item("missing").unwrap());

    // 購読直後の1回 + 削除の1回（存在しないIDの削除は通知しない）
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], vec!["z", "x"]);

    let reopened = HistoryStore::load(FileStorage::open(&path).unwrap());
    let ids: Vec<&str> = reopened.get_all().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["z", "x"]);
}

#[test]
fn test_clear_removes_storage_entry() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");

    let mut store = HistoryStore::load(FileStorage::open(&path).unwrap());
    store.add_detection(item("1", "Ana", 1, Status::Success)).unwrap();
    store.clear_all().unwrap();
    store.clear_all().unwrap();

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get_item(HISTORY_STORAGE_KEY).unwrap(), None);
    assert!(HistoryStore::load(storage).is_empty());
}

#[test]
fn test_corrupt_history_entry_starts_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("storage.json");
    std::fs::write(&path, r#"{"detection_history": "[{\"broken\": true}]"}"#).unwrap();

    let mut store = HistoryStore::load(FileStorage::open(&path).unwrap());
    assert!(store.is_empty());

    // 次の書き込みで正常なデータに置き換わる
    store.add_detection(item("1", "Ana", 1, Status::Success)).unwrap();
    let reopened = HistoryStore::load(FileStorage::open(&path).unwrap());
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_query_over_persisted_history() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = HistoryStore::load(FileStorage::open(dir.path().join("storage.json")).unwrap());
    store.add_detection(item("1", "bruno", 1_000, Status::Success)).unwrap();
    store.add_detection(item("2", "Ana", 2_000, Status::Failed)).unwrap();
    store.add_detection(item("3", "Carla", 3_000, Status::Success)).unwrap();

    let query = HistoryQuery {
        status: StatusFilter::Success,
        search: String::new(),
        sort: SortOrder::Title,
    };
    let names: Vec<&str> = query
        .apply(store.get_all())
        .iter()
        .map(|i| i.patient_name.as_str())
        .collect();
    assert_eq!(names, vec!["bruno", "Carla"]);

    let search = HistoryQuery {
        search: "p-2025-2".to_string(),
        ..Default::default()
    };
    assert_eq!(search.apply(store.get_all()).len(), 1);
}
