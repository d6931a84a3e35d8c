use super::*;
use crate::event::{EventKind, RecordingSink};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn record(uid: i64) -> Value {
    json!({
        "uid": uid,
        "targets": [
            {
                "id": uid * 100,
                "platform": { "name": "QQ/StarBot", "account": 10001 },
                "live_on": { "enabled": true, "message": "{uname} live" }
            }
        ]
    })
}

#[test]
fn test_single_object_is_one_record() {
    let streamers = parse_records(into_records(record(1)).unwrap()).unwrap();
    assert_eq!(streamers.len(), 1);
    assert_eq!(streamers[0].uid, 1);
    assert!(streamers[0].needs_connection());
}

#[test]
fn test_array_of_records() {
    let streamers = parse_str(&json!([record(1), record(2)]).to_string()).unwrap();
    let uids: Vec<i64> = streamers.iter().map(|s| s.uid).collect();
    assert_eq!(uids, vec![1, 2]);
}

#[test]
fn test_scalar_document_rejected() {
    let err = parse_str("42").unwrap_err();
    assert!(matches!(err, SourceError::UnexpectedShape { found: "a number" }));
}

#[test]
fn test_malformed_json() {
    let err = parse_str("[{\"uid\": 1,").unwrap_err();
    assert!(matches!(err, SourceError::Malformed(_)));
    assert_eq!(err.kind(), "malformed");
}

#[test]
fn test_missing_field_aborts_whole_load() {
    let bad = json!({ "uid": 2 });
    let err = parse_records(vec![record(1), bad, record(3)]).unwrap_err();

    match err {
        SourceError::Validation { index, field, .. } => {
            assert_eq!(index, 1);
            assert_eq!(field.as_deref(), Some("targets"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_nested_missing_field_is_named() {
    let bad = json!({ "uid": 1, "targets": [ { "id": 5 } ] });
    let err = parse_records(vec![bad]).unwrap_err();
    assert!(err.to_string().contains("on field 'platform'"));
}

#[test]
fn test_type_error_names_field() {
    let err = parse_records(vec![json!({ "uid": "abc", "targets": [] })]).unwrap_err();

    match &err {
        SourceError::Validation { index, field, message } => {
            assert_eq!(*index, 0);
            assert_eq!(field.as_deref(), Some("uid"));
            assert!(message.starts_with("uid: invalid type"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("on field 'uid'"));
}

#[test]
fn test_nested_type_error_names_field_and_path() {
    let mut bad = record(4);
    bad["targets"][0]["live_on"]["enabled"] = json!("yes");
    let err = parse_records(vec![record(1), bad]).unwrap_err();

    match err {
        SourceError::Validation { index, field, message } => {
            assert_eq!(index, 1);
            assert_eq!(field.as_deref(), Some("enabled"));
            assert!(message.starts_with("targets[0].live_on.enabled:"));
            assert!(message.contains("expected a boolean"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_wrong_type_has_no_field() {
    let err = parse_records(vec![json!(5)]).unwrap_err();
    assert!(matches!(err, SourceError::Validation { index: 0, field: None, .. }));
}

#[test]
fn test_empty_platform_name_fails_validation() {
    let bad = json!({
        "uid": 1,
        "targets": [ { "id": 5, "platform": { "name": "", "account": 1 } } ]
    });
    let err = parse_records(vec![bad]).unwrap_err();
    assert!(matches!(
        err,
        SourceError::Validation { field: Some(ref f), .. } if f == "name"
    ));
}

#[test]
fn test_static_loader_is_repeatable() {
    let mut loader = StaticLoader::new(json!([record(1), record(2)]));
    assert_eq!(loader.load().unwrap().len(), 2);
    assert_eq!(loader.load().unwrap().len(), 2);
}

#[test]
fn test_file_loader_records_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamers.json");
    let content = json!([record(1)]).to_string();
    fs::write(&path, &content).unwrap();

    let mut loader = FileLoader::new(&path);
    assert!(loader.last_modified().is_none());

    let streamers = loader.load().unwrap();
    assert_eq!(streamers.len(), 1);
    assert_eq!(loader.last_modified(), Some(loader.modified().unwrap()));
    assert!(loader.is_last_content(&content));
}

#[test]
fn test_file_loader_missing_file() {
    let dir = TempDir::new().unwrap();
    let mut loader = FileLoader::new(dir.path().join("absent.json"));

    let err = loader.load().unwrap_err();
    assert!(matches!(err, SourceError::FileNotFound { .. }));
    assert!(loader.last_modified().is_none());
}

#[test]
fn test_file_loader_bad_encoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.json");
    fs::write(&path, [b'[', 0xff, 0xfe, b']']).unwrap();

    let err = FileLoader::new(&path).load().unwrap_err();
    assert!(matches!(err, SourceError::Encoding { .. }));
}

#[test]
fn test_file_loader_failed_parse_keeps_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamers.json");
    fs::write(&path, "not json").unwrap();

    let mut loader = FileLoader::new(&path);
    assert!(loader.load().is_err());
    assert!(loader.last_modified().is_none());
    assert!(!loader.is_last_content("not json"));
}

#[tokio::test]
async fn test_inline_data_source_load_is_idempotent() {
    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_value(json!([record(1), record(2)]), sink.clone());

    let report = source.load().await.unwrap();
    assert_eq!(report.added, vec![1, 2]);
    assert!(!source.is_watching());

    let report = source.load().await.unwrap();
    assert!(report.is_noop());
    assert_eq!(source.registry().len(), 2);
    assert_eq!(sink.events().len(), 2);
    assert!(sink.kinds().iter().all(|(kind, _)| *kind == EventKind::Added));
}

#[tokio::test]
async fn test_duplicate_in_source_fails_startup() {
    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_value(json!([record(1), record(1)]), sink.clone());

    let err = source.load().await.unwrap_err();
    assert_eq!(err.kind(), "duplicate");
    assert!(source.registry().is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_file_data_source_without_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamers.json");
    fs::write(&path, json!(record(7)).to_string()).unwrap();

    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_file(&path, sink, false, Duration::from_millis(10));

    let report = source.load().await.unwrap();
    assert_eq!(report.added, vec![7]);
    assert!(!source.is_watching());
}

#[tokio::test]
async fn test_file_data_source_starts_and_stops_watcher() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamers.json");
    fs::write(&path, json!([record(1)]).to_string()).unwrap();

    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_file(&path, sink, true, Duration::from_millis(10));

    source.load().await.unwrap();
    assert!(source.is_watching());

    // Second load must not start another watcher
    assert!(source.load().await.unwrap().is_noop());

    source.shutdown().await;
    assert!(!source.is_watching());
}

#[tokio::test]
async fn test_file_data_source_zero_interval_keeps_watching() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("streamers.json");
    fs::write(&path, json!([record(1)]).to_string()).unwrap();

    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_file(&path, sink, true, Duration::ZERO);

    source.load().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(source.is_watching());

    source.shutdown().await;
}

#[tokio::test]
async fn test_file_data_source_missing_file_fails_startup() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::new());
    let mut source = DataSource::from_file(
        dir.path().join("absent.json"),
        sink,
        true,
        Duration::from_millis(10),
    );

    let err = source.load().await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert!(!source.is_watching());
}
