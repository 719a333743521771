use std::collections::BTreeMap;
use std::fs;

use chrono::{TimeZone, Utc};
use touchpoint_core::{Session, SyntheticData};
use touchpoint_ingest::{
    load_sessions, load_spend, write_dataset, write_json, IngestError, SESSIONS_FILE,
};

fn sample_sessions() -> Vec<Session> {
    let t = Utc.with_ymd_and_hms(2024, 2, 10, 8, 30, 0).unwrap();
    vec![
        Session {
            session_id: "sess_000001".to_string(),
            user_id: "user_0001".to_string(),
            timestamp: t,
            referrer: "https://guard.io/?utm_source=google&utm_campaign=lead_gen".to_string(),
            activated: false,
            device_type: Some("desktop".to_string()),
        },
        Session {
            session_id: "sess_000002".to_string(),
            user_id: "user_0001".to_string(),
            timestamp: t + chrono::Duration::days(2),
            referrer: "https://guard.io/".to_string(),
            activated: true,
            device_type: None,
        },
    ]
}

#[test]
fn test_dataset_written_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let data = SyntheticData {
        sessions: sample_sessions(),
        campaign_spend: vec![],
    };

    let (sessions_path, spend_path) = write_dataset(&dir.path().join("out"), &data).unwrap();

    assert!(sessions_path.ends_with(SESSIONS_FILE));
    assert_eq!(load_sessions(&sessions_path).unwrap(), data.sessions);
    assert!(load_spend(&spend_path).unwrap().is_empty());
}

#[test]
fn test_jsonl_with_legacy_fields_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.jsonl");
    fs::write(
        &path,
        concat!(
            r#"{"session_id":"sess_000010","user_id":"user_0002","session_start_time":"2024-02-01T00:00:00Z","referrer_url":"https://guard.io/","is_activated":0}"#,
            "\n\n",
            r#"{"session_id":"sess_000011","user_id":"user_0002","timestamp":"2024-02-02T00:00:00Z","referrer":"https://guard.io/","activated":true}"#,
            "\n"
        ),
    )
    .unwrap();

    let sessions = load_sessions(&path).unwrap();

    assert_eq!(sessions.len(), 2);
    assert!(!sessions[0].activated);
    assert!(sessions[1].activated);
}

#[test]
fn test_jsonl_bad_line_reports_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.jsonl");
    fs::write(
        &path,
        "{\"session_id\":\"a\",\"user_id\":\"u\",\"timestamp\":\"2024-02-01T00:00:00Z\"}\nnot json\n",
    )
    .unwrap();

    let err = load_sessions(&path).unwrap_err();

    match err {
        IngestError::Json { line, .. } => assert_eq!(line, Some(2)),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_sessions(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}

#[test]
fn test_spend_loads_from_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spend.json");
    fs::write(
        &path,
        r#"[{"date":"2024-02-01","source":"google","campaign_id":"lead_gen","adset_id":"adset_0","ad_id":"ad_0_1","spend":125.5}]"#,
    )
    .unwrap();

    let rows = load_spend(&path).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ad_id, "ad_0_1");
    assert!(rows[0].campaign_name.is_empty());
    assert!((rows[0].spend - 125.5).abs() < f64::EPSILON);
}

#[test]
fn test_unserializable_output_is_serialize_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let mut by_pair = BTreeMap::new();
    by_pair.insert((1u8, 2u8), "tuple keys are not valid JSON object keys");

    let err = write_json(&path, &by_pair).unwrap_err();

    assert!(matches!(err, IngestError::Serialize { .. }));
    let msg = err.to_string();
    assert!(msg.starts_with("Failed to serialize output for"));
    assert!(!msg.contains("Invalid JSON"));
}
