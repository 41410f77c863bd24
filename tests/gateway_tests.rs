use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use vitalrs::error::GatewayError;
use vitalrs::export::{self, ExportFormat};
use vitalrs::gateway::{persist_summary, ManualEntry, SqliteRecordStore};
use vitalrs::{
    ActivitySummary, ActivityType, LocalSettings, MetricType, MetricValues, RecordStore,
    VitalRsError,
};

fn cycling_summary() -> ActivitySummary {
    let started_at = Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap();
    let mut metrics = MetricValues::default();
    metrics.set(MetricType::Duration, 30.0);
    metrics.set(MetricType::Distance, 7.5);
    metrics.set(MetricType::Calories, 200.0);
    metrics.set(MetricType::HeartRate, 121.3);
    ActivitySummary {
        activity: ActivityType::Cycling,
        started_at,
        ended_at: started_at + chrono::Duration::minutes(30),
        metrics,
    }
}

fn logged_in() -> LocalSettings {
    let mut settings = LocalSettings::default();
    settings.login("3b241101-e2bb-4255-8caf-4136c566a962");
    settings
}

#[tokio::test]
async fn test_summary_saved_to_local_store() {
    let dir = tempdir().unwrap();
    let store = SqliteRecordStore::open(dir.path().join("data").join("activities.db"), "walking").unwrap();

    let record = persist_summary(&store, &logged_in(), &cycling_summary()).await.unwrap();
    assert_eq!(record.distance, "7.50");
    assert_eq!(record.duration, "30.0");

    let stored = store.select_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record, record);
    assert_eq!(stored[0].record.created_at, cycling_summary().ended_at);
}

#[tokio::test]
async fn test_summary_requires_login() {
    let store = SqliteRecordStore::open_in_memory("walking").unwrap();
    let mut settings = logged_in();
    settings.logout();

    let result = persist_summary(&store, &settings, &cycling_summary()).await;
    assert!(matches!(
        result,
        Err(VitalRsError::Gateway(GatewayError::NotLoggedIn))
    ));
    assert!(store.select_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("activities.db");
    let settings = logged_in();
    let user = settings.active_user().unwrap().to_string();

    {
        let store = SqliteRecordStore::open(&path, "walking").unwrap();
        let entry = ManualEntry {
            calories: "100".to_string(),
            distance: "2.1".to_string(),
            heart_rate: "100".to_string(),
            breathing: "102".to_string(),
            duration: "60".to_string(),
        };
        store.insert(&entry.into_record(&user, Utc::now()).unwrap()).await.unwrap();
    }

    let store = SqliteRecordStore::open(&path, "walking").unwrap();
    let stored = store.select_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.breathing, "102");
    assert_eq!(stored[0].record.user_id, user);
}

#[tokio::test]
async fn test_export_stored_records() {
    let dir = tempdir().unwrap();
    let store = SqliteRecordStore::open_in_memory("walking").unwrap();
    persist_summary(&store, &logged_in(), &cycling_summary()).await.unwrap();
    let records = store.select_all().await.unwrap();

    let csv_path = dir.path().join("records.csv");
    export::export_records(&records, ExportFormat::Csv, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("id,created_at,calories,distance,heartRate"));
    assert!(csv.contains(",200,7.50,121,0,30.0,"));

    let json_path = dir.path().join("records.json");
    export::export_records(&records, ExportFormat::from_path(&json_path).unwrap(), &json_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["id"], 1);
    assert_eq!(parsed[0]["heartRate"], "121");
}

#[test]
fn test_manual_entry_with_blank_field_is_rejected() {
    let entry = ManualEntry {
        calories: "100".to_string(),
        ..ManualEntry::default()
    };
    let err = entry.into_record("user", Utc::now()).unwrap_err();
    assert_eq!(err.user_message(), "Please enter all values to insert");
}
