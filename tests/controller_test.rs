//! Integration tests for the record sync controller

use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Arc;
use synheart_heart_rate::{
    audit::create_shared_log,
    record::DISPLAY_FORMAT,
    store::{InMemoryStore, JsonFileStore, Permission, PermissionSet, StoreError},
    sync::{Availability, FilterMode, RecordSyncController, SyncError},
    ValidationError, ZoneSource,
};

fn utc() -> ZoneSource {
    ZoneSource::Named(chrono_tz::UTC)
}

fn controller(store: &Arc<InMemoryStore>) -> RecordSyncController {
    RecordSyncController::new(store.clone()).with_zone(utc())
}

/// Form text for a whole minute `days_ago` days before now, and the instant it names.
fn form_time(days_ago: i64, hour: u32) -> (String, DateTime<FixedOffset>) {
    let date = (Utc::now() - Duration::days(days_ago)).date_naive();
    let naive = date.and_hms_opt(hour, 0, 0).unwrap();
    let text = naive.format(DISPLAY_FORMAT).to_string();
    (text, naive.and_utc().fixed_offset())
}

#[tokio::test]
async fn test_scenario_empty_save_load_filter() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);

    assert!(controller.start().await.unwrap().is_empty());
    assert!(controller.snapshot().all_records.is_empty());

    let (text, instant) = form_time(1, 8);
    let saved = controller.save("65", &text).await.unwrap();
    assert_eq!(saved.beats_per_minute, 65);
    assert_eq!(saved.timestamp, instant);

    let loaded = controller.load(30).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].beats_per_minute, 65);
    assert_eq!(loaded[0].timestamp, instant);

    assert_eq!(controller.filter("65"), loaded);
    assert!(controller.filter("650").is_empty());
    assert_eq!(controller.filter(""), loaded);
}

#[tokio::test]
async fn test_round_trip_keeps_bpm_and_minute() {
    let store = Arc::new(InMemoryStore::new());
    let controller = RecordSyncController::new(store.clone())
        .with_zone(ZoneSource::Named(chrono_tz::Asia::Kolkata));
    controller.start().await.unwrap();

    let (text, _) = form_time(2, 9);
    controller.save("72", &text).await.unwrap();

    let loaded = controller.load(30).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].beats_per_minute, 72);
    assert_eq!(loaded[0].time_label(), text);
    assert_eq!(loaded[0].timestamp.offset().local_minus_utc(), 5 * 3600 + 1800);
}

#[tokio::test]
async fn test_load_sorts_descending() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    for (days_ago, bpm) in [(5, "61"), (1, "62"), (10, "63"), (3, "64")] {
        let (text, _) = form_time(days_ago, 12);
        controller.save(bpm, &text).await.unwrap();
    }

    let loaded = controller.load(30).await.unwrap();
    let rates: Vec<u32> = loaded.iter().map(|s| s.beats_per_minute).collect();
    assert_eq!(rates, vec![62, 64, 61, 63]);
    for pair in loaded.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[tokio::test]
async fn test_load_respects_lookback_window() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let (recent, _) = form_time(2, 12);
    let (old, _) = form_time(45, 12);
    controller.save("70", &recent).await.unwrap();
    controller.save("80", &old).await.unwrap();

    assert_eq!(controller.load(30).await.unwrap().len(), 1);
    assert_eq!(controller.load(60).await.unwrap().len(), 2);
    assert_eq!(store.records().await.len(), 2);
}

#[tokio::test]
async fn test_huge_lookback_loads_everything() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store).with_lookback_days(u32::MAX);

    assert!(controller.start().await.unwrap().is_empty());

    let (recent, _) = form_time(2, 12);
    let (old, _) = form_time(4000, 12);
    controller.save("70", &recent).await.unwrap();
    controller.save("80", &old).await.unwrap();

    assert_eq!(controller.load(u32::MAX).await.unwrap().len(), 2);
    assert_eq!(controller.load(100_000_000).await.unwrap().len(), 2);
    assert!(controller.snapshot().error_message.is_none());
}

#[tokio::test]
async fn test_invalid_bpm_never_reaches_store() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let err = controller.save("abc", "").await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Validation(ValidationError::InvalidHeartRate(_))
    ));
    assert_eq!(err.user_message(), "Invalid heart rate");

    for bpm in ["0", "301", "72.5"] {
        assert!(matches!(
            controller.save(bpm, "").await,
            Err(SyncError::Validation(_))
        ));
    }
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_invalid_timestamp_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let err = controller.save("72", "not-a-date").await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Validation(ValidationError::InvalidDateTime(_))
    ));
    assert_eq!(
        controller.snapshot().error_message.as_deref(),
        Some("Invalid date/time")
    );
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_blank_timestamp_uses_now() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let called_at = Utc::now();
    let saved = controller.save("80", "").await.unwrap();

    let drift = (saved.timestamp.with_timezone(&Utc) - called_at).num_milliseconds().abs();
    assert!(drift < 5_000, "timestamp drifted {drift}ms from call time");

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].samples[0].timestamp, saved.timestamp);
}

#[tokio::test]
async fn test_stored_record_is_one_millisecond_interval() {
    let store = Arc::new(InMemoryStore::new());
    let controller = RecordSyncController::new(store.clone())
        .with_zone(ZoneSource::Named(chrono_tz::America::New_York));
    controller.start().await.unwrap();

    let (text, _) = form_time(1, 7);
    let saved = controller.save("90", &text).await.unwrap();

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.end_time - record.start_time, Duration::milliseconds(1));
    assert_eq!(record.start_zone_offset, *saved.timestamp.offset());
    assert_eq!(record.end_zone_offset, *saved.timestamp.offset());
    assert_eq!(record.samples.len(), 1);
}

#[tokio::test]
async fn test_second_request_while_busy_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let first = controller.load(30);
    assert!(controller.snapshot().busy);
    assert!(!controller.snapshot().controls_enabled());

    assert_eq!(controller.load(30).await, Err(SyncError::Busy));
    assert_eq!(controller.save("72", "").await, Err(SyncError::Busy));

    assert!(first.await.is_ok());
    assert!(!controller.is_busy());
    assert!(controller.load(30).await.is_ok());
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn test_failed_load_keeps_history() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let (text, _) = form_time(1, 10);
    controller.save("75", &text).await.unwrap();
    let before = controller.snapshot().all_records;
    assert_eq!(before.len(), 1);

    store.fail_next_read(StoreError::Unavailable("service down".to_string()));
    let err = controller.load(30).await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Store(StoreError::Unavailable("service down".to_string()))
    );

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.all_records, before);
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("Store unavailable: service down")
    );

    // A successful load clears the message.
    controller.load(30).await.unwrap();
    assert!(controller.snapshot().error_message.is_none());
}

#[tokio::test]
async fn test_failed_insert_surfaces_message() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    store.fail_next_insert(StoreError::Io("disk full".to_string()));
    controller.set_bpm_input("70");
    let err = controller.save_form().await.unwrap_err();

    assert_eq!(err, SyncError::Store(StoreError::Io("disk full".to_string())));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.form.bpm_input, "70");
    assert!(snapshot.all_records.is_empty());
    assert_eq!(snapshot.error_message.as_deref(), Some("Store IO error: disk full"));
}

#[tokio::test]
async fn test_refresh_failure_after_save() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    store.fail_next_read(StoreError::Unavailable("flaky".to_string()));
    controller.set_bpm_input("68");
    let err = controller.save_form().await.unwrap_err();

    assert!(matches!(err, SyncError::RefreshFailed { saved, .. } if saved.beats_per_minute == 68));
    assert_eq!(store.records().await.len(), 1);
    assert_eq!(controller.snapshot().form.bpm_input, "");
}

#[tokio::test]
async fn test_save_form_clears_inputs_on_success() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let (text, _) = form_time(1, 6);
    controller.set_bpm_input("66");
    controller.set_timestamp_input(text.clone());
    controller.save_form().await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.form.bpm_input, "");
    assert_eq!(snapshot.form.timestamp_input, "");
    assert_eq!(snapshot.all_records.len(), 1);
    assert_eq!(snapshot.all_records[0].time_label(), text);

    controller.set_bpm_input("sixty");
    controller.save_form().await.unwrap_err();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.form.bpm_input, "sixty");
    assert_eq!(snapshot.error_message.as_deref(), Some("Invalid heart rate"));
}

#[tokio::test]
async fn test_missing_consent_blocks_before_store_calls() {
    let store = Arc::new(InMemoryStore::with_permissions(PermissionSet {
        read: true,
        write: false,
    }));
    let controller = controller(&store);

    assert_eq!(
        controller.start().await,
        Err(SyncError::NotAuthorized(vec![Permission::Write]))
    );
    let snapshot = controller.snapshot();
    assert_eq!(
        snapshot.availability,
        Availability::Blocked(vec![Permission::Write])
    );
    assert!(!snapshot.controls_enabled());

    assert!(matches!(
        controller.save("72", "").await,
        Err(SyncError::NotAuthorized(_))
    ));
    assert!(matches!(
        controller.load(30).await,
        Err(SyncError::NotAuthorized(_))
    ));
    assert_eq!(store.insert_calls(), 0);
    assert_eq!(store.read_calls(), 0);

    // Granting and starting again unblocks.
    store.set_permissions(PermissionSet::all());
    controller.start().await.unwrap();
    assert_eq!(controller.snapshot().availability, Availability::Ready);
    assert!(controller.save("72", "").await.is_ok());
}

#[tokio::test]
async fn test_active_filter_reapplied_after_save() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store);
    controller.start().await.unwrap();

    let (a, _) = form_time(1, 8);
    let (b, _) = form_time(1, 9);
    controller.save("90", &a).await.unwrap();
    assert_eq!(controller.filter("90").len(), 1);

    controller.save("190", &b).await.unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.filter.as_deref(), Some("90"));
    assert_eq!(snapshot.filtered_records.len(), 2);
    assert_eq!(snapshot.all_records.len(), 2);
}

#[tokio::test]
async fn test_exact_filter_mode() {
    let store = Arc::new(InMemoryStore::new());
    let controller = controller(&store).with_filter_mode(FilterMode::Exact);
    controller.start().await.unwrap();

    for (hour, bpm) in [(8, "90"), (9, "190"), (10, "72")] {
        let (text, _) = form_time(1, hour);
        controller.save(bpm, &text).await.unwrap();
    }

    let rates = |samples: Vec<synheart_heart_rate::HeartRateSample>| -> Vec<u32> {
        samples.iter().map(|s| s.beats_per_minute).collect()
    };
    assert_eq!(rates(controller.filter("90")), vec![90]);
    assert_eq!(rates(controller.filter("70-100")), vec![72, 90]);
    assert!(controller.filter("90.0").is_empty());
}

#[tokio::test]
async fn test_access_log_counts_traffic() {
    let store = Arc::new(InMemoryStore::new());
    let log = create_shared_log();
    let controller = controller(&store).with_access_log(log.clone());
    controller.start().await.unwrap();

    controller.save("72", "").await.unwrap();
    store.fail_next_read(StoreError::Unavailable("down".to_string()));
    controller.load(30).await.unwrap_err();

    let stats = log.stats();
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.samples_read, 1);
    assert_eq!(stats.saves, 1);
    assert_eq!(stats.samples_written, 1);
    assert_eq!(stats.failures, 1);
}

#[tokio::test]
async fn test_file_store_backed_controller() {
    let dir = tempfile::tempdir().unwrap();
    let (text, instant) = form_time(3, 14);

    {
        let store = Arc::new(JsonFileStore::in_dir(dir.path(), PermissionSet::all()));
        let controller = RecordSyncController::new(store).with_zone(utc());
        controller.start().await.unwrap();
        controller.save("58", &text).await.unwrap();
    }

    let store = Arc::new(JsonFileStore::in_dir(dir.path(), PermissionSet::all()));
    let controller = RecordSyncController::new(store).with_zone(utc());
    let loaded = controller.start().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].beats_per_minute, 58);
    assert_eq!(loaded[0].timestamp, instant);
}
