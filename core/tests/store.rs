use chrono::NaiveDate;
use retention_core::{
    store::RateRole, ActivityEvent, CalendarMonth, RetentionConfig, RetentionEngine,
    RetentionStore,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ev(account: &str, user: &str, date: &str) -> ActivityEvent {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    ActivityEvent::new(account, user, date)
}

fn migrated_store() -> RetentionStore {
    let store = RetentionStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn sample_events() -> Vec<ActivityEvent> {
    vec![
        ev("A1", "u1", "2020-12-05"),
        ev("A1", "u1", "2021-01-10"),
        ev("A1", "u2", "2020-12-05"),
        ev("A2", "u3", "2021-01-15"),
        ev("A2", "u3", "2021-02-15"),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn migrate_is_repeatable() {
    let store = migrated_store();
    store.migrate().expect("second migration");
    assert_eq!(store.event_count().unwrap(), 0);
}

#[test]
fn events_round_trip_in_insertion_order() {
    let store = migrated_store();
    let events = sample_events();

    assert_eq!(store.insert_events(&events).unwrap(), events.len());
    assert_eq!(store.event_count().unwrap(), events.len() as u64);
    assert_eq!(store.load_events().unwrap(), events);

    store.clear_events().unwrap();
    assert_eq!(store.event_count().unwrap(), 0);
}

#[test]
fn saved_report_can_be_read_back() {
    let store = migrated_store();
    let events = sample_events();
    store.insert_events(&events).unwrap();

    let config = RetentionConfig::default();
    store
        .insert_run("run-1", config.baseline_month, config.comparison_month, "test")
        .unwrap();
    let report = RetentionEngine::new(config).run("run-1".into(), &events).unwrap();
    store.save_report(&report, "test").unwrap();

    assert_eq!(store.run_count().unwrap(), 1);
    assert_eq!(store.ratios_for_run("run-1").unwrap(), report.ratios);
    assert_eq!(
        store.rates_for_run("run-1", RateRole::Baseline).unwrap(),
        report.baseline_rates
    );
    assert_eq!(
        store.rates_for_run("run-1", RateRole::Comparison).unwrap(),
        report.comparison_rates
    );
}

#[test]
fn saving_twice_overwrites_instead_of_duplicating() {
    let store = migrated_store();
    let events = sample_events();
    let report = RetentionEngine::new(RetentionConfig::default())
        .run("run-2".into(), &events)
        .unwrap();

    store.save_report(&report, "test").unwrap();
    store.save_report(&report, "test").unwrap();

    assert_eq!(store.run_count().unwrap(), 1);
    assert_eq!(store.ratios_for_run("run-2").unwrap().len(), report.ratios.len());
}

#[test]
fn runs_are_kept_apart() {
    let store = migrated_store();
    let engine = RetentionEngine::new(RetentionConfig {
        baseline_month: CalendarMonth::new(2021, 1).unwrap(),
        comparison_month: CalendarMonth::new(2021, 2).unwrap(),
        ..RetentionConfig::default()
    });
    let report = engine.run("run-b".into(), &sample_events()).unwrap();
    store.save_report(&report, "test").unwrap();

    assert!(store.ratios_for_run("run-a").unwrap().is_empty());
    assert!(!store.ratios_for_run("run-b").unwrap().is_empty());
}

#[test]
fn file_store_persists_across_connections() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("retention.db");
    let path = path.to_str().unwrap();

    {
        let store = RetentionStore::open(path).unwrap();
        store.migrate().unwrap();
        store.insert_events(&sample_events()).unwrap();
    }

    let reopened = RetentionStore::open(path).unwrap();
    assert_eq!(reopened.path(), Some(path));
    assert_eq!(reopened.event_count().unwrap(), sample_events().len() as u64);
}
