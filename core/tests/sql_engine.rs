//! The SQL engine and the in-memory engine must agree row for row.

use chrono::NaiveDate;
use retention_core::{
    engine::reports_agree, generator::generate_events, ActivityEvent, RetentionConfig,
    RetentionEngine, RetentionError, RetentionStore, ZeroBaselinePolicy,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ev(account: &str, user: &str, date: &str) -> ActivityEvent {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    ActivityEvent::new(account, user, date)
}

fn store_with(events: &[ActivityEvent]) -> RetentionStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = RetentionStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_events(events).expect("insert events");
    store
}

fn assert_engines_agree(config: RetentionConfig, events: &[ActivityEvent]) {
    let store = store_with(events);
    let engine = RetentionEngine::new(config);

    let memory = engine.run("memory".into(), events).expect("memory run");
    let sql = engine.run_sql("sql".into(), &store).expect("sql run");

    if let Err(diff) = reports_agree(&memory, &sql) {
        panic!("engines disagree: {diff}");
    }
    assert_eq!(memory.event_count, sql.event_count);
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn sql_matches_memory_on_handwritten_scenarios() {
    let events = vec![
        ev("A1", "u1", "2020-12-05"),
        ev("A1", "u1", "2021-01-10"),
        ev("A1", "u2", "2020-12-05"),
        ev("A2", "u3", "2020-12-01"),
        ev("A2", "u3", "2021-01-15"),
        ev("A2", "u3", "2021-02-03"),
        ev("A3", "u5", "2021-01-08"),
        ev("A3", "u5", "2021-03-01"),
        ev("A3", "u6", "2021-01-09"),
        ev("A4", "u7", "2020-12-30"),
        ev("A4", "u8", "2020-11-14"),
    ];
    assert_engines_agree(RetentionConfig::default(), &events);
}

#[test]
fn sql_matches_memory_on_generated_logs() {
    let config = RetentionConfig::default_test();
    for seed in [1u64, 42, 0xDEAD_BEEF] {
        let events = generate_events(&config.generator, seed);
        assert_engines_agree(config.clone(), &events);
    }
}

#[test]
fn sql_matches_memory_on_a_larger_log() {
    let mut config = RetentionConfig::default();
    config.generator.accounts = 40;
    config.generator.users_per_account = 30;
    let events = generate_events(&config.generator, 2021);
    assert_engines_agree(config, &events);
}

#[test]
fn sql_zero_baseline_follows_policy() {
    let events = vec![
        ev("A1", "u1", "2020-12-10"),
        ev("A1", "u2", "2021-01-10"),
        ev("A1", "u2", "2021-02-10"),
    ];
    let store = store_with(&events);

    let lenient = RetentionEngine::new(RetentionConfig::default());
    let report = lenient.run_sql("lenient".into(), &store).unwrap();
    assert_eq!(report.ratio_for("A1"), Some(0.0));

    let strict = RetentionEngine::new(RetentionConfig {
        zero_baseline_policy: ZeroBaselinePolicy::Error,
        ..RetentionConfig::default()
    });
    let err = strict.run_sql("strict".into(), &store).unwrap_err();
    assert!(matches!(err, RetentionError::ZeroBaseline { .. }));
}

#[test]
fn sql_on_empty_table_returns_no_rows() {
    let store = store_with(&[]);
    let report = RetentionEngine::new(RetentionConfig::default())
        .run_sql("empty".into(), &store)
        .unwrap();
    assert!(report.ratios.is_empty());
    assert_eq!(report.event_count, 0);
}
