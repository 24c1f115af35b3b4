//! Per-account monthly retention ratios from an activity event log.
//!
//! The pipeline runs four stages over an immutable snapshot of events
//! (see engine.rs for the fixed order). The same computation is also
//! available as a single SQL query over the store's event table.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod ingest;
pub mod latest_activity;
pub mod month;
pub mod month_active;
pub mod ratio;
pub mod report;
pub mod retention;
pub mod rng;
pub mod store;
pub mod types;

pub use config::{RetentionConfig, ZeroBaselinePolicy};
pub use engine::{EngineKind, RetentionEngine};
pub use error::{RetentionError, RetentionResult};
pub use event::ActivityEvent;
pub use month::CalendarMonth;
pub use ratio::RetentionRatio;
pub use report::RetentionReport;
pub use retention::{RateMap, RetentionRate};
pub use store::RetentionStore;

/// Compute the ratio rows for `events` with the given configuration.
pub fn compute_retention_ratios(
    events: &[ActivityEvent],
    config: &RetentionConfig,
) -> RetentionResult<Vec<RetentionRatio>> {
    RetentionEngine::new(config.clone()).ratios(events)
}
