//! The retention engine — runs the pipeline stages over one event snapshot.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Latest activity index   (whole log)
//!   2. Month active sets       (baseline, then comparison)
//!   3. Retention aggregation   (baseline, then comparison)
//!   4. Ratio combination
//!
//! RULES:
//!   - Stages are pure functions of the event slice and the config.
//!   - No stage keeps state between runs; running twice gives the same report.
//!   - The SQL engine in store/retention.rs must agree with this one row for row.

use crate::{
    config::RetentionConfig,
    error::{RetentionError, RetentionResult},
    event::{check_events, ActivityEvent},
    latest_activity::LatestActivityIndex,
    month_active::MonthActiveSet,
    ratio::{self, RetentionRatio},
    report::RetentionReport,
    retention,
    store::RetentionStore,
    types::RunId,
};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Memory,
    Sql,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sql    => "sql",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = RetentionError;

    fn from_str(s: &str) -> RetentionResult<Self> {
        match s {
            "memory" => Ok(Self::Memory),
            "sql"    => Ok(Self::Sql),
            other    => Err(anyhow::anyhow!("unknown engine '{other}' (expected memory or sql)").into()),
        }
    }
}

pub struct RetentionEngine {
    pub config: RetentionConfig,
}

impl RetentionEngine {
    pub fn new(config: RetentionConfig) -> Self {
        Self { config }
    }

    /// Just the final rows, sorted by account id.
    pub fn ratios(&self, events: &[ActivityEvent]) -> RetentionResult<Vec<RetentionRatio>> {
        Ok(self.run(String::new(), events)?.ratios)
    }

    /// Run every stage in memory over `events`.
    /// Events with empty keys are rejected before any stage runs.
    pub fn run(&self, run_id: RunId, events: &[ActivityEvent]) -> RetentionResult<RetentionReport> {
        let baseline_month = self.config.baseline_month;
        let comparison_month = self.config.comparison_month;

        check_events(events)?;

        // 1. Latest activity
        let latest = LatestActivityIndex::build(events);

        // 2. Month active sets
        let baseline_active = MonthActiveSet::collect(events, baseline_month);
        let comparison_active = MonthActiveSet::collect(events, comparison_month);

        // 3. Retention aggregation
        let baseline_rates = retention::aggregate(&baseline_active, &latest)?;
        let comparison_rates = retention::aggregate(&comparison_active, &latest)?;

        // 4. Ratio combination
        let ratios = ratio::combine(
            &baseline_rates,
            &comparison_rates,
            self.config.zero_baseline_policy,
        )?;

        log::info!(
            "engine: run={run_id} events={} accounts={} ({baseline_month} -> {comparison_month})",
            events.len(),
            ratios.len()
        );

        Ok(RetentionReport {
            run_id,
            engine: EngineKind::Memory.to_string(),
            baseline_month,
            comparison_month,
            event_count: events.len() as u64,
            baseline_rates,
            comparison_rates,
            ratios,
        })
    }

    /// Run the same computation as one SQL query over the store's event table.
    pub fn run_sql(&self, run_id: RunId, store: &RetentionStore) -> RetentionResult<RetentionReport> {
        let result = store.sql_retention(
            self.config.baseline_month,
            self.config.comparison_month,
            self.config.zero_baseline_policy,
        )?;
        let event_count = store.event_count()?;

        log::info!(
            "engine: run={run_id} (sql) events={event_count} accounts={}",
            result.ratios.len()
        );

        Ok(RetentionReport {
            run_id,
            engine: EngineKind::Sql.to_string(),
            baseline_month: self.config.baseline_month,
            comparison_month: self.config.comparison_month,
            event_count,
            baseline_rates: result.baseline_rates,
            comparison_rates: result.comparison_rates,
            ratios: result.ratios,
        })
    }

    pub fn run_with(
        &self,
        kind: EngineKind,
        run_id: RunId,
        events: &[ActivityEvent],
        store: &RetentionStore,
    ) -> RetentionResult<RetentionReport> {
        match kind {
            EngineKind::Memory => self.run(run_id, events),
            EngineKind::Sql    => self.run_sql(run_id, store),
        }
    }
}

/// Tolerance used when comparing ratios produced by the two engines.
pub const RATIO_EPSILON: f64 = 1e-9;

/// Check that two reports hold the same rates and ratios.
/// Returns a description of the first difference.
pub fn reports_agree(a: &RetentionReport, b: &RetentionReport) -> Result<(), String> {
    if a.baseline_rates != b.baseline_rates {
        return Err(format!("baseline rates differ ({} vs {})", a.engine, b.engine));
    }
    if a.comparison_rates != b.comparison_rates {
        return Err(format!("comparison rates differ ({} vs {})", a.engine, b.engine));
    }
    if a.ratios.len() != b.ratios.len() {
        return Err(format!(
            "row counts differ: {} has {}, {} has {}",
            a.engine,
            a.ratios.len(),
            b.engine,
            b.ratios.len()
        ));
    }
    for (x, y) in a.ratios.iter().zip(&b.ratios) {
        if x.account_id != y.account_id
            || (x.retention_rate_ratio - y.retention_rate_ratio).abs() > RATIO_EPSILON
        {
            return Err(format!(
                "row diverged: {}={} vs {}={}",
                x.account_id, x.retention_rate_ratio, y.account_id, y.retention_rate_ratio
            ));
        }
    }
    Ok(())
}
