//! Run report — everything one run produced, serializable to JSON.

use crate::{
    error::RetentionResult,
    month::CalendarMonth,
    ratio::RetentionRatio,
    retention::RateMap,
    types::RunId,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionReport {
    pub run_id:           RunId,
    pub engine:           String,
    pub baseline_month:   CalendarMonth,
    pub comparison_month: CalendarMonth,
    pub event_count:      u64,
    pub baseline_rates:   RateMap,
    pub comparison_rates: RateMap,
    /// Sorted by account id.
    pub ratios:           Vec<RetentionRatio>,
}

impl RetentionReport {
    pub fn ratio_for(&self, account_id: &str) -> Option<f64> {
        self.ratios
            .iter()
            .find(|r| r.account_id == account_id)
            .map(|r| r.retention_rate_ratio)
    }

    pub fn to_json(&self) -> RetentionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> RetentionResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Plain-text table, one row per account.
    pub fn render_table(&self) -> String {
        let fmt_rate = |rates: &RateMap, account: &str| match rates.get(account) {
            Some(r) => format!("{}/{} ({:.3})", r.retained, r.active, r.value()),
            None => "-".to_string(),
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<16} {:>20} {:>20} {:>10}",
            "account_id",
            self.baseline_month.to_string(),
            self.comparison_month.to_string(),
            "ratio"
        );
        for row in &self.ratios {
            let _ = writeln!(
                out,
                "{:<16} {:>20} {:>20} {:>10.4}",
                row.account_id,
                fmt_rate(&self.baseline_rates, &row.account_id),
                fmt_rate(&self.comparison_rates, &row.account_id),
                row.retention_rate_ratio
            );
        }
        out
    }
}
