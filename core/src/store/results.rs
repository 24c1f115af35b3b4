use super::RetentionStore;
use crate::{
    error::RetentionResult,
    ratio::RetentionRatio,
    report::RetentionReport,
    retention::{RateMap, RetentionRate},
};
use rusqlite::params;

/// Which side of the ratio a stored rate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRole {
    Baseline,
    Comparison,
}

impl RateRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline   => "baseline",
            Self::Comparison => "comparison",
        }
    }
}

impl RetentionStore {
    // ── Results ────────────────────────────────────────────────

    /// Persist a report's rates and ratios under its run id.
    /// The run row is created if it does not exist yet.
    pub fn save_report(&self, report: &RetentionReport, version: &str) -> RetentionResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO run (
                run_id, version, engine, baseline_month, comparison_month,
                event_count, started_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(run_id) DO UPDATE SET
                engine = excluded.engine,
                event_count = excluded.event_count",
            params![
                report.run_id,
                version,
                report.engine,
                report.baseline_month.to_string(),
                report.comparison_month.to_string(),
                report.event_count as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        {
            let mut rate_stmt = tx.prepare_cached(
                "INSERT INTO retention_rate (run_id, role, month, account_id, retained, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(run_id, role, account_id) DO UPDATE SET
                    month = excluded.month,
                    retained = excluded.retained,
                    active = excluded.active",
            )?;
            let sides = [
                (RateRole::Baseline, report.baseline_month, &report.baseline_rates),
                (RateRole::Comparison, report.comparison_month, &report.comparison_rates),
            ];
            for (role, month, rates) in sides {
                for (account_id, rate) in rates {
                    rate_stmt.execute(params![
                        report.run_id,
                        role.as_str(),
                        month.to_string(),
                        account_id,
                        rate.retained as i64,
                        rate.active as i64,
                    ])?;
                }
            }

            let mut ratio_stmt = tx.prepare_cached(
                "INSERT INTO retention_ratio (run_id, account_id, retention_rate_ratio)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(run_id, account_id) DO UPDATE SET
                    retention_rate_ratio = excluded.retention_rate_ratio",
            )?;
            for row in &report.ratios {
                ratio_stmt.execute(params![
                    report.run_id,
                    row.account_id,
                    row.retention_rate_ratio,
                ])?;
            }
        }

        tx.commit()?;
        log::debug!(
            "store: saved run {} ({} ratios)",
            report.run_id,
            report.ratios.len()
        );
        Ok(())
    }

    pub fn ratios_for_run(&self, run_id: &str) -> RetentionResult<Vec<RetentionRatio>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, retention_rate_ratio
             FROM retention_ratio WHERE run_id = ?1
             ORDER BY account_id",
        )?;
        let ratios = stmt
            .query_map(params![run_id], |row| {
                Ok(RetentionRatio {
                    account_id: row.get(0)?,
                    retention_rate_ratio: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ratios)
    }

    pub fn rates_for_run(&self, run_id: &str, role: RateRole) -> RetentionResult<RateMap> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, retained, active
             FROM retention_rate WHERE run_id = ?1 AND role = ?2",
        )?;
        let rates = stmt
            .query_map(params![run_id, role.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    RetentionRate {
                        retained: row.get::<_, i64>(1)? as u64,
                        active:   row.get::<_, i64>(2)? as u64,
                    },
                ))
            })?
            .collect::<Result<RateMap, _>>()?;
        Ok(rates)
    }
}
