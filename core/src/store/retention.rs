use super::{RetentionStore, DATE_FORMAT};
use crate::{
    config::ZeroBaselinePolicy,
    error::{RetentionError, RetentionResult},
    month::CalendarMonth,
    ratio::RetentionRatio,
    retention::{RateMap, RetentionRate},
};
use rusqlite::params;

/// The whole pipeline as one query.
///   ?1 / ?2 — baseline month first and last day
///   ?3 / ?4 — comparison month first and last day
/// A NULL ratio marks a zero baseline rate; the caller applies the policy.
const RETENTION_SQL: &str = "
WITH latest AS (
    SELECT account_id, user_id, MAX(activity_date) AS last_date
    FROM activity_event
    GROUP BY account_id, user_id
),
baseline_active AS (
    SELECT DISTINCT account_id, user_id
    FROM activity_event
    WHERE activity_date BETWEEN ?1 AND ?2
),
comparison_active AS (
    SELECT DISTINCT account_id, user_id
    FROM activity_event
    WHERE activity_date BETWEEN ?3 AND ?4
),
baseline_rate AS (
    SELECT a.account_id,
           SUM(CASE WHEN l.last_date > ?2 THEN 1 ELSE 0 END) AS retained,
           COUNT(*) AS active
    FROM baseline_active a
    JOIN latest l ON l.account_id = a.account_id AND l.user_id = a.user_id
    GROUP BY a.account_id
),
comparison_rate AS (
    SELECT a.account_id,
           SUM(CASE WHEN l.last_date > ?4 THEN 1 ELSE 0 END) AS retained,
           COUNT(*) AS active
    FROM comparison_active a
    JOIN latest l ON l.account_id = a.account_id AND l.user_id = a.user_id
    GROUP BY a.account_id
),
accounts AS (
    SELECT account_id FROM baseline_rate
    UNION
    SELECT account_id FROM comparison_rate
)
SELECT acc.account_id,
       b.retained, b.active,
       c.retained, c.active,
       CASE
           WHEN b.active IS NULL
               THEN COALESCE(CAST(c.retained AS REAL) / c.active, 0.0)
           WHEN b.retained = 0
               THEN NULL
           ELSE COALESCE(CAST(c.retained AS REAL) / c.active, 0.0)
                / (CAST(b.retained AS REAL) / b.active)
       END AS retention_rate_ratio
FROM accounts acc
LEFT JOIN baseline_rate   b ON b.account_id = acc.account_id
LEFT JOIN comparison_rate c ON c.account_id = acc.account_id
ORDER BY acc.account_id";

/// Output of the SQL engine, shaped like the in-memory stages' output.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRetention {
    pub baseline_rates:   RateMap,
    pub comparison_rates: RateMap,
    pub ratios:           Vec<RetentionRatio>,
}

struct SqlRow {
    account_id: String,
    baseline:   Option<RetentionRate>,
    comparison: Option<RetentionRate>,
    ratio:      Option<f64>,
}

fn rate(retained: Option<i64>, active: Option<i64>) -> Option<RetentionRate> {
    match (retained, active) {
        (Some(retained), Some(active)) => Some(RetentionRate {
            retained: retained as u64,
            active:   active as u64,
        }),
        _ => None,
    }
}

impl RetentionStore {
    pub fn sql_retention(
        &self,
        baseline: CalendarMonth,
        comparison: CalendarMonth,
        policy: ZeroBaselinePolicy,
    ) -> RetentionResult<SqlRetention> {
        let day = |d: chrono::NaiveDate| d.format(DATE_FORMAT).to_string();

        let mut stmt = self.conn.prepare(RETENTION_SQL)?;
        let rows = stmt
            .query_map(
                params![
                    day(baseline.first_day()),
                    day(baseline.last_day()),
                    day(comparison.first_day()),
                    day(comparison.last_day()),
                ],
                |row| {
                    Ok(SqlRow {
                        account_id: row.get(0)?,
                        baseline:   rate(row.get(1)?, row.get(2)?),
                        comparison: rate(row.get(3)?, row.get(4)?),
                        ratio:      row.get(5)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = SqlRetention {
            baseline_rates:   RateMap::new(),
            comparison_rates: RateMap::new(),
            ratios:           Vec::with_capacity(rows.len()),
        };

        for row in rows {
            let retention_rate_ratio = match (row.ratio, policy) {
                (Some(ratio), _) => ratio,
                (None, ZeroBaselinePolicy::Zero) => 0.0,
                (None, ZeroBaselinePolicy::Error) => {
                    return Err(RetentionError::ZeroBaseline {
                        account_id: row.account_id,
                    })
                }
            };
            if let Some(r) = row.baseline {
                out.baseline_rates.insert(row.account_id.clone(), r);
            }
            if let Some(r) = row.comparison {
                out.comparison_rates.insert(row.account_id.clone(), r);
            }
            out.ratios.push(RetentionRatio {
                account_id: row.account_id,
                retention_rate_ratio,
            });
        }

        log::debug!("store: sql retention produced {} rows", out.ratios.len());
        Ok(out)
    }
}
