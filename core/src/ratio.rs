//! Stage 4 — combine baseline and comparison rates into one ratio per account.
//!
//! Defaults for an account missing from one side:
//!   - no baseline rate   → denominator 1 (ratio is the comparison rate)
//!   - no comparison rate → numerator 0   (ratio is 0)
//! A baseline rate that is present but zero follows `ZeroBaselinePolicy`.

use crate::{
    config::ZeroBaselinePolicy,
    error::{RetentionError, RetentionResult},
    retention::RateMap,
    types::AccountId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRatio {
    pub account_id:           AccountId,
    pub retention_rate_ratio: f64,
}

/// Rows come out sorted by account id.
pub fn combine(
    baseline: &RateMap,
    comparison: &RateMap,
    policy: ZeroBaselinePolicy,
) -> RetentionResult<Vec<RetentionRatio>> {
    let accounts: BTreeSet<&AccountId> = baseline.keys().chain(comparison.keys()).collect();
    let mut ratios = Vec::with_capacity(accounts.len());

    for account in accounts {
        let numerator = comparison.get(account).map(|r| r.value()).unwrap_or(0.0);
        let retention_rate_ratio = match baseline.get(account) {
            None => numerator,
            Some(rate) if rate.is_zero() => match policy {
                ZeroBaselinePolicy::Zero => {
                    log::debug!("ratio: {account} retained no baseline users, ratio set to 0");
                    0.0
                }
                ZeroBaselinePolicy::Error => {
                    return Err(RetentionError::ZeroBaseline {
                        account_id: account.clone(),
                    })
                }
            },
            Some(rate) => numerator / rate.value(),
        };
        ratios.push(RetentionRatio {
            account_id: account.clone(),
            retention_rate_ratio,
        });
    }

    Ok(ratios)
}
