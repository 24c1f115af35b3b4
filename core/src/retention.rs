//! Stage 3 — per-account retention rate for one month's active set.

use crate::{
    error::{RetentionError, RetentionResult},
    latest_activity::LatestActivityIndex,
    month::CalendarMonth,
    month_active::MonthActiveSet,
    types::AccountId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `retained / active`, kept as exact counts. `active` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRate {
    pub retained: u64,
    pub active:   u64,
}

impl RetentionRate {
    pub fn value(&self) -> f64 {
        self.retained as f64 / self.active as f64
    }

    pub fn is_zero(&self) -> bool {
        self.retained == 0
    }
}

/// Accounts with no active users in the month have no entry.
pub type RateMap = BTreeMap<AccountId, RetentionRate>;

/// A user counts as retained when their latest activity is after the month's last day.
pub fn aggregate(
    active: &MonthActiveSet,
    latest: &LatestActivityIndex,
) -> RetentionResult<RateMap> {
    let month_end = active.month.last_day();
    let mut rates = RateMap::new();

    for (account, users) in active.users_by_account() {
        let mut retained = 0u64;
        for user in &users {
            let last = latest.get(account, user).ok_or_else(|| {
                RetentionError::MissingLatestActivity {
                    account_id: account.clone(),
                    user_id: (*user).clone(),
                }
            })?;
            if last > month_end {
                retained += 1;
            }
        }
        rates.insert(
            account.clone(),
            RetentionRate {
                retained,
                active: users.len() as u64,
            },
        );
    }

    log_summary(active.month, &rates);
    Ok(rates)
}

fn log_summary(month: CalendarMonth, rates: &RateMap) {
    let (retained, active) = rates
        .values()
        .fold((0u64, 0u64), |(r, a), rate| (r + rate.retained, a + rate.active));
    log::info!(
        "retention: {month} accounts={} active_users={active} retained_users={retained}",
        rates.len()
    );
}
