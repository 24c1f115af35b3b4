//! Stage 2 — distinct (account, user) pairs active in one calendar month.

use crate::{
    event::ActivityEvent,
    month::CalendarMonth,
    types::{AccountId, UserId, UserKey},
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthActiveSet {
    pub month: CalendarMonth,
    pairs:     BTreeSet<UserKey>,
}

impl MonthActiveSet {
    /// Several same-month events for one user collapse to a single pair.
    pub fn collect(events: &[ActivityEvent], month: CalendarMonth) -> Self {
        let pairs: BTreeSet<UserKey> = events
            .iter()
            .filter(|e| month.contains(e.activity_date))
            .map(ActivityEvent::key)
            .collect();
        log::debug!("month_active: {} active pairs in {month}", pairs.len());
        Self { month, pairs }
    }

    pub fn contains(&self, account_id: &str, user_id: &str) -> bool {
        self.pairs
            .contains(&(account_id.to_string(), user_id.to_string()))
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &UserKey> {
        self.pairs.iter()
    }

    pub fn accounts(&self) -> BTreeSet<&AccountId> {
        self.pairs.iter().map(|(account, _)| account).collect()
    }

    /// Users grouped by account. Every group is non-empty.
    pub fn users_by_account(&self) -> BTreeMap<&AccountId, Vec<&UserId>> {
        let mut grouped: BTreeMap<&AccountId, Vec<&UserId>> = BTreeMap::new();
        for (account, user) in &self.pairs {
            grouped.entry(account).or_default().push(user);
        }
        grouped
    }
}
