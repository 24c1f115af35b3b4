//! Stage 1 — latest activity per (account, user).
//!
//! The index covers the whole event log, not just the months under study:
//! a user is retained by any later activity, however far out.

use crate::{
    event::ActivityEvent,
    types::UserKey,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestActivityIndex {
    latest: BTreeMap<UserKey, NaiveDate>,
}

impl LatestActivityIndex {
    pub fn build(events: &[ActivityEvent]) -> Self {
        let mut latest: BTreeMap<UserKey, NaiveDate> = BTreeMap::new();
        for event in events {
            latest
                .entry(event.key())
                .and_modify(|d| {
                    if event.activity_date > *d {
                        *d = event.activity_date;
                    }
                })
                .or_insert(event.activity_date);
        }
        log::debug!("latest_activity: indexed {} (account, user) keys", latest.len());
        Self { latest }
    }

    pub fn get(&self, account_id: &str, user_id: &str) -> Option<NaiveDate> {
        self.latest
            .get(&(account_id.to_string(), user_id.to_string()))
            .copied()
    }

    pub fn contains(&self, key: &UserKey) -> bool {
        self.latest.contains_key(key)
    }

    pub fn len(&self) -> usize { self.latest.len() }
    pub fn is_empty(&self) -> bool { self.latest.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&UserKey, &NaiveDate)> {
        self.latest.iter()
    }
}
