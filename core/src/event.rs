//! Activity events — the only input the pipeline reads.
//!
//! RULE: Nothing downstream of this module sees an unvalidated record.
//! Raw rows are checked here (non-empty keys, parsable date) and rejected
//! with their line number; stages never handle missing or malformed fields.

use crate::{
    error::{RetentionError, RetentionResult},
    types::{AccountId, UserId, UserKey},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One observed user activity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub account_id:    AccountId,
    pub user_id:       UserId,
    pub activity_date: NaiveDate,
}

impl ActivityEvent {
    pub fn new(
        account_id: impl Into<AccountId>,
        user_id: impl Into<UserId>,
        activity_date: NaiveDate,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            user_id: user_id.into(),
            activity_date,
        }
    }

    pub fn key(&self) -> UserKey {
        (self.account_id.clone(), self.user_id.clone())
    }

    /// Reject empty or whitespace-only keys. `line` is 1-based.
    pub fn check_keys(&self, line: u64) -> RetentionResult<()> {
        if self.account_id.trim().is_empty() {
            return Err(invalid(line, "missing account_id"));
        }
        if self.user_id.trim().is_empty() {
            return Err(invalid(line, "missing user_id"));
        }
        Ok(())
    }
}

/// Check every event built outside `RawActivityRecord::validate`.
/// Line numbers are 1-based positions in the slice.
pub fn check_events(events: &[ActivityEvent]) -> RetentionResult<()> {
    events
        .iter()
        .enumerate()
        .try_for_each(|(idx, event)| event.check_keys(idx as u64 + 1))
}

/// A row as it arrives from a file, before validation.
/// `record_date` is accepted in place of `activity_date`, but not alongside it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivityRecord {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub activity_date: Option<String>,
    #[serde(default)]
    pub record_date: Option<String>,
}

impl RawActivityRecord {
    /// Validate into an event. `line` is 1-based and only used for errors.
    pub fn validate(self, line: u64) -> RetentionResult<ActivityEvent> {
        let account_id = required_key(self.account_id, "account_id", line)?;
        let user_id = required_key(self.user_id, "user_id", line)?;
        let raw_date = match (self.activity_date, self.record_date) {
            (Some(_), Some(_)) => {
                return Err(invalid(line, "both activity_date and record_date given"))
            }
            (date, None) | (None, date) => date,
        };
        let raw_date = raw_date
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| invalid(line, "missing activity_date"))?;
        let activity_date = parse_activity_date(&raw_date)
            .ok_or_else(|| invalid(line, format!("malformed activity_date '{raw_date}'")))?;

        Ok(ActivityEvent {
            account_id,
            user_id,
            activity_date,
        })
    }
}

/// Parse a date or timestamp and truncate it to the calendar date.
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339.
pub fn parse_activity_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts.date());
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive())
}

fn required_key(value: Option<String>, field: &str, line: u64) -> RetentionResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(invalid(line, format!("missing {field}"))),
    }
}

fn invalid(line: u64, reason: impl Into<String>) -> RetentionError {
    RetentionError::InvalidRecord {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(account: Option<&str>, user: Option<&str>, date: Option<&str>) -> RawActivityRecord {
        RawActivityRecord {
            account_id: account.map(Into::into),
            user_id: user.map(Into::into),
            activity_date: date.map(Into::into),
            record_date: None,
        }
    }

    #[test]
    fn timestamps_truncate_to_their_date() {
        let expected = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        assert_eq!(parse_activity_date("2020-12-31"), Some(expected));
        assert_eq!(parse_activity_date("2020-12-31 23:59:59"), Some(expected));
        assert_eq!(parse_activity_date("2020-12-31T08:00:00"), Some(expected));
        assert_eq!(parse_activity_date("2020-12-31T23:00:00+00:00"), Some(expected));
        assert_eq!(parse_activity_date("12/31/2020"), None);
        assert_eq!(parse_activity_date("2020-02-30"), None);
    }

    #[test]
    fn record_date_is_accepted_but_not_alongside_activity_date() {
        let mut row = raw(Some("A1"), Some("u1"), None);
        row.record_date = Some("2020-12-05".into());
        assert!(row.clone().validate(2).is_ok());

        row.activity_date = Some("2020-12-05".into());
        match row.validate(3) {
            Err(RetentionError::InvalidRecord { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("both"), "reason was: {reason}");
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn keys_are_trimmed() {
        let event = raw(Some(" A1 "), Some("u1\t"), Some("2021-01-10"))
            .validate(2)
            .unwrap();
        assert_eq!(event.account_id, "A1");
        assert_eq!(event.user_id, "u1");
    }

    #[test]
    fn empty_or_missing_fields_report_the_line() {
        let cases = [
            raw(None, Some("u1"), Some("2021-01-10")),
            raw(Some("A1"), Some("  "), Some("2021-01-10")),
            raw(Some("A1"), Some("u1"), None),
            raw(Some("A1"), Some("u1"), Some("not-a-date")),
        ];
        for case in cases {
            match case.validate(7) {
                Err(RetentionError::InvalidRecord { line, .. }) => assert_eq!(line, 7),
                other => panic!("expected InvalidRecord, got {other:?}"),
            }
        }
    }
}
