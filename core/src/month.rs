//! Calendar month — the unit every active set and retention rate is keyed by.

use crate::error::{RetentionError, RetentionResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarMonth {
    year:  i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> RetentionResult<Self> {
        // The following month must exist too, so last_day() is always defined.
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        if !(1..=12).contains(&month)
            || NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || NaiveDate::from_ymd_opt(next_year, next_month, 1).is_none()
        {
            return Err(RetentionError::InvalidMonth {
                value: format!("{year:04}-{month:02}"),
            });
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in (SQL `date_trunc('month', d)`).
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year:  date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 { self.year }
    pub fn month(&self) -> u32 { self.month }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated on construction")
    }

    /// Last calendar day. Activity strictly after this date counts as retained.
    pub fn last_day(&self) -> NaiveDate {
        if self.month == 12 {
            return NaiveDate::from_ymd_opt(self.year, 12, 31).expect("validated on construction");
        }
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
            .and_then(|d| d.pred_opt())
            .expect("validated on construction")
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = RetentionError;

    fn from_str(s: &str) -> RetentionResult<Self> {
        let invalid = || RetentionError::InvalidMonth { value: s.to_string() };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for CalendarMonth {
    type Error = RetentionError;

    fn try_from(value: String) -> RetentionResult<Self> {
        value.parse()
    }
}

impl From<CalendarMonth> for String {
    fn from(month: CalendarMonth) -> Self {
        month.to_string()
    }
}
