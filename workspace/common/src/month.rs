use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Error returned when a month identifier does not parse as `YYYY-MM`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid month_year '{0}', expected YYYY-MM")]
pub struct ParseMonthYearError(pub String);

/// A calendar month identifier, serialized as `"YYYY-MM"`.
///
/// This is the single canonical representation used everywhere: stored on
/// budgets, accepted in request paths and bodies, and used to derive the
/// inclusive date window that scopes ledger queries. The legacy `MM-YYYY`
/// form is not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

// Schema: a plain string like "2024-03". utoipa 4 does not accept
// `value_type` at the struct level, so this is spelled out by hand.
impl<'s> ToSchema<'s> for MonthYear {
    fn schema() -> (
        &'s str,
        utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
    ) {
        (
            "MonthYear",
            utoipa::openapi::ObjectBuilder::new()
                .schema_type(utoipa::openapi::SchemaType::String)
                .example(Some(serde_json::json!("2024-03")))
                .into(),
        )
    }
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Delegate range checking to chrono.
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// The month containing "now" (UTC). Monthly-budget warnings are
    /// scoped to this month only.
    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// The month containing the given calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Validity was checked on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("MonthYear holds a valid year/month pair")
    }

    /// Last calendar day of the month, computed as the day before the
    /// first of the next month so 28/29/30/31-day months and leap years
    /// all come out right.
    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .expect("month arithmetic stays in range")
            .pred_opt()
            .expect("first of a month always has a predecessor")
    }

    /// The inclusive `[first_day, last_day]` window for ledger queries.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    /// Whether the given date falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthYear {
    type Err = ParseMonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthYearError(s.to_string());
        let (year_str, month_str) = s.split_once('-').ok_or_else(err)?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(err());
        }
        let year: i32 = year_str.parse().map_err(|_| err())?;
        let month: u32 = month_str.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
