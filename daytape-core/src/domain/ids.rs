use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date key format used throughout the data tree.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// True if `s` is a calendar date written exactly as `YYYY-MM-DD`.
pub fn is_date_key(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

/// (ticker, date) pair identifying one day file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub ticker: String,
    pub date: String,
}

impl DayKey {
    pub fn new(ticker: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            date: date.into(),
        }
    }
}

/// Rendered as `ticker:date`, the lookup key of the local per-day index.
impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ticker, self.date)
    }
}

/// Monotonically increasing identifier for a load request.
///
/// Only the completion carrying the latest token may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

impl RequestToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
