//! Calendar dates in the service's fixed UTC offset

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SecondsFormat, Utc};

/// Derives calendar dates for events
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    /// Calendar in the given offset
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar in UTC
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Calendar date of an instant
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Today's date
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Configured offset
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Fixed-width RFC 3339 timestamp, so stored values sort lexicographically
pub(crate) fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}
