use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::core::{AppError, Result};

/// Business calendar used to decide what "today" is for due dates.
///
/// Timestamps are stored as UTC; due dates are calendar dates in the firm's
/// local offset (Bogotá, UTC-5, has no daylight saving).
#[derive(Debug, Clone, Copy)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    pub fn from_utc_offset_hours(hours: i32) -> Result<Self> {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::Configuration(format!("Invalid business UTC offset: {} hours", hours))
            })?;
        Ok(Self { offset })
    }

    /// Local calendar date of a UTC instant
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Current UTC timestamp in the naive form stored in DATETIME columns
    pub fn now_utc(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self {
            offset: FixedOffset::west_opt(5 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}
