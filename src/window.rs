//! Calendar window resolution.
//!
//! A [`TimeWindow`] is an inclusive pair of local calendar days plus a fixed
//! UTC offset. All timezone arithmetic lives here; request builders only ever
//! see the already-formatted expressions returned by the methods below.

use crate::errors::{AppError, AppResult};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Largest accepted offset magnitude, in hours.
pub const MAX_OFFSET_HOURS: i32 = 23;

/// Inclusive local calendar range with a fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDate,
    end: NaiveDate,
    offset_hours: i32,
}

/// UTC bounds at minute granularity, covering local `start 00:00` to local `end 23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcMinuteRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl UtcMinuteRange {
    pub fn start_str(&self) -> String {
        self.start.format(MINUTE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(MINUTE_FORMAT).to_string()
    }
}

impl fmt::Display for UtcMinuteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_str(), self.end_str())
    }
}

impl TimeWindow {
    /// Builds a window from two calendar days.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` when `end` precedes `start`, and `InvalidInput`
    /// when the offset is outside `-23..=23` hours.
    pub fn new(start: NaiveDate, end: NaiveDate, offset_hours: i32) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        if offset_hours.abs() > MAX_OFFSET_HOURS {
            return Err(AppError::InvalidInput(format!(
                "UTC offset must be within -{MAX_OFFSET_HOURS}..={MAX_OFFSET_HOURS} hours, got: {offset_hours}"
            )));
        }
        Ok(Self {
            start,
            end,
            offset_hours,
        })
    }

    /// Parses `YYYY-MM-DD` strings and builds the window.
    pub fn parse(start: &str, end: &str, offset_hours: i32) -> AppResult<Self> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        Self::new(start_date, end_date, offset_hours)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn offset_hours(&self) -> i32 {
        self.offset_hours
    }

    /// Local `start 00:00` and local `end 23:59` shifted to UTC.
    pub fn utc_minute_bounds(&self) -> UtcMinuteRange {
        let shift = Duration::hours(i64::from(self.offset_hours));
        let local_start = self.start.and_time(NaiveTime::MIN);
        let local_end = self.end.and_time(NaiveTime::MIN) + Duration::minutes(24 * 60 - 1);
        UtcMinuteRange {
            start: local_start - shift,
            end: local_end - shift,
        }
    }

    /// The UTC bounds as an ascending `"START..END"` string.
    pub fn utc_minute_range(&self) -> String {
        self.utc_minute_bounds().to_string()
    }

    /// Raw local dates, unconverted, for date-only comparisons.
    pub fn local_date_bounds(&self) -> (String, String) {
        (
            self.start.format(DATE_FORMAT).to_string(),
            self.end.format(DATE_FORMAT).to_string(),
        )
    }

    /// Offset-aware ISO timestamps: `startT00:00:00+HH:MM` and `endT23:59:59+HH:MM`.
    pub fn offset_timestamps(&self) -> (String, String) {
        let (start, end) = self.local_date_bounds();
        let suffix = self.offset_suffix();
        (
            format!("{start}T00:00:00{suffix}"),
            format!("{end}T23:59:59{suffix}"),
        )
    }

    fn offset_suffix(&self) -> String {
        let sign = if self.offset_hours < 0 { '-' } else { '+' };
        format!("{sign}{:02}:00", self.offset_hours.abs())
    }
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        AppError::InvalidInput(format!("Date must be YYYY-MM-DD, got: {value} ({e})"))
    })
}
