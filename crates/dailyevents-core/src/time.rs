//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing event start times
//! (which may be either a specific datetime or an all-day date), and
//! [`DigestWindow`] for the day range a digest covers.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Represents the start of a calendar event.
///
/// Calendar events can have two types of times:
/// - **DateTime**: A specific point in time (with timezone, stored as UTC)
/// - **AllDay**: A date without a specific time (all-day events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::DateTime` from a datetime in any timezone.
    pub fn from_local<Z: TimeZone>(dt: DateTime<Z>) -> Self {
        Self::DateTime(dt.with_timezone(&Utc))
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the datetime if this is a `DateTime` variant.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the date if this is an `AllDay` variant.
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Self::AllDay(d) => Some(d),
            Self::DateTime(_) => None,
        }
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// For all-day events, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns the calendar date of this event time as seen in `tz`.
    ///
    /// All-day dates are returned as-is; they carry no timezone.
    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.with_timezone(tz).date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// The day range covered by one digest.
///
/// Represents a half-open interval `[start, end)` of whole local days in
/// the configured timezone. Both bounds are local midnights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestWindow {
    /// Start of the window (inclusive), local midnight.
    pub start: DateTime<Tz>,
    /// End of the window (exclusive), local midnight `days` later.
    pub end: DateTime<Tz>,
    /// Number of calendar days covered, always at least 1.
    pub days: u32,
}

impl DigestWindow {
    /// Window length used when none is configured.
    pub const DEFAULT_DAYS: u32 = 1;

    /// Longest window, one leap year.
    pub const MAX_DAYS: u32 = 366;

    /// Builds the window starting at today's local midnight in `tz`.
    ///
    /// A `days` value of 0 is treated as [`Self::DEFAULT_DAYS`]; values
    /// above [`Self::MAX_DAYS`] are clamped to it. The end
    /// bound is computed on the local calendar, so a window spanning a DST
    /// change is 23 or 25 hours long per affected day.
    pub fn build(now: DateTime<Utc>, tz: Tz, days: u32) -> Self {
        let days = match days {
            0 => Self::DEFAULT_DAYS,
            d => d.min(Self::MAX_DAYS),
        };
        let today = now.with_timezone(&tz).date_naive();
        let last = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        Self {
            start: local_midnight(today, &tz),
            end: local_midnight(last, &tz),
            days,
        }
    }

    /// Returns `true` if this window covers exactly one day.
    pub fn is_single_day(&self) -> bool {
        self.days == 1
    }

    /// Returns the timezone of the window.
    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    /// First local date in the window.
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Last local date in the window (inclusive).
    pub fn last_date(&self) -> NaiveDate {
        self.end
            .date_naive()
            .pred_opt()
            .unwrap_or_else(|| self.start_date())
    }
}

/// Resolves local midnight of `date` in `tz`.
///
/// Ambiguous midnights pick the earlier instant. When midnight falls in a
/// DST gap, the first representable instant of the day is used instead.
pub(crate) fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt;
    }
    (1..=4)
        .map(|h| midnight + Duration::minutes(30 * h))
        .find_map(|candidate: NaiveDateTime| tz.from_local_datetime(&candidate).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}
