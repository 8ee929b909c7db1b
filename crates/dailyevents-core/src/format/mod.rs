//! Digest formatting for calendar events.
//!
//! This module turns per-calendar event lists into the single notification
//! string sent for one invocation:
//!
//! ```text
//! Work:
//! - Standup at 09:00 AM
//! - Planning on Tue, Jan 02 2024 at 02:00 PM
//! Family:
//! - Birthday on Wed, Jan 03 2024
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use chrono_tz::Tz;
//! use dailyevents_core::{Calendar, CalendarEvent, DigestFormatter, DigestOptions, DigestWindow, EventTime};
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
//! let window = DigestWindow::build(now, Tz::UTC, 1);
//! let formatter = DigestFormatter::new(DigestOptions::default()).unwrap();
//!
//! let standup = CalendarEvent::new(
//!     "Standup",
//!     EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()),
//! );
//! let entries = vec![(Calendar::new("calendar.work", "Work"), vec![standup])];
//!
//! assert_eq!(
//!     formatter.build_digest(&entries, &window),
//!     "Work:\n- Standup at 09:00 AM\n"
//! );
//! ```

use std::fmt::Write;

use chrono::{
    DateTime, NaiveDate, Utc,
    format::{Item, StrftimeItems},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Calendar, CalendarEvent};
use crate::time::{DigestWindow, EventTime, local_midnight};

/// Default date pattern: abbreviated weekday, month, day, year.
pub const DEFAULT_DATE_FORMAT: &str = "%a, %b %d %Y";

/// Default time pattern: 12-hour clock with AM/PM.
pub const DEFAULT_TIME_FORMAT: &str = "%I:%M %p";

/// Errors raised while setting up digest formatting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A strftime pattern contains an unknown or incomplete specifier.
    #[error("invalid {field} pattern {pattern:?}")]
    InvalidPattern {
        /// Which option carried the pattern (`date_format`, `time_format`).
        field: &'static str,
        /// The rejected pattern.
        pattern: String,
    },

    /// The timezone identifier is not a known IANA zone.
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

/// Configuration options for digest formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestOptions {
    /// strftime pattern for dates.
    pub date_format: String,
    /// strftime pattern for times of day.
    pub time_format: String,
    /// Sort each calendar's events by start before rendering.
    ///
    /// Off by default: events are listed in the order the source returned
    /// them.
    pub sort_by_start: bool,
}

impl Default for DigestOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            sort_by_start: false,
        }
    }
}

impl DigestOptions {
    /// Builder: set the date pattern.
    #[must_use]
    pub fn with_date_format(mut self, pattern: impl Into<String>) -> Self {
        self.date_format = pattern.into();
        self
    }

    /// Builder: set the time pattern.
    #[must_use]
    pub fn with_time_format(mut self, pattern: impl Into<String>) -> Self {
        self.time_format = pattern.into();
        self
    }

    /// Builder: enable sorting by start.
    #[must_use]
    pub fn with_sort_by_start(mut self, sort: bool) -> Self {
        self.sort_by_start = sort;
        self
    }

    /// Checks both patterns.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidPattern`] for the first bad pattern.
    pub fn validate(&self) -> Result<(), FormatError> {
        validate_pattern("date_format", &self.date_format)?;
        validate_pattern("time_format", &self.time_format)
    }
}

/// Rejects strftime patterns chrono cannot render.
///
/// Rendering an invalid pattern panics inside `Display`, so patterns are
/// checked once up front. Some specifiers (e.g. `%#z`) parse but only work
/// for parsing, so the pattern is also rendered against a sample instant.
pub fn validate_pattern(field: &'static str, pattern: &str) -> Result<(), FormatError> {
    let invalid = || FormatError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
    };

    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let sample = DateTime::<Utc>::UNIX_EPOCH.with_timezone(&chrono_tz::Tz::UTC);
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(pattern)).map_err(|_| invalid())?;
    Ok(())
}

/// Parses an IANA timezone identifier (e.g., `Europe/Paris`).
pub fn parse_timezone(name: &str) -> Result<chrono_tz::Tz, FormatError> {
    name.trim()
        .parse()
        .map_err(|_| FormatError::UnknownTimezone(name.to_string()))
}

/// Renders calendar events into a digest.
#[derive(Debug, Clone)]
pub struct DigestFormatter {
    options: DigestOptions,
}

impl DigestFormatter {
    /// Creates a new formatter after validating the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidPattern`] if either pattern is invalid.
    pub fn new(options: DigestOptions) -> Result<Self, FormatError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Returns the formatting options.
    pub fn options(&self) -> &DigestOptions {
        &self.options
    }

    /// Renders one event line (without the bullet).
    ///
    /// Timed events are shown in the window's timezone. The date is only
    /// included when the window spans more than one day.
    pub fn render_event(&self, event: &CalendarEvent, window: &DigestWindow) -> String {
        let tz = window.timezone();
        match &event.start {
            EventTime::DateTime(dt) => {
                let local = dt.with_timezone(&tz);
                let time = local.format(&self.options.time_format);
                if window.is_single_day() {
                    format!("{} at {}", event.summary, time)
                } else {
                    let date = local.format(&self.options.date_format);
                    format!("{} on {} at {}", event.summary, date, time)
                }
            }
            EventTime::AllDay(date) => {
                if window.is_single_day() {
                    event.summary.clone()
                } else {
                    format!("{} on {}", event.summary, self.format_date(*date, window))
                }
            }
        }
    }

    /// Renders the section for one calendar.
    ///
    /// Returns `None` when the calendar has no events, so it is left out
    /// of the digest entirely.
    pub fn render_calendar_section(
        &self,
        calendar: &Calendar,
        events: &[CalendarEvent],
        window: &DigestWindow,
    ) -> Option<String> {
        if events.is_empty() {
            return None;
        }

        let mut ordered: Vec<&CalendarEvent> = events.iter().collect();
        if self.options.sort_by_start {
            let tz = window.timezone();
            ordered.sort_by_key(|e| (e.start.local_date(&tz), !e.is_all_day(), e.start.clone()));
        }

        let mut section = format!("{}:\n", calendar.display_name);
        for event in ordered {
            section.push_str("- ");
            section.push_str(&self.render_event(event, window));
            section.push('\n');
        }
        Some(section)
    }

    /// Builds the full digest in the order calendars are supplied.
    ///
    /// Falls back to [`no_activities_message`] when no calendar produced a
    /// section.
    pub fn build_digest(
        &self,
        entries: &[(Calendar, Vec<CalendarEvent>)],
        window: &DigestWindow,
    ) -> String {
        let digest: String = entries
            .iter()
            .filter_map(|(calendar, events)| self.render_calendar_section(calendar, events, window))
            .collect();

        if digest.is_empty() {
            no_activities_message(window)
        } else {
            digest
        }
    }

    /// Formats an all-day date without converting it.
    fn format_date(&self, date: NaiveDate, window: &DigestWindow) -> String {
        // Anchored at local midnight so every specifier has a value.
        local_midnight(date, &window.timezone())
            .format(&self.options.date_format)
            .to_string()
    }
}

/// Message used when the window contains no events at all.
pub fn no_activities_message(window: &DigestWindow) -> String {
    if window.is_single_day() {
        format!("No Activities for Today {}", window.start_date())
    } else {
        format!(
            "No Activities for {} - {}",
            window.start_date(),
            window.last_date()
        )
    }
}
