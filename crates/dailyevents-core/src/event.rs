//! Calendar and event types.
//!
//! - [`Calendar`]: a calendar resource exposed by the calendar source
//! - [`CalendarEvent`]: one event of a calendar, timed or all-day

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// A calendar resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Calendar {
    /// Unique identifier (e.g., `calendar.work`).
    pub id: String,
    /// Human-readable name used as the digest section header.
    pub display_name: String,
}

impl Calendar {
    /// Creates a new calendar.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A calendar event as it appears in a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event title.
    pub summary: String,
    /// Event start, either a specific instant or an all-day date.
    pub start: EventTime,
}

impl CalendarEvent {
    /// Creates a new event.
    pub fn new(summary: impl Into<String>, start: EventTime) -> Self {
        Self {
            summary: summary.into(),
            start,
        }
    }

    /// Returns `true` if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn calendar_new() {
        let cal = Calendar::new("calendar.work", "Work");
        assert_eq!(cal.id, "calendar.work");
        assert_eq!(cal.display_name, "Work");
    }

    #[test]
    fn event_kinds() {
        let timed = CalendarEvent::new(
            "Standup",
            EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()),
        );
        assert!(!timed.is_all_day());

        let all_day = CalendarEvent::new(
            "Holiday",
            EventTime::from_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        );
        assert!(all_day.is_all_day());
    }
}
