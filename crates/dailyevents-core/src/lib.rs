//! Core types: calendars, events, digest windows, formatting

pub mod event;
pub mod format;
pub mod time;
pub mod tracing;

pub use event::{Calendar, CalendarEvent};
pub use format::{
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, DigestFormatter, DigestOptions, FormatError,
    no_activities_message, parse_timezone, validate_pattern,
};
pub use time::{DigestWindow, EventTime};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
