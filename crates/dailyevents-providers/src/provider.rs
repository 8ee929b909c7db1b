//! CalendarSource trait definition.
//!
//! This module defines the [`CalendarSource`] trait, the seam between the
//! digest pipeline and whatever serves calendar data (the Home Assistant
//! REST API in production, in-memory fakes in tests).

use std::future::Future;
use std::pin::Pin;

use dailyevents_core::{Calendar, CalendarEvent, DigestWindow};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so sources can be held as
/// `Arc<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of calendars and their events.
///
/// # Implementation Notes
///
/// - Each method performs at most one network request.
/// - Implementations must not retry; the caller applies the deadline and
///   decides how to handle failures.
/// - An empty event list is a valid answer, not an error.
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source (e.g., "homeassistant").
    fn name(&self) -> &str;

    /// Lists every calendar the source exposes, in source order.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>>;

    /// Fetches the events of one calendar that fall within `window`.
    fn fetch_events<'a>(
        &'a self,
        calendar: &'a Calendar,
        window: &'a DigestWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;
}
