//! Calendar fetching pipeline.
//!
//! [`CalendarFetcher`] drives a [`CalendarSource`] through one invocation:
//! list the calendars, drop the excluded ones, then fetch the events of
//! each remaining calendar. Every call runs under its own deadline.
//!
//! Listing is all-or-nothing; a failed listing is returned to the caller.
//! Event fetches degrade per calendar: a failure is logged, recorded in
//! [`FetchOutcome::failures`] and the other calendars are still fetched.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{Instrument, debug, info_span, warn};

use dailyevents_core::{Calendar, CalendarEvent, DigestWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::CalendarSource;

/// Removes every calendar whose id is in `excluded`.
///
/// Returns a new vector with the remaining calendars in their original
/// order. Ids in `excluded` that match nothing are ignored.
pub fn exclude_calendars(calendars: Vec<Calendar>, excluded: &HashSet<String>) -> Vec<Calendar> {
    calendars
        .into_iter()
        .filter(|calendar| !excluded.contains(&calendar.id))
        .collect()
}

/// A calendar whose event fetch failed.
#[derive(Debug)]
pub struct CalendarFailure {
    pub calendar: Calendar,
    pub error: ProviderError,
}

/// Result of fetching all calendars for one window.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Calendars that were fetched successfully, in listing order.
    pub entries: Vec<(Calendar, Vec<CalendarEvent>)>,
    /// Calendars whose fetch failed, in listing order.
    pub failures: Vec<CalendarFailure>,
}

impl FetchOutcome {
    /// Returns true if at least one calendar could not be fetched.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total number of events across all fetched calendars.
    pub fn event_count(&self) -> usize {
        self.entries.iter().map(|(_, events)| events.len()).sum()
    }
}

/// Fetches calendars and their events from a [`CalendarSource`].
pub struct CalendarFetcher {
    source: Arc<dyn CalendarSource>,
    timeout: Duration,
    concurrency: usize,
}

impl CalendarFetcher {
    /// Default per-call deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default number of event fetches in flight (sequential).
    pub const DEFAULT_CONCURRENCY: usize = 1;

    /// Creates a fetcher with the default deadline and sequential fetches.
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self {
            source,
            timeout: Self::DEFAULT_TIMEOUT,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the deadline applied to each call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many event fetches may be in flight at once. Values below
    /// one are clamped to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &Arc<dyn CalendarSource> {
        &self.source
    }

    /// Lists every calendar of the source.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<Calendar>> {
        self.with_deadline("calendar listing", self.source.list_calendars())
            .await
    }

    /// Fetches the events of one calendar within `window`.
    pub async fn fetch_events(
        &self,
        calendar: &Calendar,
        window: &DigestWindow,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        self.with_deadline(
            &format!("events of {}", calendar.id),
            self.source.fetch_events(calendar, window),
        )
        .await
    }

    /// Runs the whole pipeline: list, exclude, fetch each calendar.
    ///
    /// # Errors
    ///
    /// Returns an error only if the calendar listing fails. Per-calendar
    /// failures are reported through [`FetchOutcome::failures`].
    pub async fn fetch(
        &self,
        window: &DigestWindow,
        excluded: &HashSet<String>,
    ) -> ProviderResult<FetchOutcome> {
        let listed = self.list_calendars().await?;
        let listed_count = listed.len();
        let calendars = exclude_calendars(listed, excluded);

        debug!(
            listed = listed_count,
            excluded = listed_count - calendars.len(),
            remaining = calendars.len(),
            "Resolved calendars"
        );

        // `buffered` yields results in input order whatever the width.
        let results: Vec<(Calendar, ProviderResult<Vec<CalendarEvent>>)> =
            stream::iter(calendars)
                .map(|calendar| async move {
                    let span = info_span!("fetch_events", calendar = %calendar.id);
                    let result = self.fetch_events(&calendar, window).instrument(span).await;
                    (calendar, result)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut outcome = FetchOutcome::default();
        for (calendar, result) in results {
            match result {
                Ok(events) => {
                    debug!(calendar = %calendar.id, count = events.len(), "Fetched calendar");
                    outcome.entries.push((calendar, events));
                }
                Err(error) => {
                    warn!(
                        calendar = %calendar.id,
                        kind = %error.code(),
                        error = %error,
                        "Failed to fetch calendar events, skipping"
                    );
                    outcome.failures.push(CalendarFailure { calendar, error });
                }
            }
        }

        Ok(outcome)
    }

    async fn with_deadline<T>(
        &self,
        what: &str,
        call: impl Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(format!(
                "{} did not complete within {:?}",
                what, self.timeout
            ))
            .with_provider(self.source.name())),
        }
    }
}
