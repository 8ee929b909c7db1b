//! Home Assistant calendar source.
//!
//! This module implements [`CalendarSource`] on top of the Home Assistant
//! calendar REST endpoints.

use std::sync::Arc;

use tracing::debug;

use dailyevents_core::{Calendar, CalendarEvent, DigestWindow};

use crate::error::ProviderResult;
use crate::provider::{BoxFuture, CalendarSource};

use super::client::HassClient;
use super::config::HassConfig;

/// Source name reported in logs and errors.
pub const PROVIDER_NAME: &str = "homeassistant";

/// Calendar source backed by a Home Assistant instance.
pub struct HassProvider {
    client: Arc<HassClient>,
}

impl HassProvider {
    /// Creates a provider with its own HTTP client.
    pub fn new(config: HassConfig) -> ProviderResult<Self> {
        let client = HassClient::new(config).map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(Self::from_client(Arc::new(client)))
    }

    /// Creates a provider sharing an existing client.
    pub fn from_client(client: Arc<HassClient>) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Arc<HassClient> {
        &self.client
    }
}

impl CalendarSource for HassProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>> {
        Box::pin(async move {
            let calendars = self
                .client
                .get_calendars()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))?;

            debug!(count = calendars.len(), "Listed calendars");
            Ok(calendars.into_iter().map(Calendar::from).collect())
        })
    }

    fn fetch_events<'a>(
        &'a self,
        calendar: &'a Calendar,
        window: &'a DigestWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let events = self
                .client
                .get_calendar_events(&calendar.id, &window.start, &window.end)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))?;

            let total = events.len();
            let events: Vec<CalendarEvent> = events
                .into_iter()
                .filter_map(|e| e.into_event(&calendar.id))
                .collect();

            debug!(
                calendar = %calendar.id,
                total,
                kept = events.len(),
                "Fetched events"
            );
            Ok(events)
        })
    }
}
