//! HTTP client for the Home Assistant REST API.
//!
//! This module provides the low-level client that handles:
//! - Bearer token authentication
//! - Per-request deadlines
//! - TLS policy
//! - Mapping of HTTP failures onto [`ProviderErrorCode`](crate::ProviderErrorCode)

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use url::Url;

use dailyevents_core::{Calendar, CalendarEvent, EventTime};

use crate::error::{ProviderError, ProviderResult};

use super::config::HassConfig;

/// HTTP client for Home Assistant.
pub struct HassClient {
    /// The underlying HTTP client, shared by every call of an invocation.
    client: Client,
    /// Configuration.
    config: HassConfig,
}

impl HassClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: HassConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;

        if !config.verify_tls {
            debug!(host = ?config.url.host_str(), "TLS certificate verification disabled");
        }

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HassConfig {
        &self.config
    }

    /// `GET /api/calendars`
    pub async fn get_calendars(&self) -> ProviderResult<Vec<ApiCalendar>> {
        let url = self.api_url("calendars")?;
        self.get_json(url, &[]).await
    }

    /// `GET /api/calendars/{entity_id}?start=..&end=..`
    ///
    /// Bounds are sent as RFC 3339 timestamps with their UTC offset.
    pub async fn get_calendar_events<Tz: TimeZone>(
        &self,
        entity_id: &str,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> ProviderResult<Vec<ApiEvent>>
    where
        Tz::Offset: std::fmt::Display,
    {
        let url = self.api_url(&format!("calendars/{}", urlencoding::encode(entity_id)))?;
        let query = [
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, false)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Secs, false)),
        ];
        self.get_json(url, &query).await
    }

    /// `POST /api/services/{domain}/{service}` with a JSON body.
    pub async fn call_service<B: Serialize + ?Sized>(
        &self,
        domain: &str,
        service: &str,
        body: &B,
    ) -> ProviderResult<()> {
        let url = self.api_url(&format!(
            "services/{}/{}",
            urlencoding::encode(domain),
            urlencoding::encode(service)
        ))?;
        let request = self.client.post(url.clone()).json(body);
        self.execute(&url, request).await.map(|_| ())
    }

    fn api_url(&self, path: &str) -> ProviderResult<Url> {
        self.config.api_url(path).map_err(|e| {
            ProviderError::configuration(format!("invalid API path {:?}: {}", path, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let request = self.client.get(url.clone()).query(query);
        let body = self.execute(&url, request).await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::unknown(format!("failed to parse response from {}: {}", url.path(), e))
                .with_source(e)
        })
    }

    /// Sends a request under the configured deadline and returns the body.
    async fn execute(&self, url: &Url, request: RequestBuilder) -> ProviderResult<String> {
        let request = request.bearer_auth(&self.config.token);

        trace!(path = %url.path(), "Sending request");

        let exchange = async {
            let response = request.send().await?;
            let response = handle_status(response).await?;
            response.text().await.map_err(ProviderError::from)
        };

        match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(format!(
                "no response from {} within {:?}",
                url.path(),
                self.config.timeout
            ))),
        }
    }
}

/// Maps non-success statuses onto transport errors.
async fn handle_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::transport(
            format!("access token rejected ({})", status),
        )),
        StatusCode::NOT_FOUND => Err(ProviderError::transport(format!(
            "resource not found: {}",
            response.url().path()
        ))),
        s => {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %s, body = %body, "Unexpected response status");
            Err(ProviderError::transport(format!(
                "unexpected status {}: {}",
                s, body
            )))
        }
    }
}

/// A calendar entry from `GET /api/calendars`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiCalendar {
    /// The calendar entity ID (e.g., `calendar.work`).
    pub entity_id: String,
    /// Friendly name.
    #[serde(default)]
    pub name: String,
}

impl From<ApiCalendar> for Calendar {
    fn from(api: ApiCalendar) -> Self {
        let display_name = if api.name.trim().is_empty() {
            api.entity_id.clone()
        } else {
            api.name
        };
        Calendar::new(api.entity_id, display_name)
    }
}

/// An event from `GET /api/calendars/{entity_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    #[serde(default)]
    pub summary: Option<String>,
    pub start: ApiEventTime,
}

/// Event start from the API: either `dateTime` or `date`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl ApiEvent {
    /// Converts to a [`CalendarEvent`], skipping events with no usable start.
    pub fn into_event(self, calendar_id: &str) -> Option<CalendarEvent> {
        let summary = self.summary.unwrap_or_default();

        let start = match (self.start.date_time, self.start.date) {
            (Some(dt), _) => match DateTime::parse_from_rfc3339(&dt) {
                Ok(parsed) => EventTime::from_local(parsed),
                Err(e) => {
                    warn!(calendar = %calendar_id, summary = %summary, "failed to parse start time: {}", e);
                    return None;
                }
            },
            (None, Some(date)) => match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                Ok(parsed) => EventTime::from_date(parsed),
                Err(e) => {
                    warn!(calendar = %calendar_id, summary = %summary, "failed to parse start date: {}", e);
                    return None;
                }
            },
            (None, None) => {
                warn!(calendar = %calendar_id, summary = %summary, "event has no start time");
                return None;
            }
        };

        Some(CalendarEvent::new(summary, start))
    }
}
