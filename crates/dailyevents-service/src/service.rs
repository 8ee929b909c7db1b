//! The digest pipeline.
//!
//! One call to [`DailyEventsService::notify`] runs the whole invocation:
//! fetch calendars, exclude, fetch events, build the digest, dispatch.
//! Nothing is kept between invocations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use dailyevents_core::{Calendar, DigestFormatter, DigestWindow};
use dailyevents_providers::homeassistant::{HassClient, HassProvider};
use dailyevents_providers::{CalendarFailure, CalendarFetcher, CalendarSource, ProviderErrorCode};

use crate::config::ServiceConfig;
use crate::dispatch::{ChannelFailure, Dispatcher, NotificationSink, build_sinks};
use crate::error::{ServiceError, ServiceResult};

/// Parameters of one notify invocation.
#[derive(Debug, Clone, Default)]
pub struct NotifyRequest {
    /// Overrides the configured window length for this invocation.
    pub num_of_days: Option<u32>,
}

impl NotifyRequest {
    /// Builder: set the window length.
    pub fn with_num_of_days(mut self, days: u32) -> Self {
        self.num_of_days = Some(days);
        self
    }
}

/// A built digest, ready to dispatch.
#[derive(Debug)]
pub struct Digest {
    /// Message text.
    pub message: String,
    /// Window the digest covers.
    pub window: DigestWindow,
    /// Number of events rendered.
    pub event_count: usize,
    /// Calendars left out because their fetch failed.
    pub failed_calendars: Vec<CalendarFailure>,
}

impl Digest {
    /// Returns true if some calendars are missing from the message.
    pub fn is_degraded(&self) -> bool {
        !self.failed_calendars.is_empty()
    }
}

/// Result of a notify invocation.
#[derive(Debug)]
pub struct NotifyOutcome {
    pub digest: Digest,
    /// Channels that received the digest.
    pub delivered_channels: Vec<String>,
    /// Channels that failed, with their errors.
    pub failed_channels: Vec<ChannelFailure>,
}

impl NotifyOutcome {
    /// Returns true if no channel received the digest.
    pub fn all_channels_failed(&self) -> bool {
        self.delivered_channels.is_empty() && !self.failed_channels.is_empty()
    }
}

/// A calendar as listed by the source, with its exclusion status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarListing {
    pub calendar: Calendar,
    pub excluded: bool,
}

/// Fetches, formats and dispatches daily event digests.
pub struct DailyEventsService {
    config: ServiceConfig,
    fetcher: CalendarFetcher,
    formatter: DigestFormatter,
    dispatcher: Dispatcher,
}

impl DailyEventsService {
    /// Creates a service talking to the configured Home Assistant instance.
    ///
    /// One HTTP client is shared by the calendar source and the notify
    /// channels.
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let client = Arc::new(HassClient::new(config.hass.clone())?);
        let source = Arc::new(HassProvider::from_client(client.clone()));
        let sinks = build_sinks(&config.channels, &client, &config.desktop);

        Self::with_parts(config, source, sinks)
    }

    /// Creates a service over an arbitrary source and sinks.
    pub fn with_parts(
        config: ServiceConfig,
        source: Arc<dyn CalendarSource>,
        sinks: Vec<Box<dyn NotificationSink>>,
    ) -> ServiceResult<Self> {
        config.validate()?;

        let formatter = DigestFormatter::new(config.digest.clone())?;
        let fetcher = CalendarFetcher::new(source)
            .with_timeout(config.timeout())
            .with_concurrency(config.concurrency);

        Ok(Self {
            config,
            fetcher,
            formatter,
            dispatcher: Dispatcher::new(sinks),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Channels the digest is sent to, in order.
    pub fn channels(&self) -> Vec<&str> {
        self.dispatcher.channels()
    }

    /// Computes the window for an invocation at `now`.
    pub fn window(&self, now: DateTime<Utc>, num_of_days: Option<u32>) -> DigestWindow {
        let days = num_of_days.unwrap_or(self.config.num_of_days);
        DigestWindow::build(now, self.config.timezone, days)
    }

    /// Lists every calendar of the source, marking excluded ones.
    pub async fn list_calendars(&self) -> ServiceResult<Vec<CalendarListing>> {
        let calendars = self
            .fetcher
            .list_calendars()
            .await
            .map_err(ServiceError::CalendarsUnavailable)?;

        Ok(calendars
            .into_iter()
            .map(|calendar| CalendarListing {
                excluded: self.config.exclude.contains(&calendar.id),
                calendar,
            })
            .collect())
    }

    /// Builds the digest for an invocation at `now` without dispatching it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CalendarsUnavailable`] if the calendar list
    /// cannot be fetched. Failures of individual calendars are recorded in
    /// [`Digest::failed_calendars`] instead.
    pub async fn prepare_digest(
        &self,
        now: DateTime<Utc>,
        request: &NotifyRequest,
    ) -> ServiceResult<Digest> {
        let window = self.window(now, request.num_of_days);
        debug!(
            start = %window.start,
            end = %window.end,
            days = window.days,
            "Building digest"
        );

        let outcome = self
            .fetcher
            .fetch(&window, &self.config.exclude)
            .await
            .map_err(ServiceError::CalendarsUnavailable)?;

        if outcome.is_degraded() {
            let failed: Vec<&str> = outcome
                .failures
                .iter()
                .map(|f| f.calendar.id.as_str())
                .collect();
            let timeouts = outcome
                .failures
                .iter()
                .filter(|f| f.error.code() == ProviderErrorCode::Timeout)
                .count();
            warn!(
                failed = ?failed,
                timeouts,
                "Digest is missing calendars"
            );
        }

        let message = self.formatter.build_digest(&outcome.entries, &window);

        Ok(Digest {
            message,
            window,
            event_count: outcome.event_count(),
            failed_calendars: outcome.failures,
        })
    }

    /// Runs a full invocation at the current time.
    pub async fn notify(&self, request: NotifyRequest) -> ServiceResult<NotifyOutcome> {
        self.notify_at(Utc::now(), request).await
    }

    /// Runs a full invocation as if it were `now`.
    pub async fn notify_at(
        &self,
        now: DateTime<Utc>,
        request: NotifyRequest,
    ) -> ServiceResult<NotifyOutcome> {
        let digest = self.prepare_digest(now, &request).await?;
        let report = self.dispatcher.dispatch(&digest.message).await;

        info!(
            events = digest.event_count,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Digest dispatched"
        );

        Ok(NotifyOutcome {
            digest,
            delivered_channels: report.delivered,
            failed_channels: report.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use chrono::TimeZone;
    use dailyevents_core::{CalendarEvent, EventTime};
    use dailyevents_providers::homeassistant::HassConfig;
    use dailyevents_providers::{BoxFuture, ProviderError, ProviderResult};

    use crate::error::DispatchError;

    #[derive(Default)]
    struct FakeSource {
        calendars: Vec<Calendar>,
        events: HashMap<String, Vec<CalendarEvent>>,
        hanging: HashSet<String>,
        unavailable: bool,
    }

    impl CalendarSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<Calendar>>> {
            let result = if self.unavailable {
                Err(ProviderError::transport("connection refused"))
            } else {
                Ok(self.calendars.clone())
            };
            Box::pin(async move { result })
        }

        fn fetch_events<'a>(
            &'a self,
            calendar: &'a Calendar,
            _window: &'a DigestWindow,
        ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
            Box::pin(async move {
                if self.hanging.contains(&calendar.id) {
                    std::future::pending::<()>().await;
                }
                Ok(self.events.get(&calendar.id).cloned().unwrap_or_default())
            })
        }
    }

    struct FakeSink {
        channel: String,
        fail: bool,
        received: Arc<Mutex<Vec<String>>>,
    }

    impl NotificationSink for FakeSink {
        fn channel(&self) -> &str {
            &self.channel
        }

        fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), DispatchError>> {
            self.received.lock().unwrap().push(message.to_string());
            let result = if self.fail {
                Err(DispatchError::Desktop("no notification daemon".into()))
            } else {
                Ok(())
            };
            Box::pin(async move { result })
        }
    }

    fn config() -> ServiceConfig {
        ServiceConfig::new(HassConfig::new("http://192.168.1.10:8123", "token").unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> EventTime {
        EventTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap())
    }

    fn work_source() -> FakeSource {
        let mut source = FakeSource {
            calendars: vec![
                Calendar::new("calendar.work", "Work"),
                Calendar::new("calendar.family", "Family"),
            ],
            ..Default::default()
        };
        source.events.insert(
            "calendar.work".into(),
            vec![CalendarEvent::new("Standup", at(9, 0))],
        );
        source
    }

    fn service_with(
        config: ServiceConfig,
        source: FakeSource,
        sinks: &[(&str, bool)],
    ) -> (DailyEventsService, Arc<Mutex<Vec<String>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sinks = sinks
            .iter()
            .map(|(channel, fail)| -> Box<dyn NotificationSink> {
                Box::new(FakeSink {
                    channel: channel.to_string(),
                    fail: *fail,
                    received: received.clone(),
                })
            })
            .collect();
        let service = DailyEventsService::with_parts(config, Arc::new(source), sinks).unwrap();
        (service, received)
    }

    #[tokio::test]
    async fn notify_dispatches_digest() {
        let (service, received) = service_with(config(), work_source(), &[("phone", false)]);

        let outcome = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome.digest.message, "Work:\n- Standup at 09:00 AM\n");
        assert_eq!(outcome.digest.event_count, 1);
        assert_eq!(outcome.delivered_channels, vec!["phone"]);
        assert!(!outcome.all_channels_failed());
        assert_eq!(
            *received.lock().unwrap(),
            vec!["Work:\n- Standup at 09:00 AM\n".to_string()]
        );
    }

    #[tokio::test]
    async fn request_overrides_window_length() {
        let source = FakeSource {
            calendars: vec![Calendar::new("calendar.empty", "Empty")],
            ..Default::default()
        };
        let (service, _) = service_with(config(), source, &[("phone", false)]);

        let outcome = service
            .notify_at(now(), NotifyRequest::default().with_num_of_days(3))
            .await
            .unwrap();

        assert_eq!(
            outcome.digest.message,
            "No Activities for 2024-01-01 - 2024-01-03"
        );
        assert_eq!(outcome.digest.window.days, 3);
    }

    #[tokio::test]
    async fn excluded_calendar_leaves_no_activities() {
        let config = config().with_exclude(["calendar.work"]);
        let (service, _) = service_with(config, work_source(), &[("phone", false)]);

        let digest = service
            .prepare_digest(now(), &NotifyRequest::default())
            .await
            .unwrap();
        assert_eq!(digest.message, "No Activities for Today 2024-01-01");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_calendar_degrades_digest() {
        let mut source = work_source();
        source.hanging.insert("calendar.family".into());
        let (service, received) = service_with(config(), source, &[("phone", false)]);

        let outcome = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap();

        assert!(outcome.digest.is_degraded());
        assert_eq!(outcome.digest.failed_calendars.len(), 1);
        assert_eq!(
            outcome.digest.failed_calendars[0].calendar.id,
            "calendar.family"
        );
        assert!(outcome.digest.failed_calendars[0].error.is_timeout());
        assert_eq!(received.lock().unwrap()[0], "Work:\n- Standup at 09:00 AM\n");
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_dispatch() {
        let source = FakeSource {
            unavailable: true,
            ..Default::default()
        };
        let (service, received) = service_with(config(), source, &[("phone", false)]);

        let err = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::CalendarsUnavailable(_)));
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn channel_failures_are_collected() {
        let (service, received) = service_with(
            config(),
            work_source(),
            &[("desktop", true), ("phone", false)],
        );

        let outcome = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap();

        assert_eq!(outcome.delivered_channels, vec!["phone"]);
        assert_eq!(outcome.failed_channels.len(), 1);
        assert_eq!(outcome.failed_channels[0].channel, "desktop");
        assert_eq!(received.lock().unwrap().len(), 2);

        let (service, _) = service_with(config(), work_source(), &[("desktop", true)]);
        let outcome = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap();
        assert!(outcome.all_channels_failed());
    }

    #[tokio::test]
    async fn list_calendars_marks_excluded() {
        let config = config().with_exclude(["calendar.family"]);
        let (service, _) = service_with(config, work_source(), &[("phone", false)]);

        let listing = service.list_calendars().await.unwrap();
        let flags: Vec<_> = listing
            .iter()
            .map(|l| (l.calendar.id.as_str(), l.excluded))
            .collect();
        assert_eq!(
            flags,
            vec![("calendar.work", false), ("calendar.family", true)]
        );
    }

    #[test]
    fn window_uses_configured_timezone() {
        let config = config()
            .with_timezone(chrono_tz::America::New_York)
            .with_num_of_days(2);
        let (service, _) = service_with(config, FakeSource::default(), &[("phone", false)]);

        // 03:00 UTC is still Dec 31 in New York.
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let window = service.window(early, None);
        assert_eq!(window.start_date().to_string(), "2023-12-31");
        assert_eq!(window.days, 2);
        assert_eq!(service.channels(), vec!["phone"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = config().with_channels(Vec::<String>::new());
        let source = Arc::new(FakeSource::default());
        let result = DailyEventsService::with_parts(config, source, vec![]);
        assert!(matches!(result, Err(ServiceError::Config { .. })));

        let config = self::config().with_concurrency(0);
        assert!(matches!(
            DailyEventsService::new(config),
            Err(ServiceError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn end_to_end_against_rest_api() {
        let mut server = mockito::Server::new_async().await;
        let _calendars = server
            .mock("GET", "/api/calendars")
            .with_status(200)
            .with_body(r#"[{"entity_id": "calendar.work", "name": "Work"}]"#)
            .create_async()
            .await;
        let _events = server
            .mock("GET", "/api/calendars/calendar.work")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"summary": "Standup", "start": {"dateTime": "2024-01-01T09:00:00+00:00"}}]"#,
            )
            .create_async()
            .await;
        let notify = server
            .mock("POST", "/api/services/notify/mobile_app_phone")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"message": "Work:\n- Standup at 09:00 AM\n"}),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let config = ServiceConfig::new(HassConfig::new(server.url(), "token").unwrap())
            .with_channels(["notify.mobile_app_phone"]);
        let service = DailyEventsService::new(config).unwrap();

        let outcome = service
            .notify_at(now(), NotifyRequest::default())
            .await
            .unwrap();
        assert_eq!(outcome.delivered_channels, vec!["notify.mobile_app_phone"]);
        notify.assert_async().await;
    }
}
