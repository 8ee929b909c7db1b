//! Notification dispatch.
//!
//! A digest is delivered to every configured channel. The `desktop` channel
//! shows a local desktop notification; any other name is a Home Assistant
//! `notify` service (e.g., `mobile_app_phone` or `notify.mobile_app_phone`).
//!
//! Channels are independent: a failing channel is logged and reported, the
//! remaining channels still receive the message.

use std::sync::Arc;
use std::time::Duration;

use notify_rust::Notification;
#[cfg(target_os = "linux")]
use notify_rust::Urgency;
use serde::Serialize;
use tracing::{debug, error, info};

use dailyevents_providers::BoxFuture;
use dailyevents_providers::homeassistant::HassClient;

use crate::config::{DESKTOP_CHANNEL, DesktopConfig};
use crate::error::DispatchError;

/// Home Assistant service domain for notifications.
const NOTIFY_DOMAIN: &str = "notify";

/// A destination for the digest message.
pub trait NotificationSink: Send + Sync {
    /// Channel name as configured.
    fn channel(&self) -> &str;

    /// Delivers `message`.
    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), DispatchError>>;
}

/// Returns the Home Assistant notify service name for a channel,
/// stripping an optional `notify.` prefix.
pub fn notify_service_name(channel: &str) -> &str {
    channel.strip_prefix("notify.").unwrap_or(channel)
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
    message: &'a str,
}

/// Sends the digest through a Home Assistant notify service.
pub struct HassNotifier {
    client: Arc<HassClient>,
    channel: String,
}

impl HassNotifier {
    /// Creates a notifier for `channel`.
    pub fn new(client: Arc<HassClient>, channel: impl Into<String>) -> Self {
        Self {
            client,
            channel: channel.into(),
        }
    }

    /// Returns the service called under the `notify` domain.
    pub fn service(&self) -> &str {
        notify_service_name(&self.channel)
    }
}

impl NotificationSink for HassNotifier {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            debug!(service = %self.service(), "Calling notify service");
            self.client
                .call_service(NOTIFY_DOMAIN, self.service(), &NotifyPayload { message })
                .await?;
            Ok(())
        })
    }
}

/// Shows the digest as a desktop notification.
pub struct DesktopNotifier {
    config: DesktopConfig,
}

impl DesktopNotifier {
    /// Creates a desktop notifier.
    pub fn new(config: DesktopConfig) -> Self {
        Self { config }
    }
}

impl NotificationSink for DesktopNotifier {
    fn channel(&self) -> &str {
        DESKTOP_CHANNEL
    }

    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), DispatchError>> {
        let mut notification = Notification::new();
        notification
            .appname(&self.config.app_name)
            .summary(&self.config.summary)
            .body(message)
            .timeout(Duration::from_secs(self.config.timeout_secs as u64));

        if let Some(ref icon) = self.config.icon_path {
            notification.icon(icon);
        }

        #[cfg(target_os = "linux")]
        if let Some(ref urgency) = self.config.urgency {
            notification.urgency(parse_urgency(urgency));
        }

        let result = notification
            .show()
            .map(|_| ())
            .map_err(|e| DispatchError::Desktop(e.to_string()));
        Box::pin(async move { result })
    }
}

#[cfg(target_os = "linux")]
fn parse_urgency(s: &str) -> Urgency {
    match s.to_lowercase().as_str() {
        "low" => Urgency::Low,
        "normal" => Urgency::Normal,
        "critical" => Urgency::Critical,
        _ => Urgency::Normal,
    }
}

/// Builds one sink per configured channel, in order.
pub fn build_sinks(
    channels: &[String],
    client: &Arc<HassClient>,
    desktop: &DesktopConfig,
) -> Vec<Box<dyn NotificationSink>> {
    channels
        .iter()
        .map(|channel| -> Box<dyn NotificationSink> {
            if channel == DESKTOP_CHANNEL {
                Box::new(DesktopNotifier::new(desktop.clone()))
            } else {
                Box::new(HassNotifier::new(client.clone(), channel.clone()))
            }
        })
        .collect()
}

/// A channel that failed to receive the digest.
#[derive(Debug)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: DispatchError,
}

/// Delivery results of one dispatch, in channel order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<ChannelFailure>,
}

impl DispatchReport {
    /// Returns true if channels were attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

/// Sends a message to every sink.
pub struct Dispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Dispatcher {
    /// Creates a dispatcher over `sinks`.
    pub fn new(sinks: Vec<Box<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    /// Configured channel names, in dispatch order.
    pub fn channels(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.channel()).collect()
    }

    /// Delivers `message` to each sink in turn.
    pub async fn dispatch(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in &self.sinks {
            match sink.send(message).await {
                Ok(()) => {
                    info!(channel = %sink.channel(), "Digest delivered");
                    report.delivered.push(sink.channel().to_string());
                }
                Err(e) => {
                    error!(channel = %sink.channel(), error = %e, "Failed to deliver digest");
                    report.failed.push(ChannelFailure {
                        channel: sink.channel().to_string(),
                        error: e,
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use dailyevents_providers::homeassistant::HassConfig;

    struct RecordingSink {
        channel: String,
        fail: bool,
        received: Arc<Mutex<Vec<String>>>,
    }

    impl NotificationSink for RecordingSink {
        fn channel(&self) -> &str {
            &self.channel
        }

        fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), DispatchError>> {
            self.received.lock().unwrap().push(message.to_string());
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(DispatchError::Desktop("unavailable".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn sink(
        channel: &str,
        fail: bool,
        received: &Arc<Mutex<Vec<String>>>,
    ) -> Box<dyn NotificationSink> {
        Box::new(RecordingSink {
            channel: channel.to_string(),
            fail,
            received: received.clone(),
        })
    }

    fn client_for(url: &str) -> Arc<HassClient> {
        let config = HassConfig::new(url, "token").unwrap();
        Arc::new(HassClient::new(config).unwrap())
    }

    #[test]
    fn service_name_strips_domain() {
        assert_eq!(
            notify_service_name("notify.mobile_app_phone"),
            "mobile_app_phone"
        );
        assert_eq!(notify_service_name("mobile_app_phone"), "mobile_app_phone");
        assert_eq!(notify_service_name("notify"), "notify");
    }

    #[test]
    fn desktop_channel_routes_locally() {
        let client = client_for("http://hass:8123");
        let channels = vec!["notify.phone".to_string(), "desktop".to_string()];
        let sinks = build_sinks(&channels, &client, &DesktopConfig::default());
        let dispatcher = Dispatcher::new(sinks);
        assert_eq!(dispatcher.channels(), vec!["notify.phone", "desktop"]);
    }

    #[tokio::test]
    async fn failing_channel_does_not_stop_others() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(vec![
            sink("broken", true, &received),
            sink("phone", false, &received),
        ]);

        let report = dispatcher.dispatch("Work:\n- Standup\n").await;

        assert_eq!(report.delivered, vec!["phone"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].channel, "broken");
        assert!(!report.all_failed());
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_channels_failing_is_reported() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let dispatcher =
            Dispatcher::new(vec![sink("a", true, &received), sink("b", true, &received)]);
        let report = dispatcher.dispatch("hello").await;
        assert!(report.all_failed());
    }

    #[tokio::test]
    async fn hass_notifier_posts_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/notify/mobile_app_phone")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"message": "No Activities for Today 2024-01-01"}),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let notifier = HassNotifier::new(client, "notify.mobile_app_phone");
        assert_eq!(notifier.service(), "mobile_app_phone");

        notifier
            .send("No Activities for Today 2024-01-01")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn hass_notifier_reports_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/services/notify/missing")
            .with_status(400)
            .with_body("Service not found")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = HassNotifier::new(client, "missing")
            .send("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Remote(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn parse_urgency_values() {
        assert_eq!(parse_urgency("low"), Urgency::Low);
        assert_eq!(parse_urgency("Critical"), Urgency::Critical);
        assert_eq!(parse_urgency("unknown"), Urgency::Normal);
    }
}
