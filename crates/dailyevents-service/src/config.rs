//! Service configuration.

use std::collections::HashSet;
use std::time::Duration;

use chrono_tz::Tz;

use dailyevents_core::{DigestOptions, DigestWindow};
use dailyevents_providers::CalendarFetcher;
use dailyevents_providers::homeassistant::HassConfig;

use crate::error::{ServiceError, ServiceResult};

/// Channel name that routes to a local desktop notification.
pub const DESKTOP_CHANNEL: &str = "desktop";

/// Channel used when none is configured.
pub const DEFAULT_CHANNEL: &str = "notify";

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Home Assistant connection.
    pub hass: HassConfig,

    /// Timezone used for the window and rendered times.
    pub timezone: Tz,

    /// Default window length in days.
    pub num_of_days: u32,

    /// Date/time patterns and ordering.
    pub digest: DigestOptions,

    /// Calendar ids left out of the digest.
    pub exclude: HashSet<String>,

    /// Notification channels, in dispatch order.
    pub channels: Vec<String>,

    /// Event fetches in flight at once.
    pub concurrency: usize,

    /// Desktop notification settings.
    pub desktop: DesktopConfig,
}

impl ServiceConfig {
    /// Creates a configuration with defaults for everything but the connection.
    pub fn new(hass: HassConfig) -> Self {
        Self {
            hass,
            timezone: Tz::UTC,
            num_of_days: DigestWindow::DEFAULT_DAYS,
            digest: DigestOptions::default(),
            exclude: HashSet::new(),
            channels: vec![DEFAULT_CHANNEL.to_string()],
            concurrency: CalendarFetcher::DEFAULT_CONCURRENCY,
            desktop: DesktopConfig::default(),
        }
    }

    /// Builder: set timezone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Builder: set default window length.
    pub fn with_num_of_days(mut self, days: u32) -> Self {
        self.num_of_days = days;
        self
    }

    /// Builder: set digest options.
    pub fn with_digest(mut self, digest: DigestOptions) -> Self {
        self.digest = digest;
        self
    }

    /// Builder: set excluded calendar ids.
    pub fn with_exclude<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set notification channels.
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set fetch concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Builder: set desktop notification settings.
    pub fn with_desktop(mut self, desktop: DesktopConfig) -> Self {
        self.desktop = desktop;
        self
    }

    /// Per-call deadline, taken from the connection settings.
    pub fn timeout(&self) -> Duration {
        self.hass.timeout
    }

    /// Checks the settings that cannot be expressed by their types.
    pub fn validate(&self) -> ServiceResult<()> {
        self.digest.validate()?;

        if self.channels.is_empty() {
            return Err(ServiceError::config(
                "at least one notification channel is required",
            ));
        }
        if let Some(blank) = self.channels.iter().find(|c| c.trim().is_empty()) {
            return Err(ServiceError::config(format!(
                "invalid notification channel name {:?}",
                blank
            )));
        }
        if self.num_of_days > DigestWindow::MAX_DAYS {
            return Err(ServiceError::config(format!(
                "num_of_days must be at most {}",
                DigestWindow::MAX_DAYS
            )));
        }
        if self.concurrency == 0 {
            return Err(ServiceError::config("concurrency must be at least 1"));
        }
        if self.hass.timeout.is_zero() {
            return Err(ServiceError::config("timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// Desktop notification settings.
#[derive(Debug, Clone)]
pub struct DesktopConfig {
    /// Application name shown by the notification daemon.
    pub app_name: String,
    /// Summary line of the notification.
    pub summary: String,
    /// Expiry in seconds.
    pub timeout_secs: u32,
    /// Urgency ("low", "normal", "critical").
    pub urgency: Option<String>,
    /// Custom notification icon path.
    pub icon_path: Option<String>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            app_name: "daily-events".to_string(),
            summary: "Daily events".to_string(),
            timeout_secs: 10,
            urgency: None,
            icon_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hass() -> HassConfig {
        HassConfig::new("http://192.168.1.10:8123", "token").unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServiceConfig::new(hass());
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.num_of_days, 1);
        assert_eq!(config.channels, vec!["notify"]);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.exclude.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_config() {
        let config = ServiceConfig::new(hass())
            .with_timezone(chrono_tz::Europe::Paris)
            .with_num_of_days(7)
            .with_exclude(["calendar.holidays"])
            .with_channels(["mobile_app_phone", "desktop"])
            .with_concurrency(4);

        assert_eq!(config.timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.num_of_days, 7);
        assert!(config.exclude.contains("calendar.holidays"));
        assert_eq!(config.channels.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = ServiceConfig::new(hass()).with_channels(Vec::<String>::new());
        assert!(config.validate().is_err());

        let config = ServiceConfig::new(hass()).with_channels([" "]);
        assert!(config.validate().is_err());

        let config = ServiceConfig::new(hass()).with_concurrency(0);
        assert!(config.validate().is_err());

        let config = ServiceConfig::new(hass()).with_num_of_days(100_000);
        assert!(matches!(config.validate(), Err(ServiceError::Config { .. })));

        let config = ServiceConfig::new(hass())
            .with_digest(DigestOptions::default().with_time_format("%Q %"));
        assert!(matches!(config.validate(), Err(ServiceError::Format(_))));
    }
}
