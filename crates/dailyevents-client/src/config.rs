//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/daily-events/config.toml` by default.
//!
//! The access token supports secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is, and redacted when the config is dumped

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use dailyevents_core::{
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, DigestOptions, DigestWindow, parse_timezone,
};
use dailyevents_providers::homeassistant::HassConfig;
use dailyevents_service::{DEFAULT_CHANNEL, DesktopConfig, ServiceConfig};

use crate::secret::SecretRef;

/// Written in place of a plain-text token when the config is serialized.
pub const REDACTED_TOKEN: &str = "<redacted>";

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the daily-events client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Home Assistant connection.
    pub homeassistant: Option<HomeAssistantSettings>,

    /// Digest window and formatting.
    pub digest: DigestSettings,

    /// Calendar selection.
    pub calendars: CalendarSettings,

    /// Notification channels.
    pub notifications: NotificationSettings,
}

/// Home Assistant connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantSettings {
    /// Base URL of the instance (e.g., `http://192.168.1.10:8123`).
    pub host: String,

    /// Long-lived access token (supports `pass::` and `env::` prefixes).
    #[serde(serialize_with = "serialize_token")]
    pub token: String,

    /// TLS certificate verification; computed from the host when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_tls: Option<bool>,

    /// Per-request deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn serialize_token<S: Serializer>(token: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if SecretRef::parse(token).is_reference() {
        serializer.serialize_str(token)
    } else {
        serializer.serialize_str(REDACTED_TOKEN)
    }
}

fn default_timeout_secs() -> u64 {
    HassConfig::DEFAULT_TIMEOUT_SECS
}

/// Digest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    /// IANA timezone name.
    pub timezone: String,

    /// Window length in days.
    pub num_of_days: u32,

    /// strftime pattern for dates.
    pub date_format: String,

    /// strftime pattern for times.
    pub time_format: String,

    /// Sort each calendar's events by start time.
    pub sort_by_start: bool,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            num_of_days: DigestWindow::DEFAULT_DAYS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            sort_by_start: false,
        }
    }
}

/// Calendar selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar entity ids left out of the digest.
    pub exclude: Vec<String>,

    /// Event fetches in flight at once.
    pub concurrency: usize,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            concurrency: 1,
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Channel names: `desktop` or a Home Assistant notify service.
    pub channels: Vec<String>,

    /// Urgency of desktop notifications ("low", "normal", "critical").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,

    /// Custom desktop notification icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channels: vec![DEFAULT_CHANNEL.to_string()],
            urgency: None,
            icon_path: None,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daily-events")
    }

    /// Resolves the file into a service configuration.
    ///
    /// Expands the token secret reference, parses the host and timezone,
    /// and validates the format patterns.
    pub fn resolve(&self) -> Result<ServiceConfig, String> {
        let hass = self.homeassistant.as_ref().ok_or_else(|| {
            format!(
                "Home Assistant connection not configured. Add to {}:\n  \
                 [homeassistant]\n  \
                 host = \"http://homeassistant.local:8123\"\n  \
                 token = \"env::HASS_TOKEN\"",
                Self::default_path().display()
            )
        })?;

        let hass = hass.to_hass_config()?;
        let timezone = parse_timezone(&self.digest.timezone).map_err(|e| e.to_string())?;

        let digest = DigestOptions::default()
            .with_date_format(&self.digest.date_format)
            .with_time_format(&self.digest.time_format)
            .with_sort_by_start(self.digest.sort_by_start);
        digest.validate().map_err(|e| e.to_string())?;

        let desktop = DesktopConfig {
            urgency: self.notifications.urgency.clone(),
            icon_path: self.notifications.icon_path.clone(),
            ..DesktopConfig::default()
        };

        let config = ServiceConfig::new(hass)
            .with_timezone(timezone)
            .with_num_of_days(self.digest.num_of_days)
            .with_digest(digest)
            .with_exclude(self.calendars.exclude.iter().cloned())
            .with_channels(self.notifications.channels.iter().cloned())
            .with_concurrency(self.calendars.concurrency)
            .with_desktop(desktop);

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

impl HomeAssistantSettings {
    /// Converts to the HTTP client configuration, resolving the token.
    pub fn to_hass_config(&self) -> Result<HassConfig, String> {
        let token = crate::secret::resolve(&self.token)
            .map_err(|e| format!("failed to resolve token: {}", e))?;
        if token.trim().is_empty() {
            return Err("token is empty".to_string());
        }

        let mut config = HassConfig::new(&self.host, token)
            .map_err(|e| format!("invalid host {:?}: {}", self.host, e))?
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(verify) = self.verify_tls {
            config = config.with_verify_tls(verify);
        }

        Ok(config)
    }
}
