//! Home Assistant connection configuration.

use std::time::Duration;
use url::{Host, Url};

/// Configuration for the Home Assistant REST client.
#[derive(Clone)]
pub struct HassConfig {
    /// Root URL of the Home Assistant instance (always ends with `/`).
    pub url: Url,

    /// Long-lived access token sent as a bearer credential.
    pub token: String,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Per-request deadline.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl HassConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a new configuration for the instance at `url`.
    ///
    /// TLS verification defaults to [`default_verify_tls`] for the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>, token: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut parsed = Url::parse(url.as_ref())?;
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        let verify_tls = default_verify_tls(&parsed);
        Ok(Self {
            url: parsed,
            token: token.into(),
            verify_tls,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("daily-events/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Overrides the computed TLS verification policy.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves a REST API path (e.g., `calendars`) against the instance URL.
    pub fn api_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join("api/")?.join(path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for HassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HassConfig")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// TLS policy for a host: raw IPv4 literals are treated as trusted local
/// peers and skip certificate verification, every other host is verified.
pub fn default_verify_tls(url: &Url) -> bool {
    !matches!(url.host(), Some(Host::Ipv4(_)))
}
