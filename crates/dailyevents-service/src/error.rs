//! Service error types.

use thiserror::Error;

use dailyevents_core::FormatError;
use dailyevents_providers::ProviderError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that abort a digest invocation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The calendar list could not be fetched, so there is nothing to digest.
    #[error("Calendars unavailable: {0}")]
    CalendarsUnavailable(#[source] ProviderError),

    /// Invalid date/time pattern or timezone.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// The calendar source could not be set up.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl ServiceError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Errors from a single notification channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The desktop notification daemon rejected the notification.
    #[error("desktop notification failed: {0}")]
    Desktop(String),

    /// The Home Assistant notify service call failed.
    #[error("notify service call failed: {0}")]
    Remote(#[from] ProviderError),
}
