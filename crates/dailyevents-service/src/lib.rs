//! Digest pipeline: fetch, format, dispatch.
//!
//! This crate wires the calendar fetcher, the digest formatter and the
//! notification channels into one stateless invocation:
//!
//! ```text
//! list calendars → exclude → fetch events → build digest → dispatch
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dailyevents_providers::homeassistant::HassConfig;
//! use dailyevents_service::{DailyEventsService, NotifyRequest, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hass = HassConfig::new("http://192.168.1.10:8123", "token")?;
//!     let service = DailyEventsService::new(ServiceConfig::new(hass))?;
//!     let outcome = service.notify(NotifyRequest::default()).await?;
//!     println!("{}", outcome.digest.message);
//!     Ok(())
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod service;

pub use config::{DEFAULT_CHANNEL, DESKTOP_CHANNEL, DesktopConfig, ServiceConfig};
pub use dispatch::{
    ChannelFailure, DesktopNotifier, DispatchReport, Dispatcher, HassNotifier, NotificationSink,
    build_sinks, notify_service_name,
};
pub use error::{DispatchError, ServiceError, ServiceResult};
pub use service::{CalendarListing, DailyEventsService, Digest, NotifyOutcome, NotifyRequest};
