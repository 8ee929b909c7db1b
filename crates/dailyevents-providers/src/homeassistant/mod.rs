//! Home Assistant calendar source.
//!
//! Talks to the REST API of a Home Assistant instance:
//!
//! - `GET /api/calendars` lists calendar entities
//! - `GET /api/calendars/{entity_id}?start=..&end=..` lists events
//! - `POST /api/services/notify/{service}` delivers notifications
//!
//! Every request carries the long-lived access token as a bearer
//! credential and is bounded by the configured timeout.
//!
//! # Example
//!
//! ```ignore
//! use dailyevents_providers::homeassistant::{HassConfig, HassProvider};
//!
//! let config = HassConfig::new("https://homeassistant.local:8123", token)?;
//! let provider = HassProvider::new(config)?;
//! let calendars = provider.list_calendars().await?;
//! ```

mod client;
mod config;
mod provider;

pub use client::{ApiCalendar, ApiEvent, ApiEventTime, HassClient};
pub use config::{HassConfig, default_verify_tls};
pub use provider::{HassProvider, PROVIDER_NAME};
