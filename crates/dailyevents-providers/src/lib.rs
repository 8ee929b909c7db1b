//! Calendar sources and the fetching pipeline.
//!
//! This crate provides the data side of a digest:
//!
//! - [`CalendarSource`] - The trait every calendar backend implements
//! - [`homeassistant`] - The Home Assistant REST implementation
//! - [`CalendarFetcher`] - List, exclude, and fetch under per-call deadlines
//! - [`ProviderError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ Home Assistant API  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    HassProvider     │
//! └──────────┬──────────┘
//!            │ CalendarSource
//!            ▼
//! ┌─────────────────────┐
//! │   CalendarFetcher   │  list → exclude → fetch each
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │ FetchOutcome │  entries + failures
//!     └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dailyevents_providers::{CalendarFetcher, homeassistant::{HassConfig, HassProvider}};
//!
//! let provider = HassProvider::new(HassConfig::new(host, token)?)?;
//! let fetcher = CalendarFetcher::new(Arc::new(provider));
//! let outcome = fetcher.fetch(&window, &excluded).await?;
//! ```

pub mod error;
pub mod fetcher;
pub mod homeassistant;
pub mod provider;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use fetcher::{CalendarFailure, CalendarFetcher, FetchOutcome, exclude_calendars};
pub use provider::{BoxFuture, CalendarSource};
