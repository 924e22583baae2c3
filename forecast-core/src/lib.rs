//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - City input validation
//! - The OpenWeatherMap client, with a bounded and abortable lookup
//! - Normalization of raw payloads into display-ready values
//! - The request-state machine that owns retries and stale-result handling
//! - Configuration & credentials handling
//!
//! It is used by `forecast-cli`, but can also be reused by other front-ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod query;
pub mod session;
pub mod state;

pub use client::{WeatherClient, WeatherSource, fetch_weather};
pub use config::{Config, FileConfig};
pub use error::{ConfigError, FetchError, ValidationError};
pub use model::{Condition, RawWeather, Theme, WeatherResult};
pub use normalize::normalize;
pub use query::CityQuery;
pub use session::WeatherSession;
pub use state::{RequestState, RetryCoordinator, Ticket};
