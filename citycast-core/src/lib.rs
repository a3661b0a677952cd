//! Core library for the `citycast` CLI.
//!
//! This crate defines:
//! - Configuration (cache location and TTL, retry policy, endpoints)
//! - HTTP transport layers: plain, retrying, caching
//! - Geocoding of city names and the hourly forecast client
//! - Shared domain models and error types
//!
//! It is used by `citycast-cli`, but can also be reused by non-interactive callers.

pub mod config;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod model;
pub mod pipeline;
pub mod transport;

pub use config::{CacheConfig, Config, RetryPolicy};
pub use error::{ForecastError, GeocodeError, LookupError, TransportError};
pub use forecast::{ForecastSource, HourlyVariable, OpenMeteoClient};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use model::{
    Coordinates, ForecastResponse, HourlyPoint, HourlySeries, Location, half_open_range,
};
pub use pipeline::{DynForecaster, Forecaster, Report, forecaster_from_config};
