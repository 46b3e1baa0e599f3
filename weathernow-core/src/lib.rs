//! Core library for the `weathernow` CLI.
//!
//! This crate defines:
//! - Configuration handling (API endpoints, default position)
//! - The Open-Meteo client: geocoding plus current conditions
//! - Normalisation of provider payloads into a `WeatherView`
//! - `SearchController`, the search state machine a renderer observes
//!
//! It is used by `weathernow-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod position;
pub mod provider;
pub mod weather_code;

pub use config::{ApiConfig, Config};
pub use controller::{SearchController, SearchState};
pub use error::{Endpoint, WeatherError};
pub use model::{Coordinates, ForecastFragment, Location, RawForecast, WeatherView};
pub use position::{FixedPosition, PositionSource};
pub use provider::{OpenMeteoProvider, WeatherProvider};
