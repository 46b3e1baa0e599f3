use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{Coordinates, ForecastFragment, Location},
};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Geocoding plus current-conditions lookups against a weather service.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Best match for `city`. Fails with `NotFound` when the service knows no such place.
    async fn resolve_location(&self, city: &str) -> Result<Location, WeatherError>;

    /// Name the place at `coords`. Callers treat a failure here as cosmetic.
    async fn resolve_location_from_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<Location, WeatherError>;

    async fn fetch_current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<ForecastFragment, WeatherError>;
}
