use async_trait::async_trait;
use chrono::{Local, Timelike};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    config::ApiConfig,
    error::{Endpoint, WeatherError},
    model::{Coordinates, ForecastFragment, Location, RawForecast},
};

use super::WeatherProvider;

const HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,windspeed_10m,visibility";

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    name: &'a str,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct ReverseGeocodeQuery<'a> {
    latitude: f64,
    longitude: f64,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    current_weather: bool,
    hourly: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<Location>,
}

/// Client for the keyless Open-Meteo geocoding and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    api: ApiConfig,
}

impl OpenMeteoProvider {
    pub fn new(api: ApiConfig) -> Self {
        Self { http: Client::new(), api }
    }

    async fn geocode(&self, request: RequestBuilder, query: &str) -> Result<Location, WeatherError> {
        let body = execute_request(request, Endpoint::Geocoding).await?;
        let location = parse_geocode_response(&body, query)?;
        tracing::info!(
            name = %location.name,
            country = %location.country,
            "resolved location"
        );
        Ok(location)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn resolve_location(&self, city: &str) -> Result<Location, WeatherError> {
        let query = GeocodeQuery {
            name: city,
            count: 1,
            language: &self.api.language,
            format: "json",
        };

        self.geocode(self.http.get(&self.api.geocoding_url).query(&query), city)
            .await
    }

    async fn resolve_location_from_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<Location, WeatherError> {
        let query = ReverseGeocodeQuery {
            latitude: coords.latitude,
            longitude: coords.longitude,
            count: 1,
            language: &self.api.language,
            format: "json",
        };

        let label = coords.to_string();
        self.geocode(self.http.get(&self.api.geocoding_url).query(&query), &label)
            .await
    }

    async fn fetch_current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<ForecastFragment, WeatherError> {
        let query = ForecastQuery {
            latitude: coords.latitude,
            longitude: coords.longitude,
            current_weather: true,
            hourly: HOURLY_FIELDS,
            timezone: "auto",
        };

        let request = self.http.get(&self.api.forecast_url).query(&query);
        let body = execute_request(request, Endpoint::Forecast).await?;
        let raw: RawForecast = serde_json::from_str(&body).map_err(|error| {
            WeatherError::network(Endpoint::Forecast, format!("forecast payload: {error}"))
        })?;

        // Hourly series are read at the caller's wall-clock hour, not the provider's timestamps.
        let hour = Local::now().hour() as usize;
        Ok(ForecastFragment::from_raw(&raw, hour))
    }
}

async fn execute_request(
    request: RequestBuilder,
    endpoint: Endpoint,
) -> Result<String, WeatherError> {
    let response = request.send().await.map_err(|error| {
        tracing::debug!(%endpoint, %error, "request failed to send");
        WeatherError::network(endpoint, error.to_string())
    })?;

    let status = response.status();
    tracing::debug!(%endpoint, url = %response.url(), %status, "received response");

    let body = response
        .text()
        .await
        .map_err(|error| WeatherError::network(endpoint, error.to_string()))?;

    if !status.is_success() {
        return Err(WeatherError::network(
            endpoint,
            format!("status {}: {}", status, truncate_body(&body)),
        ));
    }

    Ok(body)
}

fn parse_geocode_response(body: &str, query: &str) -> Result<Location, WeatherError> {
    let payload: GeocodeResponse = serde_json::from_str(body).map_err(|error| {
        WeatherError::network(Endpoint::Geocoding, format!("geocode payload: {error}"))
    })?;

    payload
        .results
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::NotFound { query: query.to_string() })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
