use serde::{Deserialize, Serialize};

use crate::weather_code::condition_label;

/// Name shown when reverse geocoding cannot name the device position.
pub const CURRENT_LOCATION_NAME: &str = "Current Location";

/// Visibility assumed when the provider reports none, in metres.
pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// A place resolved by the geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Sentinel used when the device position could not be named.
    pub fn current_location(coords: Coordinates) -> Self {
        Self {
            name: CURRENT_LOCATION_NAME.to_string(),
            country: String::new(),
            latitude: coords.latitude,
            longitude: coords.longitude,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Current-conditions payload as returned by the forecast endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    pub current_weather: RawCurrentWeather,
    #[serde(default)]
    pub hourly: RawHourly,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
}

/// Hourly series indexed by hour of day. Entries may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHourly {
    #[serde(default, rename = "relativehumidity_2m")]
    pub humidity: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub visibility: Option<Vec<Option<f64>>>,
}

impl RawHourly {
    fn humidity_at(&self, hour: usize) -> Option<f64> {
        self.humidity.as_ref()?.get(hour).copied().flatten()
    }

    fn visibility_at(&self, hour: usize) -> Option<f64> {
        self.visibility.as_ref()?.get(hour).copied().flatten()
    }
}

/// The forecast-only part of a [`WeatherView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFragment {
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: i32,
    pub visibility_km: i32,
}

impl ForecastFragment {
    /// Normalise a raw payload, reading hourly series at `hour` (local wall-clock hour).
    pub fn from_raw(raw: &RawForecast, hour: usize) -> Self {
        let current = &raw.current_weather;
        let temperature_c = round_half_up(current.temperature);
        let visibility_m = raw.hourly.visibility_at(hour).unwrap_or(DEFAULT_VISIBILITY_M);

        Self {
            temperature_c,
            // No apparent-temperature model: feels-like mirrors the air temperature.
            feels_like_c: temperature_c,
            condition: condition_label(current.weathercode).to_string(),
            humidity_pct: raw.hourly.humidity_at(hour).map(clamp_percentage).unwrap_or(0),
            wind_speed_kmh: round_half_up(current.windspeed),
            visibility_km: round_half_up(visibility_m / 1000.0),
        }
    }
}

/// The view model consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherView {
    pub city: String,
    pub country: String,
    pub temperature_c: i32,
    pub condition: String,
    pub feels_like_c: i32,
    pub humidity_pct: u8,
    pub wind_speed_kmh: i32,
    pub visibility_km: i32,
}

/// Merge a resolved place with its forecast.
pub fn compose_weather_view(location: Location, forecast: ForecastFragment) -> WeatherView {
    WeatherView {
        city: location.name,
        country: location.country,
        temperature_c: forecast.temperature_c,
        condition: forecast.condition,
        feels_like_c: forecast.feels_like_c,
        humidity_pct: forecast.humidity_pct,
        wind_speed_kmh: forecast.wind_speed_kmh,
        visibility_km: forecast.visibility_km,
    }
}

/// Halves round towards positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i32
}

fn clamp_percentage(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    round_half_up(value.clamp(0.0, 100.0)).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(body: &str) -> RawForecast {
        serde_json::from_str(body).expect("valid forecast json")
    }

    fn full_day(value: f64) -> String {
        let items = vec![value.to_string(); 24];
        format!("[{}]", items.join(","))
    }

    #[test]
    fn fragment_rounds_and_reads_current_hour() {
        let body = format!(
            r#"{{
                "current_weather": {{"temperature": 21.6, "windspeed": 12.4, "weathercode": 61}},
                "hourly": {{"relativehumidity_2m": {}, "visibility": {}}}
            }}"#,
            full_day(64.0),
            full_day(24140.0)
        );

        let fragment = ForecastFragment::from_raw(&raw(&body), 14);

        assert_eq!(fragment.temperature_c, 22);
        assert_eq!(fragment.feels_like_c, fragment.temperature_c);
        assert_eq!(fragment.condition, "Slight rain");
        assert_eq!(fragment.humidity_pct, 64);
        assert_eq!(fragment.wind_speed_kmh, 12);
        assert_eq!(fragment.visibility_km, 24);
    }

    #[test]
    fn missing_visibility_defaults_to_ten_km() {
        let body = r#"{
            "current_weather": {"temperature": 5.0, "windspeed": 3.0, "weathercode": 0},
            "hourly": {"relativehumidity_2m": [50]}
        }"#;

        let fragment = ForecastFragment::from_raw(&raw(body), 0);
        assert_eq!(fragment.visibility_km, 10);
        assert_eq!(fragment.humidity_pct, 50);
    }

    #[test]
    fn missing_hourly_block_falls_back_entirely() {
        let body = r#"{"current_weather": {"temperature": 5.0, "windspeed": 3.0, "weathercode": 0}}"#;

        let fragment = ForecastFragment::from_raw(&raw(body), 9);
        assert_eq!(fragment.humidity_pct, 0);
        assert_eq!(fragment.visibility_km, 10);
    }

    #[test]
    fn out_of_range_hour_falls_back_without_panicking() {
        let body = r#"{
            "current_weather": {"temperature": 5.0, "windspeed": 3.0, "weathercode": 0},
            "hourly": {"relativehumidity_2m": [80, 81], "visibility": [2000, 3000]}
        }"#;

        let fragment = ForecastFragment::from_raw(&raw(body), 23);
        assert_eq!(fragment.humidity_pct, 0);
        assert_eq!(fragment.visibility_km, 10);
    }

    #[test]
    fn null_entries_fall_back() {
        let body = r#"{
            "current_weather": {"temperature": 5.0, "windspeed": 3.0, "weathercode": 0},
            "hourly": {"relativehumidity_2m": [null], "visibility": [null]}
        }"#;

        let fragment = ForecastFragment::from_raw(&raw(body), 0);
        assert_eq!(fragment.humidity_pct, 0);
        assert_eq!(fragment.visibility_km, 10);
    }

    #[test]
    fn zero_visibility_is_reported_as_zero() {
        let body = r#"{
            "current_weather": {"temperature": 5.0, "windspeed": 3.0, "weathercode": 45},
            "hourly": {"visibility": [0]}
        }"#;

        let fragment = ForecastFragment::from_raw(&raw(body), 0);
        assert_eq!(fragment.visibility_km, 0);
        assert_eq!(fragment.condition, "Fog");
    }

    #[test]
    fn unknown_code_maps_to_unknown_label() {
        let body = r#"{"current_weather": {"temperature": 1.0, "windspeed": 1.0, "weathercode": 1000}}"#;

        assert_eq!(ForecastFragment::from_raw(&raw(body), 0).condition, "Unknown");
    }

    #[test]
    fn rounding_sends_halves_upwards() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(f64::NAN), 0);
    }

    #[test]
    fn humidity_is_clamped_to_percentage_range() {
        assert_eq!(clamp_percentage(120.0), 100);
        assert_eq!(clamp_percentage(-4.0), 0);
        assert_eq!(clamp_percentage(63.4), 63);
        assert_eq!(clamp_percentage(62.5), 63);
        assert_eq!(clamp_percentage(99.5), 100);
        assert_eq!(clamp_percentage(f64::INFINITY), 0);
    }

    #[test]
    fn compose_copies_location_and_forecast() {
        let location = Location {
            name: "Lisbon".into(),
            country: "Portugal".into(),
            latitude: 38.72,
            longitude: -9.14,
        };
        let fragment = ForecastFragment {
            temperature_c: 19,
            feels_like_c: 19,
            condition: "Clear sky".into(),
            humidity_pct: 55,
            wind_speed_kmh: 8,
            visibility_km: 10,
        };

        let view = compose_weather_view(location, fragment);
        assert_eq!(view.city, "Lisbon");
        assert_eq!(view.country, "Portugal");
        assert_eq!(view.temperature_c, 19);
        assert_eq!(view.condition, "Clear sky");
    }

    #[test]
    fn location_country_defaults_to_empty() {
        let location: Location =
            serde_json::from_str(r#"{"name": "Atlantis", "latitude": 1.0, "longitude": 2.0}"#)
                .expect("location json");
        assert_eq!(location.country, "");
    }

    #[test]
    fn sentinel_location_keeps_coordinates() {
        let location = Location::current_location(Coordinates::new(52.52, 13.41));
        assert_eq!(location.name, CURRENT_LOCATION_NAME);
        assert!(location.country.is_empty());
        assert_eq!(location.coordinates(), Coordinates::new(52.52, 13.41));
    }

    #[test]
    fn coordinates_validate_ranges() {
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(!Coordinates::new(90.1, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }
}
