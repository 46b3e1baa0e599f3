use thiserror::Error;

/// Which remote endpoint a network failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Geocoding,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Geocoding => "geocoding",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced to the user. `Display` is the message shown in the search state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Please enter a city name")]
    EmptyQuery,

    #[error("City not found")]
    NotFound { query: String },

    #[error("{}", network_message(.endpoint))]
    Network { endpoint: Endpoint, reason: String },

    #[error("Unable to access your location")]
    Position { reason: String },

    #[error("Geolocation is not supported by this browser")]
    Unsupported,
}

impl WeatherError {
    pub fn network(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        WeatherError::Network { endpoint, reason: reason.into() }
    }

    /// Diagnostic detail that is logged but never shown.
    pub fn detail(&self) -> Option<&str> {
        match self {
            WeatherError::Network { reason, .. } | WeatherError::Position { reason } => {
                Some(reason)
            }
            WeatherError::NotFound { query } => Some(query),
            WeatherError::EmptyQuery | WeatherError::Unsupported => None,
        }
    }
}

fn network_message(endpoint: &Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Geocoding => "Failed to fetch location data",
        Endpoint::Forecast => "Failed to fetch weather data",
    }
}
