//! Search state machine.
//!
//! `SearchController` owns the [`SearchState`] and publishes every transition
//! through a single `watch` channel, so a renderer only ever observes
//! complete snapshots: `Idle -> Loading -> Success | Failure -> Idle`.
//!
//! Each flow takes a ticket when it starts. When a newer flow has started in
//! the meantime, the older flow's result is dropped instead of overwriting
//! the newer one.

use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::watch;

use crate::{
    error::WeatherError,
    model::{Coordinates, Location, WeatherView, compose_weather_view},
    position::PositionSource,
    provider::WeatherProvider,
};

/// Shown when the device position was acquired but its forecast could not be fetched.
pub const LOCATION_FORECAST_FAILED: &str = "Unable to fetch weather for your location";

/// Everything the presentation layer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub view: Option<WeatherView>,
}

#[derive(Clone, Copy)]
enum LocationStep<'a> {
    ByName(&'a str),
    ByCoordinates(Coordinates),
}

/// What to do when the location step fails.
enum FailurePolicy {
    Abort,
    FallBack(Location),
}

#[derive(Debug)]
pub struct SearchController {
    provider: Arc<dyn WeatherProvider>,
    position: Option<Arc<dyn PositionSource>>,
    state: watch::Sender<SearchState>,
    latest: AtomicU64,
}

impl SearchController {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        position: Option<Arc<dyn PositionSource>>,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            provider,
            position,
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Replace the query text. Editing the query dismisses any visible error.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|state| {
            state.query = text;
            state.error = None;
        });
    }

    /// Search for whatever is currently in the query text.
    pub async fn submit(&self) {
        let query = self.state.borrow().query.clone();
        self.search_by_name(&query).await;
    }

    pub async fn search_by_name(&self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            self.state
                .send_modify(|state| state.error = Some(WeatherError::EmptyQuery.to_string()));
            return;
        }

        let flight = self.begin();
        let outcome = self
            .run_pipeline(LocationStep::ByName(city), FailurePolicy::Abort)
            .await;

        match outcome {
            Ok(view) => flight.settle(|state| {
                state.view = Some(view);
                state.error = None;
            }),
            Err(err) => {
                tracing::debug!(%city, error = %err, detail = err.detail(), "search by name failed");
                flight.settle(|state| {
                    state.view = None;
                    state.error = Some(err.to_string());
                })
            }
        }
    }

    pub async fn search_by_current_location(&self) {
        let Some(source) = self.position.clone() else {
            self.state
                .send_modify(|state| state.error = Some(WeatherError::Unsupported.to_string()));
            return;
        };

        let flight = self.begin();

        let coords = match source.current_position().await {
            Ok(coords) => coords,
            Err(err) => {
                tracing::debug!(error = %err, detail = err.detail(), "position unavailable");
                let err = match err {
                    err @ WeatherError::Position { .. } => err,
                    other => WeatherError::Position { reason: other.to_string() },
                };
                flight.settle(|state| state.error = Some(err.to_string()));
                return;
            }
        };

        let fallback = Location::current_location(coords);
        let outcome = self
            .run_pipeline(
                LocationStep::ByCoordinates(coords),
                FailurePolicy::FallBack(fallback),
            )
            .await;

        match outcome {
            Ok(view) => flight.settle(|state| {
                state.query = view.city.clone();
                state.view = Some(view);
                state.error = None;
            }),
            // The previous view stays on screen here, unlike the search-by-name path.
            Err(err) => {
                tracing::debug!(%coords, error = %err, detail = err.detail(), "forecast for position failed");
                flight.settle(|state| state.error = Some(LOCATION_FORECAST_FAILED.to_string()))
            }
        }
    }

    /// Location lookup followed by the forecast lookup, strictly in sequence.
    async fn run_pipeline(
        &self,
        step: LocationStep<'_>,
        policy: FailurePolicy,
    ) -> Result<WeatherView, WeatherError> {
        let resolved = match step {
            LocationStep::ByName(city) => self.provider.resolve_location(city).await,
            LocationStep::ByCoordinates(coords) => {
                self.provider.resolve_location_from_coordinates(coords).await
            }
        };

        let location = match (resolved, policy) {
            (Ok(location), _) => location,
            (Err(err), FailurePolicy::Abort) => return Err(err),
            (Err(err), FailurePolicy::FallBack(fallback)) => {
                tracing::warn!(
                    error = %err,
                    detail = err.detail(),
                    fallback = %fallback.name,
                    "location lookup failed, continuing with fallback"
                );
                fallback
            }
        };

        // A device position is more precise than whatever place it was matched to.
        let forecast_at = match step {
            LocationStep::ByName(_) => location.coordinates(),
            LocationStep::ByCoordinates(coords) => coords,
        };

        let forecast = self.provider.fetch_current_weather(forecast_at).await?;
        Ok(compose_weather_view(location, forecast))
    }

    fn begin(&self) -> Flight<'_> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });
        Flight {
            controller: self,
            ticket,
            settled: false,
        }
    }

    /// Apply a flow's outcome and clear the loading flag, unless a newer flow has started.
    fn finish(&self, ticket: u64, apply: impl FnOnce(&mut SearchState)) {
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != ticket {
                return false;
            }
            apply(state);
            state.is_loading = false;
            true
        });

        if !applied {
            tracing::debug!(ticket, "discarding result of superseded search");
        }
    }
}

/// An in-flight search. Dropping it unsettled (e.g. the future was cancelled)
/// still clears the loading flag.
struct Flight<'a> {
    controller: &'a SearchController,
    ticket: u64,
    settled: bool,
}

impl Flight<'_> {
    fn settle(mut self, apply: impl FnOnce(&mut SearchState)) {
        self.settled = true;
        self.controller.finish(self.ticket, apply);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.finish(self.ticket, |_| {});
        }
    }
}
