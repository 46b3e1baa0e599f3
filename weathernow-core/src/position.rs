use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::WeatherError, model::Coordinates};

/// Something that can report where the device currently is.
///
/// A controller built without a position source treats the capability as missing.
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    /// Returns the device position, or a `WeatherError::Position` when it cannot be acquired.
    async fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// A position supplied up front, from flags or configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    coords: Coordinates,
}

impl FixedPosition {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        if !self.coords.is_valid() {
            return Err(WeatherError::Position {
                reason: format!("coordinates out of range: {}", self.coords),
            });
        }
        Ok(self.coords)
    }
}
