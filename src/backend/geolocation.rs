use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied: {0}")]
    Denied(String),
    #[error("location services unavailable")]
    Unavailable,
}

/// Device position source.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Always reports the same point. Useful for desktop builds and tests.
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoStatus {
    Granted,
    Denied,
    Unavailable,
}

/// Where to search, plus how we got there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub status: GeoStatus,
}

impl ResolvedLocation {
    pub fn used_default(&self) -> bool {
        self.status != GeoStatus::Granted
    }

    /// Banner text when results are not from the user's own area.
    pub fn advisory(&self) -> Option<&'static str> {
        match self.status {
            GeoStatus::Granted => None,
            GeoStatus::Denied => Some(
                "We couldn't get your location, so here are some ideas from a default area. Look for similar places near you!",
            ),
            GeoStatus::Unavailable => Some(
                "Location isn't available on this device, so here are some ideas from a default area.",
            ),
        }
    }
}

/// Ask the provider for a position; fall back to `default` on denial or when
/// there is no provider at all.
pub async fn resolve_location(
    provider: Option<&dyn LocationProvider>,
    default: Coordinates,
) -> ResolvedLocation {
    let Some(provider) = provider else {
        return ResolvedLocation {
            coordinates: default,
            status: GeoStatus::Unavailable,
        };
    };
    match provider.current_position().await {
        Ok(coordinates) => ResolvedLocation {
            coordinates,
            status: GeoStatus::Granted,
        },
        Err(e) => {
            tracing::warn!(error = %e, "geolocation failed, using default location");
            let status = match e {
                LocationError::Denied(_) => GeoStatus::Denied,
                LocationError::Unavailable => GeoStatus::Unavailable,
            };
            ResolvedLocation {
                coordinates: default,
                status,
            }
        }
    }
}
