use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::GeocodeError, model::Coordinates};

pub mod nominatim;

pub use nominatim::NominatimGeocoder;

/// Resolves a free-text place name to coordinates.
///
/// Only the best match is used; there is no disambiguation between places
/// sharing a name.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError> {
        (**self).resolve(city).await
    }
}
