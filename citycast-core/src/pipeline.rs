//! City name -> coordinates -> hourly forecast, strictly in sequence.

use anyhow::Context;

use crate::{
    config::Config,
    error::LookupError,
    forecast::{ForecastSource, OpenMeteoClient},
    geocode::{Geocoder, NominatimGeocoder},
    model::{ForecastResponse, Location},
    transport::{CachingTransport, HttpTransport, RetryingTransport, Transport},
};

/// A resolved city together with its forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub location: Location,
    pub forecast: ForecastResponse,
}

#[derive(Debug)]
pub struct Forecaster<G, F> {
    geocoder: G,
    forecast: F,
}

impl<G: Geocoder, F: ForecastSource> Forecaster<G, F> {
    pub fn new(geocoder: G, forecast: F) -> Self {
        Self { geocoder, forecast }
    }

    /// Resolve `city`, then fetch its forecast. The forecast is never requested
    /// when the city cannot be resolved.
    pub async fn lookup(&self, city: &str) -> Result<Report, LookupError> {
        let coordinates = self.geocoder.resolve(city).await?;
        let forecast = self.forecast.fetch(coordinates).await?;

        Ok(Report {
            location: Location {
                name: city.to_string(),
                coordinates: Some(coordinates),
            },
            forecast,
        })
    }
}

pub type DynForecaster = Forecaster<Box<dyn Geocoder>, Box<dyn ForecastSource>>;

/// Wire the production stack: plain HTTP for geocoding; cache over retry over
/// HTTP for the forecast.
pub fn forecaster_from_config(config: &Config) -> anyhow::Result<DynForecaster> {
    let geocoder: Box<dyn Geocoder> = Box::new(NominatimGeocoder::new(
        HttpTransport::new()?,
        &config.geocoder.url,
        &config.geocoder.user_agent,
    ));

    let retrying = RetryingTransport::new(HttpTransport::new()?, config.retry_policy());

    let transport: Box<dyn Transport> = match config.cache_config() {
        Some(cache) => {
            let cached = CachingTransport::from_config(retrying, &cache).with_context(|| {
                format!("Failed to open response cache at {}", cache.path.display())
            })?;
            Box::new(cached)
        }
        None => Box::new(retrying),
    };

    let forecast: Box<dyn ForecastSource> =
        Box::new(OpenMeteoClient::new(transport, &config.forecast.url));

    Ok(Forecaster::new(geocoder, forecast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ForecastError, GeocodeError},
        model::{Coordinates, HourlySeries},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FixedGeocoder(Option<Coordinates>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError> {
            self.0.ok_or_else(|| GeocodeError::NotFound(city.to_string()))
        }
    }

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch(&self, coordinates: Coordinates) -> Result<ForecastResponse, ForecastError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ForecastResponse {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
                elevation: 0.0,
                timezone: "GMT".into(),
                timezone_abbreviation: "GMT".into(),
                utc_offset_seconds: 0,
                hourly_start: 0,
                hourly_end: 0,
                hourly_interval: 3600,
                hourly: HourlySeries::default(),
            })
        }
    }

    #[tokio::test]
    async fn not_found_skips_forecast() {
        let forecaster = Forecaster::new(FixedGeocoder(None), CountingSource::default());

        let err = forecaster.lookup("Zzzzxxqq").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(forecaster.forecast.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_city_is_forecast_once() {
        let paris = Coordinates::new(48.85, 2.35).unwrap();
        let forecaster = Forecaster::new(FixedGeocoder(Some(paris)), CountingSource::default());

        let report = forecaster.lookup("Paris").await.unwrap();

        assert_eq!(report.location.name, "Paris");
        assert_eq!(report.location.coordinates, Some(paris));
        assert_eq!(report.forecast.latitude, 48.85);
        assert_eq!(forecaster.forecast.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn builds_without_cache() {
        let mut cfg = Config::default();
        cfg.cache.enabled = false;

        assert!(forecaster_from_config(&cfg).is_ok());
    }

    #[test]
    fn builds_with_cache_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.cache.path = dir.path().join("cache");

        assert!(forecaster_from_config(&cfg).is_ok());
    }
}
