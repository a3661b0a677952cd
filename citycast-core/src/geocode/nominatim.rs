//! Forward geocoding through Nominatim (OpenStreetMap). No API key, but an
//! identifying User-Agent is mandatory.

use async_trait::async_trait;
use serde::Deserialize;

use super::Geocoder;
use crate::{
    error::GeocodeError,
    model::{Coordinates, Location},
    transport::{HttpRequest, HttpTransport, Transport, truncate_body},
};

#[derive(Debug)]
pub struct NominatimGeocoder<T = HttpTransport> {
    transport: T,
    url: String,
    user_agent: String,
}

impl<T: Transport> NominatimGeocoder<T> {
    pub fn new(transport: T, url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            user_agent: user_agent.into(),
        }
    }

    fn request(&self, city: &str) -> HttpRequest {
        HttpRequest::get(&self.url)
            .query("q", city)
            .query("format", "json")
            .query("limit", 1)
            .header("User-Agent", &self.user_agent)
    }
}

/// Nominatim encodes coordinates as strings; accept numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Text(String),
    Number(f64),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        match self {
            Degrees::Text(s) => s.trim().parse().ok(),
            Degrees::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<Degrees>,
    lon: Option<Degrees>,
    display_name: Option<String>,
}

#[async_trait]
impl<T: Transport> Geocoder for NominatimGeocoder<T> {
    async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodeError> {
        let res = self.transport.get(&self.request(city)).await?;

        if !res.is_success() {
            return Err(GeocodeError::Api {
                status: res.status,
                reason: truncate_body(&res.body),
            });
        }

        let places: Vec<NominatimPlace> = serde_json::from_str(&res.body).map_err(|e| {
            GeocodeError::MalformedResponse(format!("{e}: {}", truncate_body(&res.body)))
        })?;

        let Some(best) = places.into_iter().next() else {
            tracing::warn!("Coordinates not found for {}", city);
            return Err(GeocodeError::NotFound(city.to_string()));
        };

        let lat = best.lat.as_ref().and_then(Degrees::value);
        let lon = best.lon.as_ref().and_then(Degrees::value);

        if let (Some(lat), Some(lon)) = (lat, lon) {
            if Coordinates::new(lat, lon).is_none() {
                return Err(GeocodeError::MalformedResponse(format!(
                    "coordinates out of range: {lat}, {lon}"
                )));
            }
        }

        let location = Location::from_parts(city, lat, lon);
        match location.coordinates {
            Some(coords) => {
                tracing::info!(
                    "Resolved {} to {}, {} ({})",
                    city,
                    coords.latitude,
                    coords.longitude,
                    best.display_name.as_deref().unwrap_or("unnamed")
                );
                Ok(coords)
            }
            None => {
                tracing::warn!("Coordinates not found for {} (incomplete match)", city);
                Err(GeocodeError::NotFound(city.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_query_and_user_agent() {
        let geocoder = NominatimGeocoder::new(
            HttpTransport::new().unwrap(),
            "https://nominatim.example/search",
            "citycast-test",
        );

        let req = geocoder.request("Paris");

        assert_eq!(req.url, "https://nominatim.example/search");
        assert!(req.query.contains(&("q".to_string(), "Paris".to_string())));
        assert!(req.query.contains(&("format".to_string(), "json".to_string())));
        assert!(req.headers.contains(&("User-Agent".to_string(), "citycast-test".to_string())));
    }

    #[test]
    fn degrees_accept_strings_and_numbers() {
        let raw = r#"{"lat":"48.8588897","lon":2.32,"display_name":"Paris"}"#;
        let place: NominatimPlace = serde_json::from_str(raw).unwrap();

        assert_eq!(place.lat.and_then(|d| d.value()), Some(48.8588897));
        assert_eq!(place.lon.and_then(|d| d.value()), Some(2.32));
    }

    #[test]
    fn unparsable_degrees_are_absent() {
        let place: NominatimPlace = serde_json::from_str(r#"{"lat":"north","lon":"2.3"}"#).unwrap();
        assert_eq!(place.lat.and_then(|d| d.value()), None);
    }
}
