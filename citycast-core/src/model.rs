use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A latitude/longitude pair in decimal degrees. Always inside valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` unless latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);

        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// A place name as typed by the user, plus its coordinates once resolved.
///
/// Coordinates are either both present or both absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Build a location from possibly-partial provider output; a half result
    /// counts as unresolved.
    pub fn from_parts(
        name: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        };

        Self {
            name: name.into(),
            coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("interval must be positive, got {0} s")]
    NonPositiveInterval(i64),

    #[error("{timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("timestamps are not strictly increasing at index {0}")]
    NotIncreasing(usize),

    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),
}

/// Evenly spaced timestamps covering `[start, end)` in steps of `interval` seconds.
pub fn half_open_range(
    start: i64,
    end: i64,
    interval: i64,
) -> Result<Vec<DateTime<Utc>>, SeriesError> {
    if interval <= 0 {
        return Err(SeriesError::NonPositiveInterval(interval));
    }

    let mut out = Vec::new();
    let mut next = Some(start);
    while let Some(ts) = next.filter(|&ts| ts < end) {
        let at = DateTime::from_timestamp(ts, 0).ok_or(SeriesError::OutOfRange(ts))?;
        out.push(at);
        // Past i64::MAX there is nothing left below `end`.
        next = ts.checked_add(interval);
    }

    Ok(out)
}

/// One row of the hourly table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub time: DateTime<Utc>,
    /// Missing when the provider returned `null` for this hour.
    pub temperature_2m: Option<f64>,
}

/// Hourly temperatures keyed by strictly increasing UTC timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlySeries {
    points: Vec<HourlyPoint>,
}

impl HourlySeries {
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, SeriesError> {
        if timestamps.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }

        if let Some(i) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(SeriesError::NotIncreasing(i + 1));
        }

        let points = timestamps
            .into_iter()
            .zip(values)
            .map(|(time, temperature_2m)| HourlyPoint {
                time,
                temperature_2m,
            })
            .collect();

        Ok(Self { points })
    }

    pub fn points(&self) -> &[HourlyPoint] {
        &self.points
    }
}

/// Forecast for one location, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub utc_offset_seconds: i32,
    /// First hour of the series, unix seconds.
    pub hourly_start: i64,
    /// Exclusive end of the series, unix seconds.
    pub hourly_end: i64,
    pub hourly_interval: i64,
    pub hourly: HourlySeries,
}
