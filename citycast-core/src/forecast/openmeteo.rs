//! Open-Meteo forecast API client.
//!
//! See: https://open-meteo.com/en/docs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::{ForecastSource, HourlyVariable};
use crate::{
    error::ForecastError,
    model::{Coordinates, ForecastResponse, HourlySeries, half_open_range},
    transport::{HttpRequest, Transport, truncate_body},
};

/// Used to close the time axis when the provider sends a single hour.
const DEFAULT_INTERVAL_SECS: i64 = 3600;

const VARIABLES: [HourlyVariable; 1] = [HourlyVariable::Temperature2m];

#[derive(Debug)]
pub struct OpenMeteoClient<T> {
    transport: T,
    url: String,
}

impl<T: Transport> OpenMeteoClient<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request(&self, coordinates: Coordinates) -> HttpRequest {
        let hourly: Vec<&str> = VARIABLES.iter().map(HourlyVariable::as_str).collect();

        HttpRequest::get(&self.url)
            .query("latitude", coordinates.latitude)
            .query("longitude", coordinates.longitude)
            .query("hourly", hourly.join(","))
            .query("timeformat", "unixtime")
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OmBody {
    Many(Vec<OmForecast>),
    One(Box<OmForecast>),
}

#[derive(Debug, Deserialize)]
struct OmForecast {
    latitude: f64,
    longitude: f64,
    elevation: f64,
    timezone: String,
    timezone_abbreviation: String,
    utc_offset_seconds: i32,
    hourly: Option<OmHourly>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<i64>,
    #[serde(flatten)]
    variables: HashMap<String, serde_json::Value>,
}

impl OmHourly {
    /// Values of `variable`, looked up by name rather than request position.
    fn values(&self, variable: HourlyVariable) -> Result<Vec<Option<f64>>, ForecastError> {
        let raw = self.variables.get(variable.as_str()).ok_or_else(|| {
            ForecastError::MalformedResponse(format!("hourly block has no '{variable}' series"))
        })?;

        serde_json::from_value(raw.clone()).map_err(|e| {
            ForecastError::MalformedResponse(format!(
                "hourly '{variable}' is not a number series: {e}"
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmError {
    reason: String,
}

fn malformed_axis(detail: impl std::fmt::Display) -> ForecastError {
    ForecastError::MalformedResponse(format!("hourly time axis: {detail}"))
}

/// Rebuild the time axis as `[start, end)` and check it against what was returned.
///
/// Every returned time must equal `start + i * interval`; this is checked
/// before anything is allocated, so sparse or huge timestamps fail fast.
fn time_axis(times: &[i64]) -> Result<(i64, i64, i64, Vec<DateTime<Utc>>), ForecastError> {
    let (&start, &last) = match (times.first(), times.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ForecastError::MalformedResponse("hourly block is empty".into())),
    };

    let interval = match times.get(1) {
        Some(&second) => second
            .checked_sub(start)
            .ok_or_else(|| malformed_axis("interval overflows"))?,
        None => DEFAULT_INTERVAL_SECS,
    };
    if interval <= 0 {
        return Err(malformed_axis(format!("interval must be positive, got {interval} s")));
    }

    for (i, &t) in times.iter().enumerate() {
        let expected = i64::try_from(i)
            .ok()
            .and_then(|i| i.checked_mul(interval))
            .and_then(|offset| start.checked_add(offset));
        if expected != Some(t) {
            return Err(ForecastError::MalformedResponse(
                "hourly time axis is not evenly spaced".into(),
            ));
        }
    }

    let end = last
        .checked_add(interval)
        .ok_or_else(|| malformed_axis("end overflows"))?;

    let axis = half_open_range(start, end, interval).map_err(malformed_axis)?;
    if axis.len() != times.len() {
        return Err(malformed_axis(format!(
            "{} hours rebuilt for {} returned",
            axis.len(),
            times.len()
        )));
    }

    Ok((start, end, interval, axis))
}

fn parse_forecast(body: &str) -> Result<ForecastResponse, ForecastError> {
    let parsed: OmBody = serde_json::from_str(body).map_err(|e| {
        ForecastError::MalformedResponse(format!("{e}: {}", truncate_body(body)))
    })?;

    // Multi-location answers: only the first location is consumed.
    let first = match parsed {
        OmBody::One(one) => *one,
        OmBody::Many(many) => many
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::MalformedResponse("response lists no locations".into()))?,
    };

    let hourly = first
        .hourly
        .ok_or_else(|| ForecastError::MalformedResponse("response has no hourly block".into()))?;

    let (start, end, interval, timestamps) = time_axis(&hourly.time)?;
    let temperatures = hourly.values(HourlyVariable::Temperature2m)?;

    let series = HourlySeries::new(timestamps, temperatures)
        .map_err(|e| ForecastError::MalformedResponse(format!("hourly series: {e}")))?;

    Ok(ForecastResponse {
        latitude: first.latitude,
        longitude: first.longitude,
        elevation: first.elevation,
        timezone: first.timezone,
        timezone_abbreviation: first.timezone_abbreviation,
        utc_offset_seconds: first.utc_offset_seconds,
        hourly_start: start,
        hourly_end: end,
        hourly_interval: interval,
        hourly: series,
    })
}

#[async_trait]
impl<T: Transport> ForecastSource for OpenMeteoClient<T> {
    async fn fetch(&self, coordinates: Coordinates) -> Result<ForecastResponse, ForecastError> {
        let res = self.transport.get(&self.request(coordinates)).await?;

        if !res.is_success() {
            let reason = serde_json::from_str::<OmError>(&res.body)
                .map(|e| e.reason)
                .unwrap_or_else(|_| truncate_body(&res.body));

            return Err(ForecastError::Api {
                status: res.status,
                reason,
            });
        }

        let forecast = parse_forecast(&res.body)?;
        tracing::debug!(
            hours = forecast.hourly.points().len(),
            timezone = %forecast.timezone,
            "parsed forecast"
        );

        Ok(forecast)
    }
}
