use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::ForecastError,
    model::{Coordinates, ForecastResponse},
};

pub mod openmeteo;

pub use openmeteo::OpenMeteoClient;

/// Hourly variables the forecast client knows how to request and read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HourlyVariable {
    Temperature2m,
}

impl HourlyVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            HourlyVariable::Temperature2m => "temperature_2m",
        }
    }
}

impl std::fmt::Display for HourlyVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, coordinates: Coordinates) -> Result<ForecastResponse, ForecastError>;
}

#[async_trait]
impl<F: ForecastSource + ?Sized> ForecastSource for Box<F> {
    async fn fetch(&self, coordinates: Coordinates) -> Result<ForecastResponse, ForecastError> {
        (**self).fetch(coordinates).await
    }
}
