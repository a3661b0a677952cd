//! Error taxonomy shared by the transport layers, the geocoder and the
//! forecast client.
//!
//! Callers branch on variants, never on message text: a missing city is
//! [`GeocodeError::NotFound`], a provider that kept failing transiently is
//! [`ForecastError::TransientFailure`], and a body we could not make sense of
//! is `MalformedResponse`.

use thiserror::Error;

/// Failure of a single request as seen through a [`crate::transport::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// One HTTP attempt failed before a status line was received.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The status line arrived but the body could not be read in full.
    #[error("reading response from {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Retries were spent on transient failures.
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// The response cache could not be read or written.
    #[error("response cache error: {0}")]
    Cache(String),
}

impl TransportError {
    /// Whether this failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Request { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_body()
            }
            TransportError::Read { .. } => true,
            TransportError::Client(_)
            | TransportError::RetriesExhausted { .. }
            | TransportError::Cache(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Coordinates not found for {0}")]
    NotFound(String),

    #[error("Geocoder returned status {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("Geocoding request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed geocoding response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Forecast provider unavailable: {0}")]
    TransientFailure(#[source] TransportError),

    #[error("Forecast provider returned status {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("Malformed forecast response: {0}")]
    MalformedResponse(String),

    #[error("Forecast request failed: {0}")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for ForecastError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::RetriesExhausted { .. } => ForecastError::TransientFailure(err),
            other => ForecastError::Transport(other),
        }
    }
}

/// Outcome of the full city -> forecast pipeline.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl LookupError {
    /// True when the city could not be resolved; the forecast was never requested.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::Geocode(GeocodeError::NotFound(_)))
    }
}
