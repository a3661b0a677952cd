//! Bounded retry with exponential backoff for idempotent GETs.
//!
//! Retried:
//! - connection failures and timeouts
//! - response bodies cut off mid-read
//! - HTTP 500, 502 and 504
//!
//! Everything else (4xx, other 5xx, malformed bodies) is returned as-is.

use async_trait::async_trait;

use super::{HttpRequest, HttpResponse, Transport};
use crate::{config::RetryPolicy, error::TransportError};

const RETRY_STATUSES: [u16; 3] = [500, 502, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRY_STATUSES.contains(&status)
}

#[derive(Debug)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let max = self.policy.max_retries;
        let mut last = String::new();

        for attempt in 0..=max {
            if attempt > 0 {
                let delay = self.policy.delay_for_attempt(attempt - 1);
                tracing::info!(
                    "Retry attempt {} of {} for {}, waiting {:?}",
                    attempt,
                    max,
                    request.url,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            match self.inner.get(request).await {
                Ok(response) if is_retryable_status(response.status) => {
                    tracing::warn!(
                        "{} returned retryable status {}, attempt {} of {}",
                        request.url,
                        response.status,
                        attempt + 1,
                        max + 1
                    );
                    last = format!("status {}", response.status);
                }
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Request to {} succeeded after {} retries",
                            request.url,
                            attempt
                        );
                    }
                    return Ok(response);
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        "Retryable error on attempt {} of {}: {}",
                        attempt + 1,
                        max + 1,
                        err
                    );
                    last = err.to_string();
                }
                Err(err) => {
                    tracing::debug!("Non-retryable error: {}", err);
                    return Err(err);
                }
            }
        }

        tracing::error!("All {} attempts for {} exhausted", max + 1, request.url);
        Err(TransportError::RetriesExhausted {
            url: request.url.clone(),
            attempts: max + 1,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::{collections::VecDeque, time::Duration};

    /// Plays back canned statuses and records how often it was called.
    #[derive(Debug, Default)]
    struct Scripted {
        statuses: Mutex<VecDeque<u16>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.calls.lock() += 1;
            let status = self.statuses.lock().pop_front().unwrap_or(200);
            Ok(HttpResponse {
                status,
                body: String::from("{}"),
            })
        }
    }

    fn no_wait(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_factor: 0.0,
            max_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(502));
        assert!(is_retryable_status(504));
        assert!(!is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[tokio::test]
    async fn recovers_after_transient_statuses() {
        let transport = RetryingTransport::new(Scripted::new(&[502, 500]), no_wait(5));

        let res = transport.get(&HttpRequest::get("http://test/")).await.unwrap();

        assert_eq!(res.status, 200);
        assert_eq!(transport.inner().calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let transport = RetryingTransport::new(Scripted::new(&[500; 10]), no_wait(5));

        let err = transport.get(&HttpRequest::get("http://test/")).await.unwrap_err();

        assert!(matches!(err, TransportError::RetriesExhausted { attempts: 6, .. }));
        assert_eq!(transport.inner().calls(), 6);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = RetryingTransport::new(Scripted::new(&[400]), no_wait(5));

        let res = transport.get(&HttpRequest::get("http://test/")).await.unwrap();

        assert_eq!(res.status, 400);
        assert_eq!(transport.inner().calls(), 1);
    }
}
