use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::error::Error;

/// Bounded exponential backoff for transient HTTP failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` means a single attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self
            .backoff_factor
            .saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Sends `builder`, retrying connect errors, timeouts, 429 and 5xx per `policy`.
/// Once retries run out the last response or error is handed back as-is.
pub async fn send_with_retry(
    builder: RequestBuilder,
    policy: &RetryPolicy,
    service: &'static str,
) -> reqwest::Result<Response> {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let Some(request) = builder.try_clone() else {
            return builder.send().await;
        };

        match request.send().await {
            Ok(response)
                if is_retryable_status(response.status()) && attempt <= policy.max_retries =>
            {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    service,
                    attempt,
                    status = %response.status(),
                    ?delay,
                    "transient HTTP status, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Ok(response) => return Ok(response),
            Err(e) if is_transient(&e) && attempt <= policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(service, attempt, error = %e, ?delay, "request failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Maps a transport failure to `Timeout` or to the service's unavailable kind.
pub fn transport_error(
    err: reqwest::Error,
    service: &'static str,
    timeout: Duration,
    unavailable: fn(String) -> Error,
) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            service,
            after: timeout,
        }
    } else {
        unavailable(format!("sending request: {err}"))
    }
}
