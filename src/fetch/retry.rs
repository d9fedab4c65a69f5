use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::client::HttpClient;
use super::error::FetchError;
use super::request::ProviderRequest;

/// Fixed-interval retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Issues provider calls through `inner`, retrying every kind of failure the
/// same way until the policy's attempt cap is reached.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: HttpClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Sends `request` and parses the response body as JSON.
    ///
    /// # Errors
    ///
    /// [`FetchError::RequestFailed`] wrapping the last attempt's error once
    /// all attempts failed.
    #[tracing::instrument(skip(self, request), fields(host = %request.host, path = %request.path))]
    pub async fn get_json(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, url = %request, "Sending provider request");

            match self.attempt(request).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    warn!(attempt, error = %err, "Provider request failed, giving up");
                    return Err(FetchError::RequestFailed {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        error = %err,
                        backoff_ms = self.policy.backoff.as_millis() as u64,
                        "Provider request failed, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let response = self.inner.execute(request.build()?).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
