//! Shared HTTP plumbing for provider clients
//!
//! POSTs a JSON body with bounded retries on transient failures. Rate limits
//! are surfaced immediately so the caller sees the provider's retry-after.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
pub(crate) const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Default wait when a 429 carries no usable retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Build a reqwest client with the configured request timeout
pub(crate) fn build_http(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder().timeout(timeout).build().map_err(LlmError::Network)
}

/// POST `body` to `url` and return the successful response body as JSON
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
    timeout: Duration,
) -> Result<serde_json::Value, LlmError> {
    debug!(%url, "post_json: called");

    let mut last_error = None;
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
            warn!(attempt, backoff_ms = backoff, "post_json: retrying after transient error");
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }

        let response = match http.post(url).headers(headers.clone()).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(attempt, error = %e, "post_json: transport error");
                let err = LlmError::from_transport(e, timeout);
                if !err.is_retryable() {
                    return Err(err);
                }
                last_error = Some(err);
                continue;
            }
        };

        let status = response.status().as_u16();

        if status == 429 {
            debug!("post_json: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = LlmError::ApiError { status, message: text };
            if err.is_retryable() && attempt < MAX_RETRIES {
                debug!(attempt, status, "post_json: retryable status");
                last_error = Some(err);
                continue;
            }
            debug!(%status, "post_json: API error");
            return Err(err);
        }

        debug!("post_json: success");
        return response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::from_transport(e, timeout));
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}
