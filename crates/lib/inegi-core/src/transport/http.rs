//! `reqwest`-backed transport implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::transport::{ApiRequest, Transport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Production transport over a shared `reqwest` client.
///
/// The client is reused for connection pooling only; no request state
/// survives a call. The timeout bounds each individual upstream call, not a
/// whole multi-page operation.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .unwrap_or_default(),
            timeout,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, request: &ApiRequest) -> ApiResult<Value> {
        let url = request.url();
        debug!(url = %request.redacted_url(), "issuing upstream request");
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| classify_send_error(&err, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                url = %request.redacted_url(),
                "upstream returned an error status"
            );
            return Err(classify_status(status));
        }

        response.json::<Value>().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::UpstreamTimeout(format!(
                    "response body not received within {}s",
                    self.timeout.as_secs()
                ))
            } else {
                ApiError::MalformedResponse(format!("body is not valid JSON: {err}"))
            }
        })
    }
}

fn classify_send_error(err: &reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::UpstreamTimeout(format!(
            "no response within {}s",
            timeout.as_secs()
        ))
    } else {
        ApiError::UpstreamUnavailable(format!("request failed: {err}"))
    }
}

fn classify_status(status: StatusCode) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ApiError::AuthFailure(format!("upstream rejected the token (HTTP {status})"))
        }
        StatusCode::NOT_FOUND => {
            ApiError::NotFound("upstream has no resource for this request (HTTP 404)".to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            ApiError::RateLimited("upstream throttled the request (HTTP 429)".to_string())
        }
        _ if status.is_server_error() => {
            ApiError::UpstreamUnavailable(format!("upstream failure (HTTP {status})"))
        }
        _ => ApiError::UpstreamUnavailable(format!("unexpected HTTP status {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_auth_failure() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            ApiError::AuthFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            ApiError::AuthFailure(_)
        ));
    }

    #[test]
    fn throttling_and_server_errors_are_distinguished() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            ApiError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            ApiError::UpstreamUnavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            ApiError::NotFound(_)
        ));
    }
}
