use std::error::Error;
use std::fmt;

/// Unified failure taxonomy for both upstream APIs.
///
/// Caller-input problems (`InvalidParameter`, `UnsupportedScope`,
/// `MissingCredential`) are detected before any network call. The remaining
/// variants classify upstream behavior. Non-fatal data inconsistencies are
/// not errors; they surface as warnings on the affected result.
#[derive(Debug)]
pub enum ApiError {
    /// The resolver or a search found nothing matching the query.
    NotFound(String),
    /// Caller input violates a precondition.
    InvalidParameter(String),
    /// The requested geographic level is not covered by the indicator.
    UnsupportedScope { indicator: String, level: String },
    /// A required access token was not configured.
    MissingCredential(&'static str),
    /// Upstream rejected the supplied token (HTTP 401/403).
    AuthFailure(String),
    /// Upstream throttled the request (HTTP 429).
    RateLimited(String),
    /// The upstream call exceeded the configured per-call timeout.
    UpstreamTimeout(String),
    /// Upstream failed (HTTP 5xx) or was unreachable.
    UpstreamUnavailable(String),
    /// Upstream returned a body that is not parseable or schema-violating.
    MalformedResponse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::InvalidParameter(message) => write!(f, "invalid parameter: {message}"),
            Self::UnsupportedScope { indicator, level } => {
                write!(f, "indicator {indicator} does not cover the {level} level")
            }
            Self::MissingCredential(variable) => {
                write!(f, "missing credential: set {variable} in the environment")
            }
            Self::AuthFailure(message) => write!(f, "authentication failed: {message}"),
            Self::RateLimited(message) => write!(f, "rate limited: {message}"),
            Self::UpstreamTimeout(message) => write!(f, "upstream timeout: {message}"),
            Self::UpstreamUnavailable(message) => {
                write!(f, "upstream unavailable: {message}")
            }
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
        }
    }
}

impl Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_variable() {
        let err = ApiError::MissingCredential("INEGI_DENUE_TOKEN");
        assert!(err.to_string().contains("INEGI_DENUE_TOKEN"));
    }

    #[test]
    fn display_names_indicator_and_level() {
        let err = ApiError::UnsupportedScope {
            indicator: "216906".to_string(),
            level: "municipal".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("216906"));
        assert!(rendered.contains("municipal"));
    }
}
