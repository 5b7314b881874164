//! Transport boundary shared by both API clients.
//!
//! The clients describe a call as an [`ApiRequest`]; a [`Transport`] issues it
//! and returns decoded JSON or a typed failure. The production implementation
//! lives in [`http`]; tests substitute a recording mock.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;

/// Where an API expects its access token.
///
/// Both INEGI APIs currently take the token as a trailing path segment, but
/// the adapter supports query-parameter injection as well so the convention
/// stays a per-request property rather than hardwired knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// Token appended as the final path segment.
    PathSegment,
    /// Token passed as a query parameter with the given name.
    QueryParam(&'static str),
}

/// A fully-described upstream GET request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    base_url: String,
    path_segments: Vec<String>,
    query: Vec<(String, String)>,
    token: String,
    token_placement: TokenPlacement,
}

impl ApiRequest {
    #[must_use]
    pub fn new(base_url: &str, token: &str, token_placement: TokenPlacement) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            path_segments: Vec::new(),
            query: Vec::new(),
            token: token.to_string(),
            token_placement,
        }
    }

    #[must_use]
    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_segments
            .extend(segments.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// The full request URL with the token injected.
    #[must_use]
    pub fn url(&self) -> String {
        self.assemble(&self.token)
    }

    /// The request URL with the token masked, safe for logging.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        self.assemble("****")
    }

    fn assemble(&self, token: &str) -> String {
        let mut segments: Vec<String> = self
            .path_segments
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let mut query = self.query.clone();
        match self.token_placement {
            TokenPlacement::PathSegment => {
                segments.push(urlencoding::encode(token).into_owned());
            }
            TokenPlacement::QueryParam(name) => {
                query.push((name.to_string(), token.to_string()));
            }
        }
        let mut url = format!("{}/{}", self.base_url, segments.join("/"));
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }
}

/// Issues upstream GET requests and decodes JSON responses.
///
/// Implementations enforce a bounded per-call timeout and map HTTP status
/// classes onto the error taxonomy. No implementation retries: a failed call
/// is surfaced immediately and any retry policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Issues the request and returns the decoded JSON body.
    ///
    /// # Errors
    /// Returns the typed failure for timeouts, non-2xx statuses, and bodies
    /// that do not parse as JSON.
    async fn get_json(&self, request: &ApiRequest) -> ApiResult<Value>;
}
