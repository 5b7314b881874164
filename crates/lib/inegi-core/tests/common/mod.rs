#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use inegi_core::error::{ApiError, ApiResult};
use inegi_core::transport::{ApiRequest, Transport};

type Responder = Box<dyn Fn(&str) -> ApiResult<Value> + Send + Sync>;

/// Recording transport for tests: routes requests by URL fragment and keeps
/// every issued URL so tests can assert on call counts and request shapes.
pub struct MockTransport {
    routes: Vec<(String, Responder)>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_json(mut self, fragment: &str, value: Value) -> Self {
        self.routes
            .push((fragment.to_string(), Box::new(move |_| Ok(value.clone()))));
        self
    }

    pub fn with_error(mut self, fragment: &str, build: fn() -> ApiError) -> Self {
        self.routes
            .push((fragment.to_string(), Box::new(move |_| Err(build()))));
        self
    }

    pub fn with_handler(
        mut self,
        fragment: &str,
        handler: impl Fn(&str) -> ApiResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.routes
            .push((fragment.to_string(), Box::new(handler)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call log").len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, request: &ApiRequest) -> ApiResult<Value> {
        let url = request.url();
        self.calls.lock().expect("mock call log").push(url.clone());
        for (fragment, responder) in &self.routes {
            if url.contains(fragment.as_str()) {
                return responder(&url);
            }
        }
        Err(ApiError::NotFound(format!("no mock route for {url}")))
    }
}

/// Extracts the 1-based window bounds from a paginated registry URL.
/// `offset` is the distance from the `anchor` path segment to the window
/// start segment (3 for `BuscarEntidad`, 11 for `BuscarAreaAct`).
pub fn window_bounds(url: &str, anchor: &str, offset: usize) -> (usize, usize) {
    let segments: Vec<&str> = url.split('/').collect();
    let position = segments
        .iter()
        .position(|segment| *segment == anchor)
        .expect("anchor segment present in url");
    let start = segments[position + offset].parse().expect("window start");
    let end = segments[position + offset + 1].parse().expect("window end");
    (start, end)
}
