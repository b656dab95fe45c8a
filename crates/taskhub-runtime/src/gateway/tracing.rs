use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request ids, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct TracingState {
    /// Propagated from `x-trace-id` when the caller sent one.
    pub trace_id: String,
    pub request_id: String,
    pub start_time: Instant,
}

impl TracingState {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    pub fn with_trace_id(trace_id: String) -> Self {
        Self {
            trace_id,
            request_id: Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for TracingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Assign trace/request ids, echo them on the response, and log the request.
pub async fn tracing_middleware(mut req: Request, next: Next) -> Response {
    let state = req
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| TracingState::with_trace_id(v.to_string()))
        .unwrap_or_default();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(state.clone());

    let mut response = next.run(req).await;

    let status = response.status();
    let latency_ms = state.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(
            %method, %path, status = status.as_u16(), latency_ms,
            trace_id = %state.trace_id, request_id = %state.request_id,
            "Request failed"
        );
    } else {
        tracing::info!(
            %method, %path, status = status.as_u16(), latency_ms,
            trace_id = %state.trace_id, request_id = %state.request_id,
            "Request completed"
        );
    }

    if let Ok(val) = HeaderValue::from_str(&state.trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, val);
    }
    if let Ok(val) = HeaderValue::from_str(&state.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}
