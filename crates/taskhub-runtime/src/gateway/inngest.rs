//! Function-runner endpoint for identity sync functions.
//!
//! `GET` describes the registered functions. `POST ?fnId=<id>` runs one
//! function; `POST` without an id runs every function triggered by the
//! event name. Failures answer 500 so the runner retries the delivery.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use taskhub_core::IdentityEvent;

use super::server::AppState;
use crate::sync::{verify_signature, SyncContext, SyncEntry, SIGNATURE_HEADER};

#[derive(Debug, Default, Deserialize)]
pub struct InvokeQuery {
    #[serde(rename = "fnId", default)]
    pub fn_id: Option<String>,
}

/// Request body sent by the function runner.
#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    pub event: IdentityEvent,
    #[serde(default)]
    pub events: Vec<IdentityEvent>,
    #[serde(default)]
    pub ctx: RunContext,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunContext {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub attempt: u32,
}

#[derive(Debug, Serialize)]
pub struct FunctionDescription {
    pub id: String,
    pub name: String,
    pub triggers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct Introspection {
    pub app_id: String,
    pub function_count: usize,
    pub functions: Vec<FunctionDescription>,
}

fn error_response(status: StatusCode, error: impl Into<String>, function_id: Option<&str>) -> Response {
    let mut body = json!({ "error": error.into() });
    if let Some(id) = function_id {
        body["function_id"] = json!(id);
    }
    (status, Json(body)).into_response()
}

/// `GET /api/inngest`
pub async fn introspect(State(state): State<Arc<AppState>>) -> Json<Introspection> {
    let app_id = &state.sync_config().app_id;
    let functions: Vec<_> = state
        .registry()
        .infos()
        .into_iter()
        .map(|info| FunctionDescription {
            id: format!("{}-{}", app_id, info.id),
            name: info.name.to_string(),
            triggers: vec![json!({ "event": info.trigger })],
        })
        .collect();

    Json(Introspection {
        app_id: app_id.clone(),
        function_count: functions.len(),
        functions,
    })
}

/// `POST /api/inngest`
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InvokeQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let sync = state.sync_config();

    if let Some(key) = sync.signing_key.as_deref() {
        let header = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        let now = chrono::Utc::now().timestamp();
        if let Err(e) = verify_signature(header, &body, key, sync.max_signature_age_secs, now) {
            tracing::warn!(error = %e, "Rejected sync request");
            return error_response(StatusCode::UNAUTHORIZED, e.to_string(), None);
        }
    }

    let request: InvokeBody = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", e),
                query.fn_id.as_deref(),
            )
        }
    };

    let ctx = SyncContext::new(state.db().clone())
        .with_event_id(request.event.id.clone().or(request.ctx.run_id.clone()))
        .with_attempt(request.ctx.attempt);

    match query.fn_id.as_deref().filter(|id| !id.is_empty()) {
        Some(fn_id) => {
            let Some(entry) = state.registry().resolve(&sync.app_id, fn_id) else {
                return error_response(StatusCode::NOT_FOUND, "Function not found", Some(fn_id));
            };
            match run_entry(&entry, &ctx, request.event).await {
                Ok(output) => (StatusCode::OK, Json(output)).into_response(),
                Err(response) => response,
            }
        }
        None => {
            let event_name = request.event.name.clone();
            let mut results = Vec::new();
            for entry in state.registry().triggered_by(&event_name) {
                match run_entry(&entry, &ctx, request.event.clone()).await {
                    Ok(output) => results.push(json!({
                        "function_id": entry.info.id,
                        "output": output,
                    })),
                    Err(response) => return response,
                }
            }
            if results.is_empty() {
                tracing::debug!(event = %event_name, "No sync function for event");
            }
            (StatusCode::OK, Json(json!({ "event": event_name, "results": results }))).into_response()
        }
    }
}

async fn run_entry(
    entry: &SyncEntry,
    ctx: &SyncContext,
    event: IdentityEvent,
) -> Result<Value, Response> {
    let function_id = entry.info.id;
    let event_name = event.name.clone();

    tracing::info!(function_id, event = %event_name, attempt = ctx.attempt, "Running sync function");

    entry.run(ctx, event).await.map_err(|e| {
        tracing::error!(function_id, event = %event_name, error = %e, "Sync function failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Some(function_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_with_context() {
        let body: InvokeBody = serde_json::from_value(json!({
            "event": { "name": "clerk/user.deleted", "data": { "id": "user_1" } },
            "events": [{ "name": "clerk/user.deleted", "data": { "id": "user_1" } }],
            "ctx": { "run_id": "01HRUN", "attempt": 2, "fn_id": "my-app-delete-user-from-clerk" }
        }))
        .unwrap();
        assert_eq!(body.event.name, "clerk/user.deleted");
        assert_eq!(body.events.len(), 1);
        assert_eq!(body.ctx.attempt, 2);
        assert_eq!(body.ctx.run_id.as_deref(), Some("01HRUN"));
    }

    #[test]
    fn test_body_without_context() {
        let body: InvokeBody = serde_json::from_value(json!({
            "event": { "name": "clerk/user.created", "data": {} }
        }))
        .unwrap();
        assert!(body.events.is_empty());
        assert_eq!(body.ctx.attempt, 0);
    }
}
