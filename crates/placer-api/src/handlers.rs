//! REST API handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use placer_core::{DeployOutcome, PlacementRequest};
use placer_observe::{Level, StatsSnapshot};

use crate::error::ApiError;
use crate::{ApiState, ROUTES};

/// GET /
pub async fn index() -> Html<String> {
    let mut rows = String::new();
    for spec in ROUTES {
        rows.push_str(&format!(
            "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
            spec.method, spec.path, spec.summary
        ));
    }
    Html(format!(
        "<!doctype html>\n<html><head><title>placement service</title></head>\n\
         <body><h1>placement service</h1>\n\
         <table border=\"1\"><tr><th>Method</th><th>Path</th><th>Description</th></tr>\n\
         {rows}</table></body></html>\n"
    ))
}

/// POST /deployments
pub async fn create_deployment(State(state): State<ApiState>, body: Bytes) -> Response {
    match handle_deployment(&state, &body).await {
        Ok(outcome) => {
            state.stats.record_success("deploy");
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => {
            state.stats.record_failure("deploy");
            state.log.append(Level::Error, &err.message);
            err.into_response()
        }
    }
}

async fn handle_deployment(state: &ApiState, body: &[u8]) -> Result<DeployOutcome, ApiError> {
    let request = parse_request(body)?;
    Ok(state.engine.deploy(&request).await?)
}

/// The request body must be a non-empty JSON object; anything else is
/// rejected before the engine runs.
fn parse_request(body: &[u8]) -> Result<PlacementRequest, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("no POST body"));
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(serde_json::Value::Object(_)) | Ok(serde_json::Value::Null) => {
            Err(ApiError::bad_request("no POST body"))
        }
        Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
        Err(_) => Err(ApiError::bad_request("no POST body")),
    }
}

/// GET /stats
pub async fn stats(State(state): State<ApiState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
