use super::ProviderError;
use crate::models::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct RelayRequest {
    title: Option<String>,
    message: Option<String>,
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn internal_error() -> Response {
    reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Internal server error" }),
    )
}

/// Mounted with `any`, so the method check is ours to make.
pub async fn send_notification(
    State(AppState { provider, .. }): State<AppState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return reply(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "Method not allowed" }),
        );
    }

    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = ?e, "relay body is not JSON");
            return internal_error();
        }
    };
    let (title, message) = match (request.title, request.message) {
        (Some(t), Some(m)) if !t.is_empty() && !m.is_empty() => (t, m),
        _ => {
            return reply(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Title and message required" }),
            )
        }
    };

    match provider.broadcast(&title, &message).await {
        Ok(res) if res.status.is_success() => {
            tracing::info!(%title, "push notification broadcast");
            reply(StatusCode::OK, json!({ "success": true, "data": res.body }))
        }
        Ok(res) => {
            tracing::error!(status = %res.status, details = %res.body, "push provider refused");
            reply(
                res.status,
                json!({ "error": "Failed to send notification", "details": res.body }),
            )
        }
        Err(e @ ProviderError::NotConfigured(_)) => {
            tracing::error!(error = %e, "relay cannot forward");
            internal_error()
        }
        Err(e) => {
            tracing::error!(error = ?e, "push provider call failed");
            internal_error()
        }
    }
}
