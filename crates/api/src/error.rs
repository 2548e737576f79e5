//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_store::StoreError;
use payment::{GatewayError, WebhookError};
use serde::Serialize;
use workflow::WorkflowError;

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Workflow or query error.
    Workflow(WorkflowError),
    /// Webhook call could not be authenticated or decoded.
    Webhook(WebhookError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Workflow(err) => workflow_error_to_response(err),
            ApiError::Webhook(err) => {
                tracing::warn!(error = %err, "webhook rejected");
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        };

        let body = ErrorBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn workflow_error_to_response(err: WorkflowError) -> (StatusCode, String) {
    match &err {
        WorkflowError::Order(order_err) if order_err.is_conflict() => {
            (StatusCode::CONFLICT, err.to_string())
        }
        WorkflowError::Order(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        WorkflowError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        WorkflowError::Store(
            StoreError::ConcurrencyConflict { .. } | StoreError::AlreadyExists(_),
        ) => (StatusCode::CONFLICT, err.to_string()),
        WorkflowError::Store(_) => {
            tracing::error!(error = %err, "order store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Order storage failure".to_string(),
            )
        }
        WorkflowError::Gateway(GatewayError::Timeout) | WorkflowError::Timeout { .. } => {
            tracing::error!(error = %err, "upstream timeout");
            (StatusCode::GATEWAY_TIMEOUT, err.to_string())
        }
        WorkflowError::Gateway(_) => {
            tracing::error!(error = %err, "payment gateway failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
