//! Payment provider webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use payment::{SIGNATURE_HEADER, WebhookError, WebhookEvent, WebhookEventKind};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/order/webhook: apply checkout results pushed by the provider.
///
/// Responds 2xx once the event is handled or deliberately ignored; a 5xx
/// makes the provider redeliver, which verification tolerates.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(ApiError::NotFound("Webhook not configured".to_string()));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::MalformedHeader)?;

    let event = WebhookEvent::construct(&payload, signature, secret, Utc::now())?;
    metrics::counter!("webhook_events_total").increment(1);

    match event.kind {
        WebhookEventKind::CheckoutCompleted { order_id } => {
            let outcome = state.workflow.verify_order(order_id, true).await?;
            tracing::info!(event_id = %event.event_id, %order_id, outcome = outcome.as_str(), "checkout completed");
        }
        // Session ids are not stored, so an expired session cannot be told
        // apart from one superseded by retry-payment. Removal is left to the
        // customer's failure redirect.
        WebhookEventKind::CheckoutExpired {
            order_id,
            session_id,
        } => {
            tracing::info!(
                event_id = %event.event_id,
                %order_id,
                session_id = session_id.as_deref().unwrap_or("-"),
                "checkout session ended without payment"
            );
        }
        WebhookEventKind::Other(event_type) => {
            tracing::debug!(event_id = %event.event_id, %event_type, "webhook event ignored");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
