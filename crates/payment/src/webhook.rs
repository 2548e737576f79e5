//! Stripe webhook signature verification and event parsing.

use chrono::{DateTime, Utc};
use common::OrderId;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum accepted age of a signed payload, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Errors raised while authenticating or decoding a webhook call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Invalid {SIGNATURE_HEADER} header")]
    MalformedHeader,

    #[error("Webhook signature mismatch")]
    SignatureMismatch,

    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Webhook event {event_id} carries no order reference")]
    MissingOrderReference { event_id: String },
}

/// What a webhook event means for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// The customer paid.
    CheckoutCompleted { order_id: OrderId },
    /// A session ended without payment. The order may still hold a newer
    /// open session, so this is informational only.
    CheckoutExpired {
        order_id: OrderId,
        session_id: Option<String>,
    },
    /// Any event type the workflow does not act on.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event_id: String,
    pub kind: WebhookEventKind,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawData {
    object: RawSession,
}

#[derive(Debug, Default, Deserialize)]
struct RawSession {
    id: Option<String>,
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    order_id: Option<String>,
}

/// Checks a `t=...,v1=...` signature header against the raw request body.
///
/// Any of several `v1` entries may match, which covers secret rotation.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::MalformedHeader)?;

    let matched = signatures.iter().any(|signature| {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });
    if !matched {
        return Err(WebhookError::SignatureMismatch);
    }

    if (now.timestamp() - ts).abs() > tolerance_secs {
        return Err(WebhookError::TimestampOutOfTolerance);
    }

    Ok(())
}

/// Builds a signature header for `payload`. Used by tests and local tooling
/// that replays provider events.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

impl WebhookEvent {
    /// Decodes an already authenticated payload.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let kind = match raw.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                WebhookEventKind::CheckoutCompleted {
                    order_id: order_reference(&raw)?,
                }
            }
            "checkout.session.expired" | "checkout.session.async_payment_failed" => {
                WebhookEventKind::CheckoutExpired {
                    order_id: order_reference(&raw)?,
                    session_id: raw.data.object.id.clone(),
                }
            }
            other => WebhookEventKind::Other(other.to_string()),
        };

        Ok(Self {
            event_id: raw.id,
            kind,
        })
    }

    /// Verifies the signature, then decodes the payload.
    pub fn construct(
        payload: &[u8],
        header: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, WebhookError> {
        verify_signature(payload, header, secret, now, DEFAULT_TOLERANCE_SECS)?;
        Self::parse(payload)
    }
}

fn order_reference(raw: &RawEvent) -> Result<OrderId, WebhookError> {
    let session = &raw.data.object;
    session
        .client_reference_id
        .as_deref()
        .or(session.metadata.order_id.as_deref())
        .and_then(|id| OrderId::parse(id).ok())
        .ok_or_else(|| WebhookError::MissingOrderReference {
            event_id: raw.id.clone(),
        })
}
