//! Stripe Checkout over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::gateway::PaymentGateway;
use crate::session::{CheckoutRequest, CheckoutSession};
use crate::{GatewayError, Result};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Connection settings for the Stripe gateway.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Points the gateway at another API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Creates one-off payment sessions with Stripe Checkout.
#[derive(Debug, Clone)]
pub struct StripeCheckoutGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeCheckoutGateway {
    pub fn new(config: StripeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.config.api_base)
    }
}

/// Encodes a checkout request as Stripe's bracketed form parameters.
pub(crate) fn checkout_form(request: &CheckoutRequest) -> Result<Vec<(String, String)>> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("client_reference_id".to_string(), request.order_id.to_string()),
        ("metadata[order_id]".to_string(), request.order_id.to_string()),
    ];

    for (i, line) in request.all_line_items().iter().enumerate() {
        if line.quantity == 0 || line.unit_amount.minor() < 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "line '{}' has an invalid amount or quantity",
                line.name
            )));
        }
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount.minor().to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
    }

    Ok(form)
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let form = checkout_form(&request)?;

        let response = self
            .client
            .post(self.sessions_url())
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message.unwrap_or_default(),
                Err(_) => String::new(),
            };
            tracing::warn!(status = status.as_u16(), %message, "stripe rejected checkout session");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: SessionResponse = response.json().await?;
        let redirect_url = body.url.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("session {} has no url", body.id))
        })?;

        tracing::debug!(session_id = %body.id, "checkout session created");
        Ok(CheckoutSession {
            session_id: body.id,
            redirect_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LineItem, RedirectUrls};
    use axum::{Form, Json, Router, http::StatusCode, routing::post};
    use common::OrderId;
    use domain::Money;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    fn request() -> CheckoutRequest {
        let order_id = OrderId::new();
        let redirects = RedirectUrls::new("http://localhost:5174");
        CheckoutRequest {
            order_id,
            line_items: vec![
                LineItem::new("Paneer tikka", Money::from_minor(500), 2),
                LineItem::new("Lassi", Money::from_minor(300), 1),
            ],
            delivery_charge: Money::from_minor(2000),
            success_url: redirects.success_url(order_id),
            cancel_url: redirects.cancel_url(order_id),
            currency: "inr".to_string(),
        }
    }

    fn lookup<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_checkout_form_lines() {
        let request = request();
        let form = checkout_form(&request).unwrap();

        assert_eq!(lookup(&form, "mode"), Some("payment"));
        assert_eq!(
            lookup(&form, "line_items[0][price_data][unit_amount]"),
            Some("500")
        );
        assert_eq!(lookup(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            lookup(&form, "line_items[2][price_data][product_data][name]"),
            Some("Delivery Charges")
        );
        assert_eq!(
            lookup(&form, "line_items[2][price_data][unit_amount]"),
            Some("2000")
        );
        assert_eq!(
            lookup(&form, "client_reference_id"),
            Some(request.order_id.to_string().as_str())
        );
        assert!(lookup(&form, "line_items[3][quantity]").is_none());
    }

    #[test]
    fn test_checkout_form_rejects_zero_quantity() {
        let mut request = request();
        request.line_items[0].quantity = 0;
        assert!(matches!(
            checkout_form(&request),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_create_session_against_fake_api() {
        let app = Router::new().route(
            "/v1/checkout/sessions",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let order_id = form.get("client_reference_id").cloned().unwrap_or_default();
                Json(serde_json::json!({
                    "id": "cs_test_123",
                    "url": format!("https://checkout.stripe.test/pay/{order_id}"),
                }))
            }),
        );
        let base = serve(app).await;

        let gateway =
            StripeCheckoutGateway::new(StripeConfig::new("sk_test").with_api_base(base)).unwrap();
        let request = request();
        let session = gateway.create_session(request.clone()).await.unwrap();

        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(
            session.redirect_url,
            format!("https://checkout.stripe.test/pay/{}", request.order_id)
        );
    }

    #[tokio::test]
    async fn test_create_session_rejected() {
        let app = Router::new().route(
            "/v1/checkout/sessions",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": {"message": "Invalid currency"}})),
                )
            }),
        );
        let base = serve(app).await;

        let gateway =
            StripeCheckoutGateway::new(StripeConfig::new("sk_test").with_api_base(base)).unwrap();
        let result = gateway.create_session(request()).await;

        match result {
            Err(GatewayError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid currency");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let gateway = StripeCheckoutGateway::new(
            StripeConfig::new("sk_test").with_api_base("http://127.0.0.1:1"),
        )
        .unwrap();
        let result = gateway.create_session(request()).await;
        assert!(matches!(
            result,
            Err(GatewayError::Unreachable(_) | GatewayError::Timeout)
        ));
    }
}
