//! Order placement, verification and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderStatus, PlaceOrder};
use order_store::{CartStore, OrderStore};
use payment::PaymentGateway;
use serde::{Deserialize, Deserializer, Serialize};
use workflow::{CheckoutSettings, OrderQueries, OrderWorkflow, VerifyOutcome, WorkflowError};

use crate::error::ApiError;

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedCartStore = Arc<dyn CartStore>;
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub workflow: OrderWorkflow<SharedOrderStore, SharedCartStore, SharedGateway>,
    pub queries: OrderQueries<SharedOrderStore>,
    /// Signing secret for provider webhooks. `None` disables the endpoint.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        store: SharedOrderStore,
        carts: SharedCartStore,
        gateway: SharedGateway,
        settings: CheckoutSettings,
        webhook_secret: Option<String>,
    ) -> Self {
        let queries = OrderQueries::new(store.clone(), settings.call_timeout);
        Self {
            workflow: OrderWorkflow::new(store, carts, gateway, settings),
            queries,
            webhook_secret,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
    pub address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub name: String,
    /// Unit price in minor units.
    pub price: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderRequest {
    pub order_id: String,
    /// The redirect page forwards the query string value, so `"true"` is
    /// accepted as well as `true`.
    #[serde(deserialize_with = "flag")]
    pub success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOrdersRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: String,
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPaymentRequest {
    pub order_id: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub session_url: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_cleared: Option<bool>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItemResponse>,
    pub amount: i64,
    pub delivery_charge: i64,
    pub address: String,
    pub payment: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.as_str().to_string(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.as_str().to_string(),
                    name: item.name,
                    price: item.unit_price.minor(),
                    quantity: item.quantity,
                })
                .collect(),
            amount: order.amount.minor(),
            delivery_charge: order.delivery_charge.minor(),
            address: order.address,
            payment: order.payment,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// -- Handlers --

/// POST /api/order/place-order: record an order and open a checkout session.
#[tracing::instrument(skip(state, body))]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = body?;
    let items = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.product_id,
                item.name,
                item.quantity,
                Money::from_minor(item.price),
            )
        })
        .collect();

    let placed = state
        .workflow
        .place_order(PlaceOrder::new(req.user_id, items, req.address))
        .await?;

    Ok(Json(SessionResponse {
        success: true,
        session_url: placed.redirect_url,
        order_id: placed.order_id.to_string(),
        cart_cleared: Some(placed.cart_cleared),
    }))
}

/// POST /api/order/verify-order: apply the payment result from the redirect page.
#[tracing::instrument(skip(state, body))]
pub async fn verify_order(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifyOrderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    let order_id = parse_order_id(&req.order_id)?;

    let outcome = state.workflow.verify_order(order_id, req.success).await?;
    let message = match outcome {
        VerifyOutcome::Paid | VerifyOutcome::AlreadyPaid => "Paid",
        VerifyOutcome::Cancelled => "Not Paid",
        VerifyOutcome::AlreadyResolved => "Order already resolved",
    };

    Ok(Json(MessageResponse {
        success: outcome.is_paid(),
        message: message.to_string(),
    }))
}

/// POST /api/order/user-orders: orders placed by one user.
#[tracing::instrument(skip(state, body))]
pub async fn user_orders(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UserOrdersRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Vec<OrderResponse>>>, ApiError> {
    let Json(req) = body?;
    let orders = state
        .queries
        .orders_for_user(&UserId::new(req.user_id))
        .await?;

    Ok(Json(DataResponse {
        success: true,
        data: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

/// GET /api/order/list-orders: every order, for the admin panel.
#[tracing::instrument(skip(state))]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<OrderResponse>>>, ApiError> {
    let orders = state.queries.all_orders().await?;

    Ok(Json(DataResponse {
        success: true,
        data: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

/// GET /api/order/{order_id}: a single order.
#[tracing::instrument(skip(state))]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<DataResponse<OrderResponse>>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let order = state.queries.get_order(order_id).await?;

    Ok(Json(DataResponse {
        success: true,
        data: order.into(),
    }))
}

/// POST /api/order/update-status: move an order along the fulfillment lifecycle.
#[tracing::instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body?;
    let order_id = parse_order_id(&req.order_id)?;
    let status: OrderStatus = req.status.parse().map_err(WorkflowError::from)?;

    state.queries.set_status(order_id, status).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Status Updated".to_string(),
    }))
}

/// POST /api/order/retry-payment: new checkout session for an unpaid order.
#[tracing::instrument(skip(state, body))]
pub async fn retry_payment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RetryPaymentRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = body?;
    let order_id = parse_order_id(&req.order_id)?;

    let session = state.workflow.reissue_session(order_id).await?;

    Ok(Json(SessionResponse {
        success: true,
        session_url: session.redirect_url,
        order_id: order_id.to_string(),
        cart_cleared: None,
    }))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id.trim()).map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected true or false, got {other:?}"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_accepts_string_flag() {
        let req: VerifyOrderRequest =
            serde_json::from_str(r#"{"orderId":"x","success":"true"}"#).unwrap();
        assert!(req.success);

        let req: VerifyOrderRequest =
            serde_json::from_str(r#"{"orderId":"x","success":false}"#).unwrap();
        assert!(!req.success);

        assert!(
            serde_json::from_str::<VerifyOrderRequest>(r#"{"orderId":"x","success":"maybe"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_order_response_uses_minor_units() {
        let order = PlaceOrder::new(
            "user-1",
            vec![OrderItem::new("food-1", "Pav bhaji", 2, Money::from_minor(500))],
            "3 Beach Road",
        )
        .into_order(Money::from_minor(2000))
        .unwrap();

        let json = serde_json::to_value(OrderResponse::from(order)).unwrap();
        assert_eq!(json["amount"], 3000);
        assert_eq!(json["deliveryCharge"], 2000);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["price"], 500);
        assert_eq!(json["userId"], "user-1");
    }
}
