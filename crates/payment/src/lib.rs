//! Payment session gateway.
//!
//! Builds hosted checkout sessions for placed orders and verifies the
//! provider's webhook callbacks. The provider only ever sees integer
//! minor-unit amounts.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod session;
pub mod stripe;
pub mod webhook;

pub use error::{GatewayError, Result};
pub use gateway::PaymentGateway;
pub use memory::InMemoryPaymentGateway;
pub use session::{CheckoutRequest, CheckoutSession, DELIVERY_LINE_NAME, LineItem, RedirectUrls};
pub use stripe::{StripeCheckoutGateway, StripeConfig};
pub use webhook::{
    DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER, WebhookError, WebhookEvent, WebhookEventKind,
    signature_header, verify_signature,
};
