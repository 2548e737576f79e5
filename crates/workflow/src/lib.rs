//! Order workflow.
//!
//! Coordinates the order store, the cart collaborator and the payment
//! gateway:
//! 1. Validate and price the order
//! 2. Persist it as pending
//! 3. Clear the user's cart (best effort)
//! 4. Open a checkout session and hand back the redirect
//!
//! The provider's verdict later arrives through [`OrderWorkflow::verify_order`],
//! which either marks the order paid or removes it. Nothing here spans a
//! transaction; order and payment state are reconciled by these calls alone.

pub mod error;
pub mod orchestrator;
pub mod queries;
pub mod settings;

pub use error::{Result, WorkflowError};
pub use orchestrator::{OrderWorkflow, PlacedOrder, VerifyOutcome};
pub use queries::OrderQueries;
pub use settings::CheckoutSettings;
