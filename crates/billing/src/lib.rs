// Billing crate clippy configuration
// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! SwiftBot Billing Module
//!
//! Subscription plan-change logic for the SwiftBot account pages.
//!
//! ## Features
//!
//! - **Price Table**: BRL prices per billing period and number of WhatsApp connections
//! - **Classification**: Decide whether a plan change is an upgrade or a downgrade
//! - **Plan Change Orchestration**: Immediate upgrades, confirmed and deferred downgrades
//! - **Status Projection**: Display status and remaining days from the subscription row
//! - **Payment Failure Triage**: Detect card problems and offer a card update
//! - **Card Update**: Setup intent creation, confirmation and attachment

pub mod backend;
pub mod card_update;
pub mod classifier;
pub mod client;
pub mod error;
pub mod messages;
pub mod orchestrator;
pub mod payment_failure;
pub mod plan_change;
pub mod pricing;
pub mod status;

// Backend seams
pub use backend::{
    CancelResponse, PaymentMethodBackend, PaymentMethodInput, PlanChangeRequest,
    PlanChangeResponse, SetupConfirmer, SubscriptionBackend,
};

// Card update
pub use card_update::{CardUpdateFlow, CardUpdateResult};

// Classification
pub use classifier::{classify, evaluate, ChangeClassification, PlanChange};

// Client
pub use client::{StripeClient, StripeConfig, StripeSetupConfirmer};

// Error
pub use error::{BillingError, BillingResult};

// Messages
pub use messages::Locale;

// Orchestration
pub use orchestrator::PlanChangeSession;
pub use plan_change::{
    transition, PlanChangeEvent, PlanChangeFailure, PlanChangeOutcome, PlanChangeState,
    TransitionError,
};

// Payment failures
pub use payment_failure::{is_payment_error, ApiFailure, FailureCode, FailureKind};

// Pricing
pub use pricing::{price_cents, PlanPrice, PriceTable};

// Status
pub use status::{project, project_now, ProjectedStatus};
