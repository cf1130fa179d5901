//! Billing error types

use swiftbot_shared::SharedError;
use thiserror::Error;

use crate::payment_failure::{self, ApiFailure, FailureKind};
use crate::plan_change::TransitionError;

/// Billing-specific errors
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Stripe API error: {0}")]
    StripeApi(String),

    /// Failure reported by the SwiftBot backend (message is shown to the user as-is)
    #[error("{0}")]
    Api(ApiFailure),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid plan change step: {0}")]
    Transition(#[from] TransitionError),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Setup intent error: {0}")]
    SetupIntent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Decide whether this error should send the user to the card-update flow
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BillingError::Api(failure) => failure.kind(),
            other => payment_failure::kind_from_message(&other.to_string()),
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            BillingError::Api(failure) => failure.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<stripe::StripeError> for BillingError {
    fn from(err: stripe::StripeError) -> Self {
        BillingError::StripeApi(err.to_string())
    }
}

impl From<SharedError> for BillingError {
    fn from(err: SharedError) -> Self {
        BillingError::InvalidPlan(err.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
