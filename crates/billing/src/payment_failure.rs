//! Payment failure triage
//!
//! Decides whether a failed plan change was caused by the customer's payment
//! method, in which case the card-update flow is offered. The backend can send
//! a structured `code`; older responses only carry free text, so keyword
//! matching stays as the fallback.

use serde::{Deserialize, Serialize};

/// Substrings that mark a free-text error as payment related (matched case-insensitively)
pub const PAYMENT_ERROR_KEYWORDS: &[&str] = &[
    "card",
    "declined",
    "insufficient",
    "payment",
    "pagamento",
    "funds",
];

/// Structured failure code returned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    CardDeclined,
    InsufficientFunds,
    ExpiredCard,
    IncorrectCvc,
    ProcessingError,
    PaymentFailed,
    AuthenticationRequired,
    PaymentMethodRequired,
    SubscriptionNotFound,
    InvalidPlan,
    Unauthorized,
    #[serde(other)]
    Other,
}

impl FailureCode {
    /// Codes the customer can fix by updating their card
    pub fn is_payment_related(&self) -> bool {
        matches!(
            self,
            Self::CardDeclined
                | Self::InsufficientFunds
                | Self::ExpiredCard
                | Self::IncorrectCvc
                | Self::ProcessingError
                | Self::PaymentFailed
                | Self::AuthenticationRequired
                | Self::PaymentMethodRequired
        )
    }
}

/// How a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Payment method problem: offer the card-update flow
    Payment,
    /// Anything else: show the message
    Generic,
}

/// Failure reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub message: String,
    #[serde(default)]
    pub code: Option<FailureCode>,
    #[serde(default)]
    pub status: Option<u16>,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: FailureCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// A recognised code decides; otherwise the message text does
    pub fn kind(&self) -> FailureKind {
        match self.code {
            Some(code) if code != FailureCode::Other => {
                if code.is_payment_related() {
                    FailureKind::Payment
                } else {
                    FailureKind::Generic
                }
            }
            _ => kind_from_message(&self.message),
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Keyword check on a free-text error message
pub fn is_payment_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    PAYMENT_ERROR_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

pub fn kind_from_message(message: &str) -> FailureKind {
    if is_payment_error(message) {
        FailureKind::Payment
    } else {
        FailureKind::Generic
    }
}
