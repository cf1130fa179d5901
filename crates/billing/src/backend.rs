//! Backend seams used by the billing workflows
//!
//! The SwiftBot backend owns proration, downgrade scheduling and payment
//! method storage. These traits describe what the workflows need from it so
//! the HTTP client (and test doubles) can plug in.

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use swiftbot_shared::{BillingPeriod, Subscription, UserId};

use crate::classifier::ChangeClassification;
use crate::error::BillingResult;

/// Body of `POST /api/subscription/upgrade` (used for both directions)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanChangeRequest {
    pub user_id: UserId,
    pub connections: u8,
    pub billing_period: BillingPeriod,
    pub change_type: ChangeClassification,
}

/// Reply from the plan-change endpoint.
///
/// Only `success` is binding. The other fields feed the confirmation text, so
/// a value of the wrong type reads as absent instead of failing the reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanChangeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub change_type: Option<ChangeClassification>,
    /// Prorated amount charged now, in reais; numeric strings are accepted
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount_charged: Option<f64>,
    /// When a deferred downgrade applies; free-form, may not parse
    #[serde(default, deserialize_with = "lenient")]
    pub effective_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<String>,
}

/// `Some` when the value has the expected type, `None` otherwise
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(IgnoredAny),
    }

    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Value(value)) => Some(value),
        Some(Lenient::Other(_)) | None => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Amount>::deserialize(deserializer)? {
        Some(Amount::Number(amount)) => Some(amount),
        Some(Amount::Text(text)) => parse_amount(&text),
        Some(Amount::Other(_)) | None => None,
    })
}

/// "490.00", "490,00" or "R$ 490,00"
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim().trim_start_matches("R$").trim();
    let normalized = if text.contains(',') && !text.contains('.') {
        text.replace(',', ".")
    } else {
        text.to_string()
    };
    normalized.parse().ok()
}

impl PlanChangeResponse {
    pub fn amount_charged_cents(&self) -> Option<i64> {
        self.amount_charged
            .filter(|amount| amount.is_finite())
            .map(|amount| (amount * 100.0).round() as i64)
    }
}

/// Reply from `POST /api/subscription/cancel`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub canceled_at: Option<String>,
    /// Access continues until this date
    #[serde(default)]
    pub access_until: Option<String>,
}

/// Subscription reads and writes
#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn fetch_subscription(&self, user_id: UserId) -> BillingResult<Subscription>;

    async fn change_plan(&self, request: &PlanChangeRequest) -> BillingResult<PlanChangeResponse>;

    async fn cancel_subscription(
        &self,
        user_id: UserId,
        reason: Option<&str>,
    ) -> BillingResult<CancelResponse>;

    /// Drop a scheduled (deferred) downgrade
    async fn cancel_scheduled_change(&self, user_id: UserId) -> BillingResult<()>;
}

/// Server side of the card-update flow
#[async_trait]
pub trait PaymentMethodBackend: Send + Sync {
    /// Returns the setup intent client secret
    async fn create_setup_intent(&self, user_id: UserId) -> BillingResult<String>;

    /// Make the payment method saved by the setup intent the customer's default
    async fn attach_payment_method(&self, user_id: UserId, setup_intent_id: &str)
        -> BillingResult<()>;
}

/// What the card form collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodInput {
    /// Stripe payment method id (`pm_...`) created from the card form
    pub payment_method_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// Confirms a setup intent with the collected card
#[async_trait]
pub trait SetupConfirmer: Send + Sync {
    /// Returns the setup intent id once it has succeeded
    async fn confirm_setup(
        &self,
        client_secret: &str,
        input: &PaymentMethodInput,
    ) -> BillingResult<String>;
}
