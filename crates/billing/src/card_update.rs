//! Card update flow
//!
//! 1. ask the backend for a setup intent (client secret)
//! 2. confirm the setup intent with the card the user entered
//! 3. tell the backend to make the new payment method the default
//!
//! Each step is terminal on failure; the user restarts the flow.

use serde::Serialize;
use swiftbot_shared::UserId;

use crate::backend::{PaymentMethodBackend, PaymentMethodInput, SetupConfirmer};
use crate::error::{BillingError, BillingResult};

/// Successful card update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardUpdateResult {
    pub setup_intent_id: String,
}

pub struct CardUpdateFlow<P, C> {
    backend: P,
    confirmer: C,
}

impl<P: PaymentMethodBackend, C: SetupConfirmer> CardUpdateFlow<P, C> {
    pub fn new(backend: P, confirmer: C) -> Self {
        Self { backend, confirmer }
    }

    pub async fn run(
        &self,
        user_id: UserId,
        input: &PaymentMethodInput,
    ) -> BillingResult<CardUpdateResult> {
        if input.payment_method_id.trim().is_empty() {
            return Err(BillingError::SetupIntent(
                "A payment method is required".to_string(),
            ));
        }

        let client_secret = self.backend.create_setup_intent(user_id).await?;
        tracing::debug!(user_id = %user_id, "Created setup intent for card update");

        let setup_intent_id = self
            .confirmer
            .confirm_setup(&client_secret, input)
            .await
            .inspect_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Setup intent confirmation failed");
            })?;

        self.backend
            .attach_payment_method(user_id, &setup_intent_id)
            .await?;

        tracing::info!(
            user_id = %user_id,
            setup_intent_id = %setup_intent_id,
            "Updated default payment method"
        );

        Ok(CardUpdateResult { setup_intent_id })
    }
}
