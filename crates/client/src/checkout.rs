//! Checkout endpoints for the card-update flow

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use swiftbot_billing::{BillingError, BillingResult, PaymentMethodBackend};
use swiftbot_shared::UserId;

use crate::account::AccountClient;
use crate::http::Ack;

pub(crate) const CREATE_SETUP_INTENT: &str = "/api/checkout/create-setup-intent-update";
pub(crate) const UPDATE_PAYMENT_METHOD: &str = "/api/checkout/update-payment-method";

#[derive(Debug, Serialize)]
struct SetupIntentRequest {
    user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct SetupIntentResponse {
    #[serde(default, alias = "clientSecret")]
    client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdatePaymentMethodRequest<'a> {
    user_id: UserId,
    setup_intent_id: &'a str,
}

#[async_trait]
impl PaymentMethodBackend for AccountClient {
    async fn create_setup_intent(&self, user_id: UserId) -> BillingResult<String> {
        let response: SetupIntentResponse = self
            .api()
            .post(CREATE_SETUP_INTENT, &SetupIntentRequest { user_id })
            .await?;

        response
            .client_secret
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| BillingError::SetupIntent("No client secret returned".to_string()))
    }

    async fn attach_payment_method(
        &self,
        user_id: UserId,
        setup_intent_id: &str,
    ) -> BillingResult<()> {
        let _: Ack = self
            .api()
            .post(
                UPDATE_PAYMENT_METHOD,
                &UpdatePaymentMethodRequest {
                    user_id,
                    setup_intent_id,
                },
            )
            .await?;
        Ok(())
    }
}
