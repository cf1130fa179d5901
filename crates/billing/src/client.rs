//! Stripe client configuration and setup intent confirmation

use async_trait::async_trait;
use serde::Serialize;
use stripe::{Client, SetupIntent, SetupIntentId, SetupIntentStatus};

use crate::backend::{PaymentMethodInput, SetupConfirmer};
use crate::error::{BillingError, BillingResult};

/// Configuration for Stripe
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub secret_key: String,
    /// Where Stripe sends the user back after a 3-D Secure challenge
    pub return_url: Option<String>,
}

impl StripeConfig {
    /// Create config from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Ok(Self {
            secret_key: std::env::var("STRIPE_SECRET_KEY")
                .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".to_string()))?,
            return_url: std::env::var("STRIPE_RETURN_URL").ok(),
        })
    }
}

/// Stripe billing client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    /// Create a new Stripe client from config
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::new(&config.secret_key);
        Self { client, config }
    }

    /// Create a new Stripe client from environment variables
    pub fn from_env() -> BillingResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Get the inner Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the config
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}

/// Setup intent id embedded in a client secret (`seti_XXX_secret_YYY`)
pub fn setup_intent_id_from_client_secret(client_secret: &str) -> BillingResult<SetupIntentId> {
    let (id, _) = client_secret
        .split_once("_secret_")
        .ok_or_else(|| BillingError::SetupIntent("Malformed setup intent client secret".to_string()))?;

    id.parse::<SetupIntentId>()
        .map_err(|e| BillingError::SetupIntent(format!("Invalid setup intent ID: {}", e)))
}

#[derive(Debug, Serialize)]
struct ConfirmSetupIntentForm<'a> {
    payment_method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<&'a str>,
}

/// Confirms setup intents through the Stripe API with the secret key
#[derive(Clone)]
pub struct StripeSetupConfirmer {
    stripe: StripeClient,
}

impl StripeSetupConfirmer {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }
}

#[async_trait]
impl SetupConfirmer for StripeSetupConfirmer {
    async fn confirm_setup(
        &self,
        client_secret: &str,
        input: &PaymentMethodInput,
    ) -> BillingResult<String> {
        let setup_intent_id = setup_intent_id_from_client_secret(client_secret)?;

        let form = ConfirmSetupIntentForm {
            payment_method: &input.payment_method_id,
            return_url: input
                .return_url
                .as_deref()
                .or(self.stripe.config().return_url.as_deref()),
        };

        let intent: SetupIntent = self
            .stripe
            .inner()
            .post_form(&format!("/setup_intents/{}/confirm", setup_intent_id), &form)
            .await?;

        match intent.status {
            SetupIntentStatus::Succeeded => {
                tracing::info!(setup_intent_id = %intent.id, "Setup intent confirmed");
                Ok(intent.id.to_string())
            }
            SetupIntentStatus::RequiresAction => Err(BillingError::SetupIntent(
                "Card requires additional authentication".to_string(),
            )),
            SetupIntentStatus::RequiresPaymentMethod => Err(BillingError::SetupIntent(
                "Card was declined, please use another payment method".to_string(),
            )),
            status => Err(BillingError::SetupIntent(format!(
                "Setup intent not completed (status: {:?})",
                status
            ))),
        }
    }
}
