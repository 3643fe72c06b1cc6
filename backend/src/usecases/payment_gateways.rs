use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use crates::{
    domain::value_objects::enums::subscription_tiers::SubscriptionTier,
    payments::{
        gateway_error::GatewayError,
        paypal_client::{PayPalClient, PayPalEvent},
        stripe_client::{StripeClient, StripeEvent},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::config::config_model::DotEnvyConfig;

/// Provider-side checkout created for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCheckout {
    pub reference: String,
    pub url: String,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait StripeGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
        customer_email: Option<String>,
        tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError>;

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<StripeEvent, GatewayError>;
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PayPalGateway: Send + Sync {
    async fn create_subscription(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError>;

    /// PayPal deliveries are not signature-checked here.
    fn parse_webhook(&self, payload: &[u8]) -> Result<PayPalEvent, GatewayError>;
}

pub struct StripeCheckout {
    client: StripeClient,
    premium_price_id: String,
}

impl StripeCheckout {
    pub fn new(client: StripeClient, premium_price_id: String) -> Self {
        Self {
            client,
            premium_price_id,
        }
    }
}

#[async_trait]
impl StripeGateway for StripeCheckout {
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
        customer_email: Option<String>,
        tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError> {
        let metadata = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("tier".to_string(), tier.as_str().to_string()),
        ]);

        let (reference, url) = self
            .client
            .create_checkout_session(&self.premium_price_id, customer_email, metadata)
            .await?;

        Ok(ProviderCheckout { reference, url })
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<StripeEvent, GatewayError> {
        self.client.verify_webhook_signature(payload, signature)
    }
}

pub struct PayPalCheckout {
    client: PayPalClient,
    premium_plan_id: String,
}

impl PayPalCheckout {
    pub fn new(client: PayPalClient, premium_plan_id: String) -> Self {
        Self {
            client,
            premium_plan_id,
        }
    }
}

#[async_trait]
impl PayPalGateway for PayPalCheckout {
    async fn create_subscription(
        &self,
        user_id: Uuid,
        _tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError> {
        let (reference, url) = self
            .client
            .create_subscription(&self.premium_plan_id, &user_id.to_string())
            .await?;

        Ok(ProviderCheckout { reference, url })
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<PayPalEvent, GatewayError> {
        PayPalEvent::parse(payload)
    }
}

/// Stand-in for a provider without credentials. Every call reports
/// [`GatewayError::NotConfigured`].
pub struct UnconfiguredGateway;

#[async_trait]
impl StripeGateway for UnconfiguredGateway {
    async fn create_checkout_session(
        &self,
        _user_id: Uuid,
        _customer_email: Option<String>,
        _tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn verify_webhook(&self, _payload: &[u8], _signature: &str) -> Result<StripeEvent, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[async_trait]
impl PayPalGateway for UnconfiguredGateway {
    async fn create_subscription(
        &self,
        _user_id: Uuid,
        _tier: SubscriptionTier,
    ) -> Result<ProviderCheckout, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn parse_webhook(&self, _payload: &[u8]) -> Result<PayPalEvent, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

pub fn stripe_gateway(config: &DotEnvyConfig) -> Arc<dyn StripeGateway> {
    match &config.stripe {
        Some(stripe) => {
            info!("payments: stripe gateway enabled");
            Arc::new(StripeCheckout::new(
                StripeClient::new(
                    stripe.secret_key.clone(),
                    stripe.webhook_secret.clone(),
                    config.frontend.checkout_success_url(),
                    config.frontend.checkout_cancel_url(),
                ),
                stripe.premium_price_id.clone(),
            ))
        }
        None => {
            info!("payments: stripe gateway not configured");
            Arc::new(UnconfiguredGateway)
        }
    }
}

pub fn paypal_gateway(config: &DotEnvyConfig) -> Arc<dyn PayPalGateway> {
    match &config.paypal {
        Some(paypal) => {
            info!("payments: paypal gateway enabled");
            Arc::new(PayPalCheckout::new(
                PayPalClient::new(
                    paypal.base_url.clone(),
                    paypal.client_id.clone(),
                    paypal.client_secret.clone(),
                    config.frontend.checkout_success_url(),
                    config.frontend.checkout_cancel_url(),
                ),
                paypal.premium_plan_id.clone(),
            ))
        }
        None => {
            info!("payments: paypal gateway not configured");
            Arc::new(UnconfiguredGateway)
        }
    }
}
