use std::sync::Arc;

use crates::{
    domain::{
        repositories::payments::PaymentRepository,
        value_objects::{
            enums::{payment_providers::PaymentProvider, subscription_tiers::SubscriptionTier},
            subscriptions::{CreateCheckoutRequest, CreateCheckoutResponse, PaymentDto},
        },
    },
    payments::gateway_error::GatewayError,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::payment_gateways::{PayPalGateway, StripeGateway};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("tier {0} cannot be purchased")]
    UnsupportedTier(SubscriptionTier),
    #[error("provider not configured")]
    ProviderNotConfigured(PaymentProvider),
    #[error("payment provider request failed")]
    Gateway(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::UnsupportedTier(_) | PaymentError::ProviderNotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

pub struct PaymentUseCase<Pay>
where
    Pay: PaymentRepository + Send + Sync + 'static,
{
    payment_repo: Arc<Pay>,
    stripe: Arc<dyn StripeGateway>,
    paypal: Arc<dyn PayPalGateway>,
}

impl<Pay> PaymentUseCase<Pay>
where
    Pay: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(
        payment_repo: Arc<Pay>,
        stripe: Arc<dyn StripeGateway>,
        paypal: Arc<dyn PayPalGateway>,
    ) -> Self {
        Self {
            payment_repo,
            stripe,
            paypal,
        }
    }

    /// Starts a provider checkout. The subscription itself is only recorded
    /// when the provider's webhook confirms it.
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        email: &str,
        request: CreateCheckoutRequest,
    ) -> UseCaseResult<CreateCheckoutResponse> {
        if request.tier != SubscriptionTier::Premium {
            warn!(%user_id, tier = %request.tier, "payments: checkout for unsupported tier");
            return Err(PaymentError::UnsupportedTier(request.tier));
        }

        let checkout = match request.provider {
            PaymentProvider::Stripe => {
                self.stripe
                    .create_checkout_session(user_id, Some(email.to_string()), request.tier)
                    .await
            }
            PaymentProvider::PayPal => self.paypal.create_subscription(user_id, request.tier).await,
        }
        .map_err(|err| match err {
            GatewayError::NotConfigured => PaymentError::ProviderNotConfigured(request.provider),
            GatewayError::Request(err) => {
                error!(%user_id, provider = %request.provider, error = ?err, "payments: checkout request failed");
                PaymentError::Gateway(err)
            }
            other => PaymentError::Internal(anyhow::Error::new(other)),
        })?;

        info!(
            %user_id,
            provider = %request.provider,
            reference = %checkout.reference,
            "payments: checkout created"
        );
        Ok(CreateCheckoutResponse {
            provider: request.provider,
            checkout_url: checkout.url,
            reference: checkout.reference,
        })
    }

    pub async fn payment_history(&self, user_id: Uuid) -> UseCaseResult<Vec<PaymentDto>> {
        let payments = self.payment_repo.list_by_user_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "payments: failed to list payments");
            PaymentError::Internal(err)
        })?;

        Ok(payments.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::payment_gateways::{
        MockPayPalGateway, MockStripeGateway, ProviderCheckout, UnconfiguredGateway,
    };
    use chrono::Utc;
    use crates::domain::{
        entities::payments::PaymentEntity, repositories::payments::MockPaymentRepository,
    };
    use mockall::predicate::{always, eq};

    fn request(tier: SubscriptionTier, provider: PaymentProvider) -> CreateCheckoutRequest {
        CreateCheckoutRequest { tier, provider }
    }

    #[tokio::test]
    async fn stripe_checkout_carries_user_and_email() {
        let user_id = Uuid::new_v4();
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_create_checkout_session()
            .with(
                eq(user_id),
                eq(Some("buyer@example.com".to_string())),
                eq(SubscriptionTier::Premium),
            )
            .times(1)
            .returning(|_, _, _| {
                Box::pin(async {
                    Ok(ProviderCheckout {
                        reference: "cs_test_1".to_string(),
                        url: "https://checkout.stripe.com/c/pay/cs_test_1".to_string(),
                    })
                })
            });

        let usecase = PaymentUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(stripe),
            Arc::new(UnconfiguredGateway),
        );
        let response = usecase
            .create_checkout(
                user_id,
                "buyer@example.com",
                request(SubscriptionTier::Premium, PaymentProvider::Stripe),
            )
            .await
            .unwrap();

        assert_eq!(response.reference, "cs_test_1");
        assert_eq!(response.provider, PaymentProvider::Stripe);
    }

    #[tokio::test]
    async fn only_premium_is_purchasable() {
        let mut paypal = MockPayPalGateway::new();
        paypal.expect_create_subscription().never();

        let usecase = PaymentUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(UnconfiguredGateway),
            Arc::new(paypal),
        );
        let err = usecase
            .create_checkout(
                Uuid::new_v4(),
                "buyer@example.com",
                request(SubscriptionTier::Free, PaymentProvider::PayPal),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::UnsupportedTier(SubscriptionTier::Free)));
    }

    #[tokio::test]
    async fn unconfigured_provider_is_a_bad_request() {
        let usecase = PaymentUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(UnconfiguredGateway),
            Arc::new(UnconfiguredGateway),
        );
        let err = usecase
            .create_checkout(
                Uuid::new_v4(),
                "buyer@example.com",
                request(SubscriptionTier::Premium, PaymentProvider::PayPal),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "provider not configured");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_outage_maps_to_bad_gateway() {
        let mut paypal = MockPayPalGateway::new();
        paypal
            .expect_create_subscription()
            .with(always(), eq(SubscriptionTier::Premium))
            .returning(|_, _| {
                Box::pin(async { Err(GatewayError::Request(anyhow::anyhow!("503 from PayPal"))) })
            });

        let usecase = PaymentUseCase::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(UnconfiguredGateway),
            Arc::new(paypal),
        );
        let err = usecase
            .create_checkout(
                Uuid::new_v4(),
                "buyer@example.com",
                request(SubscriptionTier::Premium, PaymentProvider::PayPal),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn history_converts_minor_units() {
        let user_id = Uuid::new_v4();
        let mut payment_repo = MockPaymentRepository::new();
        payment_repo
            .expect_list_by_user_id()
            .with(eq(user_id))
            .returning(move |_| {
                let now = Utc::now();
                let payment = PaymentEntity {
                    id: Uuid::new_v4(),
                    user_id,
                    subscription_id: None,
                    amount_minor: 1999,
                    currency: "usd".to_string(),
                    payment_provider: "stripe".to_string(),
                    payment_provider_id: "in_1".to_string(),
                    status: "completed".to_string(),
                    metadata: serde_json::json!({}),
                    created_at: now,
                    updated_at: now,
                };
                Box::pin(async move { Ok(vec![payment]) })
            });

        let usecase = PaymentUseCase::new(
            Arc::new(payment_repo),
            Arc::new(UnconfiguredGateway),
            Arc::new(UnconfiguredGateway),
        );
        let history = usecase.payment_history(user_id).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 19.99);
    }
}
