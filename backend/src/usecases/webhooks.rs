use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crates::{
    domain::{
        entities::{
            payments::InsertPaymentEntity,
            subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        },
        repositories::{
            payments::PaymentRepository, subscriptions::SubscriptionRepository,
            topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
            users::UserRepository,
        },
        value_objects::{
            enums::{
                payment_providers::PaymentProvider, payment_statuses::PaymentStatus,
                subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier,
            },
            subscriptions::{DEFAULT_PERIOD_DAYS, WebhookOutcome},
        },
    },
    payments::{
        gateway_error::GatewayError,
        paypal_client::{PayPalEvent, PayPalSaleResource, PayPalSubscriptionResource},
        stripe_client::{StripeCheckoutSession, StripeEvent, StripeInvoice, StripeSubscription},
    },
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    payment_gateways::{PayPalGateway, StripeGateway},
    quotas::{QuotaError, QuotaUseCase, UserLockGuard},
};

const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook signature is invalid")]
    InvalidSignature,
    #[error("webhook payload is invalid: {0}")]
    InvalidPayload(String),
    #[error("webhook payload is missing {0}")]
    MissingCorrelation(&'static str),
    #[error("user {0} referenced by webhook does not exist")]
    UnknownUser(Uuid),
    #[error("subscription {0} is not known yet")]
    SubscriptionNotFound(String),
    #[error("{0} is not configured")]
    ProviderNotConfigured(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WebhookError::InvalidSignature => StatusCode::BAD_REQUEST,
            WebhookError::InvalidPayload(_)
            | WebhookError::MissingCorrelation(_)
            | WebhookError::UnknownUser(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::SubscriptionNotFound(_) => StatusCode::CONFLICT,
            WebhookError::ProviderNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Failures the provider should redeliver: ordering gaps and store outages.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            WebhookError::SubscriptionNotFound(_) | WebhookError::Internal(_)
        )
    }

    /// Permanent problems with one event. The delivery is acknowledged so the
    /// provider stops retrying it.
    pub fn is_rejected_event(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidPayload(_)
                | WebhookError::MissingCorrelation(_)
                | WebhookError::UnknownUser(_)
        )
    }

    fn from_gateway(provider: PaymentProvider, err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured => WebhookError::ProviderNotConfigured(provider.as_str()),
            GatewayError::InvalidSignature => WebhookError::InvalidSignature,
            GatewayError::MalformedPayload(message) => WebhookError::InvalidPayload(message),
            GatewayError::Request(err) => WebhookError::Internal(err),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, WebhookError>;

/// New provider subscription to activate for a user.
struct Activation {
    provider: PaymentProvider,
    provider_subscription_id: String,
    user_id: Uuid,
    tier: SubscriptionTier,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    payment: Option<SettledPayment>,
}

struct SettledPayment {
    provider_payment_id: String,
    amount_minor: i64,
    currency: String,
    metadata: serde_json::Value,
}

pub struct WebhookUseCase<S, Pay, U, Q, T>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    payment_repo: Arc<Pay>,
    quotas: Arc<QuotaUseCase<U, Q, T>>,
    stripe: Arc<dyn StripeGateway>,
    paypal: Arc<dyn PayPalGateway>,
}

impl<S, Pay, U, Q, T> WebhookUseCase<S, Pay, U, Q, T>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        payment_repo: Arc<Pay>,
        quotas: Arc<QuotaUseCase<U, Q, T>>,
        stripe: Arc<dyn StripeGateway>,
        paypal: Arc<dyn PayPalGateway>,
    ) -> Self {
        Self {
            subscription_repo,
            payment_repo,
            quotas,
            stripe,
            paypal,
        }
    }

    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> UseCaseResult<WebhookOutcome> {
        let event = self
            .stripe
            .verify_webhook(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "webhooks: stripe event rejected");
                WebhookError::from_gateway(PaymentProvider::Stripe, err)
            })?;

        self.reconcile_stripe_event(event).await
    }

    pub async fn reconcile_stripe_event(&self, event: StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let event_id = event.id.clone().unwrap_or_default();
        info!(
            provider = "stripe",
            event_id = %event_id,
            event_type = %event.type_,
            "webhooks: event received"
        );

        let outcome = self.dispatch_stripe_event(&event_id, &event).await;
        Self::log_outcome(PaymentProvider::Stripe, &event_id, &event.type_, outcome)
    }

    async fn dispatch_stripe_event(
        &self,
        event_id: &str,
        event: &StripeEvent,
    ) -> UseCaseResult<WebhookOutcome> {
        match event.type_.as_str() {
            "checkout.session.completed" => {
                let session: StripeCheckoutSession =
                    event.object_as().map_err(payload_error)?;
                self.stripe_checkout_completed(event_id, session).await
            }
            "customer.subscription.updated" => {
                let subscription: StripeSubscription =
                    event.object_as().map_err(payload_error)?;
                self.apply_status_change(
                    PaymentProvider::Stripe,
                    &subscription.id,
                    Some(map_stripe_status(&subscription.status)),
                    subscription.period_start(),
                    subscription.period_end(),
                    Some(subscription.cancel_at_period_end),
                )
                .await
            }
            "customer.subscription.deleted" => {
                let subscription: StripeSubscription =
                    event.object_as().map_err(payload_error)?;
                self.cancel_subscription(PaymentProvider::Stripe, &subscription.id)
                    .await
            }
            "invoice.payment_succeeded" => {
                let invoice: StripeInvoice = event.object_as().map_err(payload_error)?;
                self.stripe_invoice_paid(event_id, invoice).await
            }
            other => {
                info!(provider = "stripe", event_type = %other, "webhooks: event type ignored");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    pub async fn handle_paypal_webhook(&self, payload: &[u8]) -> UseCaseResult<WebhookOutcome> {
        let event = self.paypal.parse_webhook(payload).map_err(|err| {
            warn!(error = %err, "webhooks: paypal event rejected");
            WebhookError::from_gateway(PaymentProvider::PayPal, err)
        })?;

        self.reconcile_paypal_event(event).await
    }

    pub async fn reconcile_paypal_event(&self, event: PayPalEvent) -> UseCaseResult<WebhookOutcome> {
        let event_id = event.id.clone().unwrap_or_default();
        info!(
            provider = "paypal",
            event_id = %event_id,
            event_type = %event.event_type,
            "webhooks: event received"
        );

        let outcome = self.dispatch_paypal_event(&event_id, &event).await;
        Self::log_outcome(PaymentProvider::PayPal, &event_id, &event.event_type, outcome)
    }

    async fn dispatch_paypal_event(
        &self,
        event_id: &str,
        event: &PayPalEvent,
    ) -> UseCaseResult<WebhookOutcome> {
        match event.event_type.as_str() {
            "BILLING.SUBSCRIPTION.CREATED" => {
                let resource: PayPalSubscriptionResource =
                    event.resource_as().map_err(payload_error)?;
                self.paypal_subscription_created(resource).await
            }
            "BILLING.SUBSCRIPTION.UPDATED" => {
                let resource: PayPalSubscriptionResource =
                    event.resource_as().map_err(payload_error)?;
                self.apply_status_change(
                    PaymentProvider::PayPal,
                    &resource.id,
                    resource.status.as_deref().map(map_paypal_status),
                    None,
                    None,
                    None,
                )
                .await
            }
            "BILLING.SUBSCRIPTION.CANCELLED" => {
                let resource: PayPalSubscriptionResource =
                    event.resource_as().map_err(payload_error)?;
                self.cancel_subscription(PaymentProvider::PayPal, &resource.id)
                    .await
            }
            "PAYMENT.SALE.COMPLETED" => {
                let sale: PayPalSaleResource = event.resource_as().map_err(payload_error)?;
                self.paypal_sale_completed(event_id, sale).await
            }
            other => {
                info!(provider = "paypal", event_type = %other, "webhooks: event type ignored");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn stripe_checkout_completed(
        &self,
        event_id: &str,
        session: StripeCheckoutSession,
    ) -> UseCaseResult<WebhookOutcome> {
        let user_id = parse_user_id(session.metadata.get("user_id"), "metadata.user_id")?;
        // Checkout only sells premium; any other tier in metadata is a bad session.
        let tier = match session.metadata.get("tier") {
            None => SubscriptionTier::Premium,
            Some(raw) => match SubscriptionTier::parse(raw) {
                Some(SubscriptionTier::Premium) => SubscriptionTier::Premium,
                _ => {
                    return Err(WebhookError::InvalidPayload(format!(
                        "unsupported metadata.tier {raw:?}"
                    )));
                }
            },
        };
        let provider_subscription_id = session
            .subscription
            .clone()
            .ok_or(WebhookError::MissingCorrelation("subscription"))?;

        let now = Utc::now();
        let payment = session.amount_total.map(|amount_total| SettledPayment {
            provider_payment_id: session.id.clone(),
            amount_minor: amount_total,
            currency: session
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            metadata: json!({
                "event_id": event_id,
                "checkout_session_id": session.id,
                "customer": session.customer,
            }),
        });

        self.activate_subscription(Activation {
            provider: PaymentProvider::Stripe,
            provider_subscription_id,
            user_id,
            tier,
            period_start: now,
            period_end: now + Duration::days(DEFAULT_PERIOD_DAYS),
            payment,
        })
        .await
    }

    async fn paypal_subscription_created(
        &self,
        resource: PayPalSubscriptionResource,
    ) -> UseCaseResult<WebhookOutcome> {
        let user_id = parse_user_id(resource.custom_id.as_ref(), "resource.custom_id")?;
        let now = Utc::now();

        // PayPal only sells premium, and the creation event carries no amount.
        self.activate_subscription(Activation {
            provider: PaymentProvider::PayPal,
            provider_subscription_id: resource.id,
            user_id,
            tier: SubscriptionTier::Premium,
            period_start: now,
            period_end: now + Duration::days(DEFAULT_PERIOD_DAYS),
            payment: None,
        })
        .await
    }

    /// Creates the subscription row for a provider reference exactly once.
    /// Runs under the user's quota lock so the row, the tier write and the
    /// payment are reconciled by one delivery at a time.
    async fn activate_subscription(&self, activation: Activation) -> UseCaseResult<WebhookOutcome> {
        let provider = activation.provider;
        let user_id = activation.user_id;
        let guard = self.quotas.lock_user(user_id).await;

        let reference = activation.provider_subscription_id.clone();
        if let Some(subscription) = self
            .find_subscriptions(provider, &reference)
            .await?
            .into_iter()
            .next()
        {
            info!(
                provider = provider.as_str(),
                provider_subscription_id = %reference,
                %user_id,
                "webhooks: subscription already recorded"
            );
            return self.resume_activation(&guard, activation, subscription).await;
        }

        // Rejects unknown users before anything is written.
        self.quotas
            .stored_tier(user_id)
            .await
            .map_err(|err| quota_error(user_id, err))?;

        let created = self
            .subscription_repo
            .create_if_absent(InsertSubscriptionEntity {
                user_id,
                tier: activation.tier.as_str().to_string(),
                status: SubscriptionStatus::Active.as_str().to_string(),
                payment_provider: Some(provider.as_str().to_string()),
                payment_subscription_id: Some(reference.clone()),
                current_period_start: Some(activation.period_start),
                current_period_end: Some(activation.period_end),
                cancel_at_period_end: false,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    provider_subscription_id = %reference,
                    db_error = ?err,
                    "webhooks: failed to create subscription"
                );
                WebhookError::Internal(err)
            })?;

        let Some(subscription) = created else {
            info!(
                provider = provider.as_str(),
                provider_subscription_id = %reference,
                "webhooks: concurrent delivery already created subscription"
            );
            let subscription = self
                .find_subscriptions(provider, &reference)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| WebhookError::SubscriptionNotFound(reference.clone()))?;
            return self.resume_activation(&guard, activation, subscription).await;
        };

        self.quotas
            .update_user_tier_held(&guard, activation.tier)
            .await
            .map_err(|err| quota_error(user_id, err))?;

        info!(
            %user_id,
            subscription_id = %subscription.id,
            provider = provider.as_str(),
            tier = %activation.tier,
            "webhooks: subscription activated"
        );

        if let Some(payment) = activation.payment {
            self.record_payment(provider, &subscription, payment).await?;
        }

        Ok(WebhookOutcome::Processed)
    }

    /// Finishes an activation whose subscription row already exists. A
    /// previous delivery may have failed after the insert, so the tier and the
    /// checkout payment are applied if they are still missing. Usage counters
    /// are only reset when the tier actually changes.
    async fn resume_activation(
        &self,
        guard: &UserLockGuard,
        activation: Activation,
        subscription: SubscriptionEntity,
    ) -> UseCaseResult<WebhookOutcome> {
        let user_id = activation.user_id;
        let mut outcome = WebhookOutcome::Duplicate;

        let is_active = subscription.status == SubscriptionStatus::Active.as_str();
        if subscription.user_id == user_id && is_active {
            let stored = self
                .quotas
                .stored_tier(user_id)
                .await
                .map_err(|err| quota_error(user_id, err))?;
            if stored != Some(activation.tier) {
                self.quotas
                    .update_user_tier_held(guard, activation.tier)
                    .await
                    .map_err(|err| quota_error(user_id, err))?;
                warn!(
                    %user_id,
                    subscription_id = %subscription.id,
                    tier = %activation.tier,
                    "webhooks: tier applied on redelivery"
                );
                outcome = WebhookOutcome::Processed;
            }
        }

        if let Some(payment) = activation.payment {
            if self
                .record_payment(activation.provider, &subscription, payment)
                .await?
                == WebhookOutcome::Processed
            {
                outcome = WebhookOutcome::Processed;
            }
        }

        Ok(outcome)
    }

    async fn apply_status_change(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
        status: Option<String>,
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
        cancel_at_period_end: Option<bool>,
    ) -> UseCaseResult<WebhookOutcome> {
        let mut subscription = self
            .find_subscriptions(provider, provider_subscription_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!(
                    provider = provider.as_str(),
                    %provider_subscription_id,
                    "webhooks: update for unknown subscription, awaiting redelivery"
                );
                WebhookError::SubscriptionNotFound(provider_subscription_id.to_string())
            })?;

        if let Some(status) = status {
            subscription.status = status;
        }
        if let Some(start) = period_start {
            subscription.current_period_start = Some(start);
        }
        if let Some(end) = period_end {
            subscription.current_period_end = Some(end);
        }
        if let Some(flag) = cancel_at_period_end {
            subscription.cancel_at_period_end = flag;
        }

        let updated = self.save_subscription(subscription).await?;
        info!(
            subscription_id = %updated.id,
            provider = provider.as_str(),
            status = %updated.status,
            "webhooks: subscription updated"
        );
        Ok(WebhookOutcome::Processed)
    }

    async fn cancel_subscription(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(mut subscription) = self
            .find_subscriptions(provider, provider_subscription_id)
            .await?
            .into_iter()
            .next()
        else {
            info!(
                provider = provider.as_str(),
                %provider_subscription_id,
                "webhooks: cancellation for unknown subscription treated as handled"
            );
            return Ok(WebhookOutcome::Duplicate);
        };

        let cancelled = SubscriptionStatus::Cancelled.as_str();
        if subscription.status == cancelled {
            return Ok(WebhookOutcome::Duplicate);
        }

        subscription.status = cancelled.to_string();
        let updated = self.save_subscription(subscription).await?;
        info!(
            subscription_id = %updated.id,
            user_id = %updated.user_id,
            provider = provider.as_str(),
            "webhooks: subscription cancelled"
        );
        Ok(WebhookOutcome::Processed)
    }

    async fn stripe_invoice_paid(
        &self,
        event_id: &str,
        invoice: StripeInvoice,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(provider_subscription_id) = invoice.subscription.as_deref() else {
            info!(invoice_id = %invoice.id, "webhooks: invoice without subscription ignored");
            return Ok(WebhookOutcome::Ignored);
        };

        self.record_subscription_payment(
            PaymentProvider::Stripe,
            provider_subscription_id,
            SettledPayment {
                provider_payment_id: invoice.id.clone(),
                amount_minor: invoice.amount_paid.unwrap_or(0),
                currency: invoice
                    .currency
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                metadata: json!({ "event_id": event_id, "invoice_id": invoice.id }),
            },
        )
        .await
    }

    async fn paypal_sale_completed(
        &self,
        event_id: &str,
        sale: PayPalSaleResource,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(provider_subscription_id) = sale.billing_agreement_id.as_deref() else {
            info!(sale_id = %sale.id, "webhooks: sale without billing agreement ignored");
            return Ok(WebhookOutcome::Ignored);
        };

        let amount = sale
            .amount
            .as_ref()
            .ok_or(WebhookError::MissingCorrelation("resource.amount"))?;
        let amount_minor = amount.to_minor_units().ok_or_else(|| {
            WebhookError::InvalidPayload(format!("unparsable sale amount {}", amount.total))
        })?;

        self.record_subscription_payment(
            PaymentProvider::PayPal,
            provider_subscription_id,
            SettledPayment {
                provider_payment_id: sale.id.clone(),
                amount_minor,
                currency: amount.currency.to_ascii_lowercase(),
                metadata: json!({ "event_id": event_id, "sale_id": sale.id }),
            },
        )
        .await
    }

    /// Best effort: a payment for an unknown subscription cannot be attributed
    /// and is dropped.
    async fn record_subscription_payment(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
        payment: SettledPayment,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(subscription) = self
            .find_subscriptions(provider, provider_subscription_id)
            .await?
            .into_iter()
            .next()
        else {
            info!(
                provider = provider.as_str(),
                %provider_subscription_id,
                provider_payment_id = %payment.provider_payment_id,
                "webhooks: payment for unknown subscription dropped"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        self.record_payment(provider, &subscription, payment).await
    }

    async fn record_payment(
        &self,
        provider: PaymentProvider,
        subscription: &SubscriptionEntity,
        payment: SettledPayment,
    ) -> UseCaseResult<WebhookOutcome> {
        let existing = self
            .payment_repo
            .find_by_provider_payment_id(provider, &payment.provider_payment_id)
            .await
            .map_err(|err| {
                error!(
                    provider_payment_id = %payment.provider_payment_id,
                    db_error = ?err,
                    "webhooks: failed to look up payment"
                );
                WebhookError::Internal(err)
            })?;
        if existing.is_some() {
            info!(
                provider = provider.as_str(),
                provider_payment_id = %payment.provider_payment_id,
                "webhooks: payment already recorded"
            );
            return Ok(WebhookOutcome::Duplicate);
        }

        let created = self
            .payment_repo
            .create(InsertPaymentEntity {
                user_id: subscription.user_id,
                subscription_id: Some(subscription.id),
                amount_minor: payment.amount_minor,
                currency: payment.currency,
                payment_provider: provider.as_str().to_string(),
                payment_provider_id: payment.provider_payment_id,
                status: PaymentStatus::Completed.as_str().to_string(),
                metadata: payment.metadata,
            })
            .await
            .map_err(|err| {
                error!(
                    user_id = %subscription.user_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "webhooks: failed to record payment"
                );
                WebhookError::Internal(err)
            })?;

        info!(
            payment_id = %created.id,
            user_id = %created.user_id,
            amount_minor = created.amount_minor,
            currency = %created.currency,
            "webhooks: payment recorded"
        );
        Ok(WebhookOutcome::Processed)
    }

    async fn find_subscriptions(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> UseCaseResult<Vec<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_provider_subscription_id(provider, provider_subscription_id)
            .await
            .map_err(|err| {
                error!(
                    provider = provider.as_str(),
                    %provider_subscription_id,
                    db_error = ?err,
                    "webhooks: failed to look up subscription"
                );
                WebhookError::Internal(err)
            })
    }

    async fn save_subscription(
        &self,
        subscription: SubscriptionEntity,
    ) -> UseCaseResult<SubscriptionEntity> {
        let subscription_id = subscription.id;
        self.subscription_repo
            .update(subscription)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "webhooks: failed to update subscription");
                WebhookError::Internal(err)
            })
    }

    fn log_outcome(
        provider: PaymentProvider,
        event_id: &str,
        event_type: &str,
        outcome: UseCaseResult<WebhookOutcome>,
    ) -> UseCaseResult<WebhookOutcome> {
        match &outcome {
            Ok(result) => info!(
                provider = provider.as_str(),
                %event_id,
                %event_type,
                outcome = result.as_str(),
                "webhooks: event reconciled"
            ),
            Err(err) if err.is_retriable() => warn!(
                provider = provider.as_str(),
                %event_id,
                %event_type,
                error = %err,
                "webhooks: event failed, provider should retry"
            ),
            Err(err) => error!(
                provider = provider.as_str(),
                %event_id,
                %event_type,
                error = %err,
                "webhooks: event rejected"
            ),
        }
        outcome
    }
}

fn payload_error(err: GatewayError) -> WebhookError {
    match err {
        GatewayError::MalformedPayload(message) => WebhookError::InvalidPayload(message),
        other => WebhookError::Internal(anyhow::Error::new(other)),
    }
}

fn quota_error(user_id: Uuid, err: QuotaError) -> WebhookError {
    match err {
        QuotaError::UserNotFound => WebhookError::UnknownUser(user_id),
        QuotaError::Internal(err) => WebhookError::Internal(err),
    }
}

fn parse_user_id(raw: Option<&String>, field: &'static str) -> UseCaseResult<Uuid> {
    let raw = raw
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or(WebhookError::MissingCorrelation(field))?;

    Uuid::parse_str(raw).map_err(|_| WebhookError::InvalidPayload(format!("{field} is not a uuid")))
}

/// `active` and `canceled` are normalised; anything else is stored as sent.
pub fn map_stripe_status(status: &str) -> String {
    match status {
        "active" => SubscriptionStatus::Active.as_str().to_string(),
        "canceled" => SubscriptionStatus::Cancelled.as_str().to_string(),
        other => other.to_string(),
    }
}

pub fn map_paypal_status(status: &str) -> String {
    match status {
        "ACTIVE" => SubscriptionStatus::Active.as_str().to_string(),
        "CANCELLED" => SubscriptionStatus::Cancelled.as_str().to_string(),
        other => other.to_string(),
    }
}
