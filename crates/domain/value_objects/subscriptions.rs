use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{payments::PaymentEntity, subscriptions::SubscriptionEntity};
use crate::domain::value_objects::enums::{
    payment_providers::PaymentProvider, subscription_tiers::SubscriptionTier,
};

/// Length of a provider period when the event itself does not carry one.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub tier: String,
    pub status: String,
    pub payment_provider: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            tier: value.tier,
            status: value.status,
            payment_provider: value.payment_provider,
            current_period_start: value.current_period_start,
            current_period_end: value.current_period_end,
            cancel_at_period_end: value.cancel_at_period_end,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDto {
    pub id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub amount: f64,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_provider: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentDto {
    fn from(value: PaymentEntity) -> Self {
        Self {
            id: value.id,
            subscription_id: value.subscription_id,
            amount: value.amount_minor as f64 / 100.0,
            amount_minor: value.amount_minor,
            currency: value.currency,
            payment_provider: value.payment_provider,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    pub tier: SubscriptionTier,
    pub provider: PaymentProvider,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateCheckoutResponse {
    pub provider: PaymentProvider,
    pub checkout_url: String,
    pub reference: String,
}

/// What a webhook delivery did to the ledger.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    Ignored,
    /// Permanently unprocessable; acknowledged so the provider stops retrying.
    Rejected,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: WebhookOutcome,
}
