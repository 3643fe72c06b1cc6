use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use super::gateway_error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub subscription: Option<String>,
    pub customer: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub subscription: Option<String>,
    pub amount_paid: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

/// Converts a positive epoch-seconds value; zero and negatives mean "absent".
pub fn epoch_to_datetime(value: Option<i64>) -> Option<DateTime<Utc>> {
    value
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

impl StripeSubscription {
    /// Newer API versions move the period onto the first item.
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        epoch_to_datetime(self.current_period_start.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_start)
        }))
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        epoch_to_datetime(self.current_period_end.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        }))
    }
}

impl StripeEvent {
    pub fn object_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|err| GatewayError::MalformedPayload(format!("{}: {err}", self.type_)))
    }
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex>[,v1=<hex>]`) against
/// HMAC-SHA256 of `"<ts>.<payload>"`.
pub fn verify_signature(
    webhook_secret: &str,
    payload: &[u8],
    signature_header: &str,
) -> Result<(), GatewayError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signatures.push(rest);
        }
    }

    let timestamp = timestamp.ok_or(GatewayError::InvalidSignature)?;
    if signatures.is_empty() {
        return Err(GatewayError::InvalidSignature);
    }

    for signature in signatures {
        let Ok(provided) = hex::decode(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
            .map_err(|err| GatewayError::Request(anyhow::anyhow!("invalid webhook secret: {err}")))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&provided).is_ok() {
            return Ok(());
        }
    }

    Err(GatewayError::InvalidSignature)
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url,
            cancel_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_message) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => (
                    envelope.error.type_,
                    envelope.error.code,
                    envelope.error.message,
                ),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_message = ?stripe_error_message,
            "stripe: {} failed",
            context
        );

        anyhow::bail!("stripe {context} failed with status {status}")
    }

    /// Creates a subscription-mode Checkout Session. Returns `(session_id, url)`.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_email: Option<String>,
        metadata: HashMap<String, String>,
    ) -> Result<(String, String)> {
        // https://stripe.com/docs/api/checkout/sessions/create
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        if let Some(email) = customer_email {
            body.push(("customer_email".to_string(), email));
        }

        for (key, value) in metadata {
            body.push((format!("metadata[{}]", key), value.clone()));
            body.push((format!("subscription_data[metadata][{}]", key), value));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            id: String,
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        let url = parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))?;
        Ok((parsed.id, url))
    }

    /// Verifies the webhook signature and parses the event envelope.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, GatewayError> {
        verify_signature(&self.webhook_secret, payload, signature_header)?;

        serde_json::from_slice(payload).map_err(|err| GatewayError::MalformedPayload(err.to_string()))
    }
}
