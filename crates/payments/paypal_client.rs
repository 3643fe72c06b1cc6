use std::str::FromStr;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::gateway_error::GatewayError;

pub const PAYPAL_SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";

/// Minimal PayPal REST client for billing subscriptions.
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    return_url: String,
    cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayPalEvent {
    pub id: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub resource: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct PayPalSubscriptionResource {
    pub id: String,
    pub custom_id: Option<String>,
    pub plan_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayPalSaleResource {
    pub id: String,
    pub billing_agreement_id: Option<String>,
    pub amount: Option<PayPalAmount>,
}

#[derive(Debug, Deserialize)]
pub struct PayPalAmount {
    pub total: String,
    pub currency: String,
}

impl PayPalEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(payload).map_err(|err| GatewayError::MalformedPayload(err.to_string()))
    }

    pub fn resource_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.resource.clone())
            .map_err(|err| GatewayError::MalformedPayload(format!("{}: {err}", self.event_type)))
    }
}

impl PayPalAmount {
    /// `"19.99"` -> `1999`. Totals with sub-cent precision are rejected.
    pub fn to_minor_units(&self) -> Option<i64> {
        let total = Decimal::from_str(self.total.trim()).ok()?;
        let minor = total.checked_mul(Decimal::ONE_HUNDRED)?;
        if !minor.fract().is_zero() {
            return None;
        }
        minor.to_i64()
    }
}

impl PayPalClient {
    pub fn new(
        base_url: String,
        client_id: String,
        client_secret: String,
        return_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            return_url,
            cancel_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let debug_id = resp
            .headers()
            .get("paypal-debug-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = resp.text().await.unwrap_or_default();

        error!(
            status = %status,
            paypal_debug_id = ?debug_id,
            body = %body,
            "paypal: {} failed",
            context
        );

        anyhow::bail!("paypal {context} failed with status {status}")
    }

    async fn access_token(&self) -> Result<String> {
        // https://developer.paypal.com/api/rest/authentication/
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "fetch access token").await?;

        #[derive(Deserialize)]
        struct TokenResp {
            access_token: String,
        }

        let parsed: TokenResp = resp.json().await?;
        Ok(parsed.access_token)
    }

    /// Creates a billing subscription tagged with `custom_id`. Returns
    /// `(subscription_id, approve_url)`.
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        custom_id: &str,
    ) -> Result<(String, String)> {
        // https://developer.paypal.com/docs/api/subscriptions/v1/#subscriptions_create
        let token = self.access_token().await?;
        let body = json!({
            "plan_id": plan_id,
            "custom_id": custom_id,
            "application_context": {
                "return_url": self.return_url,
                "cancel_url": self.cancel_url,
                "user_action": "SUBSCRIBE_NOW",
            },
        });

        let resp = self
            .http
            .post(format!("{}/v1/billing/subscriptions", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create subscription").await?;

        #[derive(Deserialize)]
        struct Link {
            href: String,
            rel: String,
        }

        #[derive(Deserialize)]
        struct SubscriptionResp {
            id: String,
            #[serde(default)]
            links: Vec<Link>,
        }

        let parsed: SubscriptionResp = resp.json().await?;
        let approve_url = parsed
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href)
            .context("PayPal subscription approve link is missing")?;

        Ok((parsed.id, approve_url))
    }
}
