use anyhow::{Context, Result};
use crates::payments::paypal_client::PAYPAL_SANDBOX_BASE_URL;
use tracing::warn;

use super::{
    config_model::{
        BackendServer, Database, DotEnvyConfig, Frontend, PayPalConfig, Session, StripeConfig,
    },
    stage::Stage,
};

const DEFAULT_JWT_TTL_SECONDS: u64 = 86_400;
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3001";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    from_env()
}

/// Builds the config from the current process environment without reading `.env`.
pub fn from_env() -> Result<DotEnvyConfig> {
    let backend_server = BackendServer {
        port: required_parsed("SERVER_PORT")?,
        body_limit: required_parsed("SERVER_BODY_LIMIT")?,
        timeout: required_parsed("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional_parsed("DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
    };

    let session = Session {
        jwt_secret: required("JWT_SECRET")?,
        ttl_seconds: optional_parsed("JWT_TTL_SECONDS")?.unwrap_or(DEFAULT_JWT_TTL_SECONDS),
    };

    let frontend_base_url =
        optional("FRONTEND_BASE_URL").unwrap_or_else(|| DEFAULT_FRONTEND_BASE_URL.to_string());
    let frontend = Frontend {
        base_url: url::Url::parse(&frontend_base_url)
            .with_context(|| format!("FRONTEND_BASE_URL is invalid: {frontend_base_url}"))?,
    };

    let stripe = match (
        optional("STRIPE_SECRET_KEY"),
        optional("STRIPE_WEBHOOK_SECRET"),
        optional("STRIPE_PREMIUM_PRICE_ID"),
    ) {
        (Some(secret_key), Some(webhook_secret), Some(premium_price_id)) => Some(StripeConfig {
            secret_key,
            webhook_secret,
            premium_price_id,
        }),
        (None, None, None) => None,
        _ => {
            warn!("config: partial Stripe configuration ignored, provider disabled");
            None
        }
    };

    let paypal = match (
        optional("PAYPAL_CLIENT_ID"),
        optional("PAYPAL_CLIENT_SECRET"),
        optional("PAYPAL_PREMIUM_PLAN_ID"),
    ) {
        (Some(client_id), Some(client_secret), Some(premium_plan_id)) => Some(PayPalConfig {
            client_id,
            client_secret,
            base_url: optional("PAYPAL_BASE_URL")
                .unwrap_or_else(|| PAYPAL_SANDBOX_BASE_URL.to_string()),
            premium_plan_id,
        }),
        (None, None, None) => None,
        _ => {
            warn!("config: partial PayPal configuration ignored, provider disabled");
            None
        }
    };

    let stage = match optional("STAGE") {
        Some(raw) => Stage::try_from(raw.as_str())?,
        None => Stage::default(),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        session,
        frontend,
        stripe,
        paypal,
        stage,
    })
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{key} is missing"))
}

fn required_parsed<T>(key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn optional_parsed<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|raw| raw.parse().with_context(|| format!("{key} is invalid")))
        .transpose()
}
