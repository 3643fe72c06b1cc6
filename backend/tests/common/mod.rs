#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use backend::{
    auth::SessionKeys,
    axum_http::{
        http_serve,
        routers::{Gateways, Repositories, api_router},
    },
    config::{
        config_model::{
            BackendServer, Database, DotEnvyConfig, Frontend, PayPalConfig, Session, StripeConfig,
        },
        stage::Stage,
    },
};
use crates::{
    domain::{
        entities::users::{InsertUserEntity, UserEntity},
        repositories::users::UserRepository,
    },
    infra::memory::memory_store::MemoryStore,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-jwt-secret";
pub const STRIPE_WEBHOOK_SECRET: &str = "whsec_integration";

pub fn config(with_paypal: bool) -> DotEnvyConfig {
    DotEnvyConfig {
        backend_server: BackendServer {
            port: 0,
            body_limit: 1,
            timeout: 30,
        },
        database: Database {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        session: Session {
            jwt_secret: JWT_SECRET.to_string(),
            ttl_seconds: 3600,
        },
        frontend: Frontend {
            base_url: url::Url::parse("http://localhost:3001").unwrap(),
        },
        stripe: Some(StripeConfig {
            secret_key: "sk_test_unused".to_string(),
            webhook_secret: STRIPE_WEBHOOK_SECRET.to_string(),
            premium_price_id: "price_premium".to_string(),
        }),
        paypal: with_paypal.then(|| PayPalConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            premium_plan_id: "P-PREMIUM".to_string(),
        }),
        stage: Stage::Local,
    }
}

pub fn session_keys() -> Arc<SessionKeys> {
    Arc::new(SessionKeys::new(JWT_SECRET, 3600))
}

pub fn repositories(
    store: &MemoryStore,
) -> Repositories<MemoryStore, MemoryStore, MemoryStore, MemoryStore, MemoryStore> {
    let store = Arc::new(store.clone());
    Repositories {
        users: Arc::clone(&store),
        subscriptions: Arc::clone(&store),
        quotas: Arc::clone(&store),
        topologies: Arc::clone(&store),
        payments: store,
    }
}

pub fn app(store: &MemoryStore, with_paypal: bool) -> Router {
    let config = config(with_paypal);
    let api = api_router(
        repositories(store),
        Gateways::from_config(&config),
        session_keys(),
    );
    http_serve::app(api, &config).unwrap()
}

pub async fn create_user(store: &MemoryStore, email: &str, tier: &str) -> UserEntity {
    store
        .create(InsertUserEntity {
            email: email.to_string(),
            name: None,
            avatar_url: None,
            subscription_tier: tier.to_string(),
            subscription_status: "active".to_string(),
            subscription_expires_at: None,
        })
        .await
        .unwrap()
}

pub fn bearer(user: &UserEntity) -> String {
    format!("Bearer {}", session_keys().issue(user).unwrap())
}

pub fn sign_stripe(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(STRIPE_WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

pub async fn send(app: &Router, request: Request<Body>) -> (u16, serde_json::Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, authorization: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
