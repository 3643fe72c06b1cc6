mod common;

use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Body,
    http::Request,
    middleware,
    routing::get,
};
use backend::{
    axum_http::middleware::{FeatureRequirement, require_feature},
    usecases::quotas::QuotaUseCase,
};
use crates::{
    domain::value_objects::enums::features::Feature, infra::memory::memory_store::MemoryStore,
};
use serde_json::json;

fn stripe_request(payload: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/payments/webhook/stripe")
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

#[tokio::test]
async fn health_check_and_unknown_routes() {
    let app = common::app(&MemoryStore::new(), false);

    let (status, _) = common::send(&app, common::get("/api/v1/health-check", None)).await;
    assert_eq!(status, 200);

    let (status, body) = common::send(&app, common::get("/api/v1/nowhere", None)).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn quota_requires_a_session() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "quota@example.com", "free").await;

    let (status, _) = common::send(&app, common::get("/api/v1/quota", None)).await;
    assert_eq!(status, 401);

    let (status, body) = common::send(
        &app,
        common::get("/api/v1/quota", Some(&common::bearer(&user))),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["max_simulations_per_day"], 100);
    assert_eq!(body["used_simulations_today"], 0);
}

#[tokio::test]
async fn anonymous_feature_checks() {
    let app = common::app(&MemoryStore::new(), false);

    let (status, body) =
        common::send(&app, common::get("/api/v1/features/ai_prediction", None)).await;
    assert_eq!(status, 200);
    assert_eq!(body["allowed"], false);

    let (_, body) = common::send(&app, common::get("/api/v1/features/dark_mode", None)).await;
    assert_eq!(body["allowed"], true);
}

#[tokio::test]
async fn anonymous_topologies_stop_at_the_demo_cap() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);

    let (status, body) =
        common::send(&app, common::post_json("/api/v1/usage/topologies", None, "{}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["max"], 3);

    for _ in 0..3 {
        store.add_topology(None).await;
    }

    let (status, body) =
        common::send(&app, common::post_json("/api/v1/usage/topologies", None, "{}")).await;
    assert_eq!(status, 403);
    assert_eq!(body["kind"], "topology");
    assert_eq!(body["used"], 3);
    assert_eq!(body["max"], 3);
}

#[tokio::test]
async fn accepted_simulation_is_charged_once() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "sim@example.com", "free").await;
    let token = common::bearer(&user);

    let (status, body) = common::send(
        &app,
        common::post_json("/api/v1/usage/simulations", Some(&token), "{}"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["used"], 0);
    assert_eq!(body["max"], 100);

    let (_, quota) = common::send(&app, common::get("/api/v1/quota", Some(&token))).await;
    assert_eq!(quota["used_simulations_today"], 1);
}

#[tokio::test]
async fn anonymous_simulations_are_unmetered() {
    let app = common::app(&MemoryStore::new(), false);

    let (status, body) =
        common::send(&app, common::post_json("/api/v1/usage/simulations", None, "{}")).await;
    assert_eq!(status, 200);
    assert!(body.get("max").is_none());
}

#[tokio::test]
async fn stripe_webhook_upgrades_once() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "stripe@example.com", "free").await;

    let payload = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_1",
            "subscription": "sub_1",
            "amount_total": 1999,
            "currency": "usd",
            "metadata": { "user_id": user.id.to_string() }
        }}
    })
    .to_string();

    let (status, body) = common::send(&app, stripe_request(&payload, None)).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Missing Stripe-Signature header");

    let (status, _) = common::send(&app, stripe_request(&payload, Some("t=1,v1=00"))).await;
    assert_eq!(status, 400);
    assert!(store.subscriptions().await.is_empty());

    let signature = common::sign_stripe(&payload);
    let (status, body) = common::send(&app, stripe_request(&payload, Some(&signature))).await;
    assert_eq!(status, 200);
    assert_eq!(body["received"], true);
    assert_eq!(body["outcome"], "processed");

    let (status, body) = common::send(&app, stripe_request(&payload, Some(&signature))).await;
    assert_eq!(status, 200);
    assert_eq!(body["outcome"], "duplicate");

    let token = common::bearer(&user);
    let (_, profile) = common::send(&app, common::get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(profile["user"]["subscription_tier"], "premium");
    assert_eq!(profile["subscription"]["status"], "active");
    assert_eq!(profile["quota"]["can_access_api"], true);

    let (status, history) =
        common::send(&app, common::get("/api/v1/payments/history", Some(&token))).await;
    assert_eq!(status, 200);
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn webhook_for_unknown_subscription_asks_for_redelivery() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let payload = json!({
        "id": "evt_2",
        "type": "customer.subscription.updated",
        "data": { "object": { "id": "sub_missing", "status": "active" } }
    })
    .to_string();

    let signature = common::sign_stripe(&payload);
    let (status, _) = common::send(&app, stripe_request(&payload, Some(&signature))).await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn paypal_webhook_without_user_is_acknowledged_as_rejected() {
    let store = MemoryStore::new();
    let app = common::app(&store, true);
    let payload = json!({
        "id": "WH-1",
        "event_type": "BILLING.SUBSCRIPTION.CREATED",
        "resource": { "id": "I-SUB" }
    })
    .to_string();

    let (status, body) = common::send(
        &app,
        common::post_json("/api/v1/payments/webhook/paypal", None, &payload),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["outcome"], "rejected");
    assert!(store.subscriptions().await.is_empty());
}

#[tokio::test]
async fn paypal_webhook_without_credentials_is_unavailable() {
    let app = common::app(&MemoryStore::new(), false);

    let (status, _) = common::send(
        &app,
        common::post_json("/api/v1/payments/webhook/paypal", None, "{}"),
    )
    .await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn checkout_rules() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "checkout@example.com", "free").await;
    let token = common::bearer(&user);

    let (status, _) = common::send(
        &app,
        common::post_json(
            "/api/v1/payments/checkout",
            None,
            r#"{"tier":"premium","provider":"stripe"}"#,
        ),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = common::send(
        &app,
        common::post_json(
            "/api/v1/payments/checkout",
            Some(&token),
            r#"{"tier":"premium","provider":"paypal"}"#,
        ),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "provider not configured");

    let (status, _) = common::send(
        &app,
        common::post_json(
            "/api/v1/payments/checkout",
            Some(&token),
            r#"{"tier":"free","provider":"stripe"}"#,
        ),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn profile_requires_a_known_user() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "me@example.com", "free").await;

    let (status, body) = common::send(
        &app,
        common::get("/api/v1/auth/me", Some(&common::bearer(&user))),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["email"], "me@example.com");
    assert!(body["subscription"].is_null());

    let (status, _) = common::send(&app, common::get("/api/v1/auth/me", Some("Bearer nope"))).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn session_refresh_accepts_only_valid_tokens() {
    let store = MemoryStore::new();
    let app = common::app(&store, false);
    let user = common::create_user(&store, "refresh@example.com", "free").await;
    let token = common::session_keys().issue(&user).unwrap();

    let (status, body) = common::send(
        &app,
        common::post_json(
            "/api/v1/auth/refresh",
            None,
            &json!({ "token": token }).to_string(),
        ),
    )
    .await;
    assert_eq!(status, 200);
    let refreshed = body["token"].as_str().unwrap();
    let claims = common::session_keys().validate(refreshed).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    let expires_in = body["expires_in"].as_u64().unwrap();
    assert!(expires_in > 0 && expires_in <= 3600);

    let (status, _) = common::send(
        &app,
        common::post_json(
            "/api/v1/auth/refresh",
            None,
            &json!({ "token": "not-a-jwt" }).to_string(),
        ),
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn feature_gate_blocks_lower_tiers() {
    let store = MemoryStore::new();
    let free = common::create_user(&store, "free@example.com", "free").await;
    let premium = common::create_user(&store, "premium@example.com", "premium").await;

    let shared = Arc::new(store.clone());
    let quotas = Arc::new(QuotaUseCase::new(
        Arc::clone(&shared),
        Arc::clone(&shared),
        shared,
    ));
    let app = Router::new()
        .route("/export", get(|| async { axum::Json(json!({ "ok": true })) }))
        .route_layer(middleware::from_fn_with_state(
            FeatureRequirement {
                quotas,
                feature: Feature::ApiAccess,
            },
            require_feature::<MemoryStore, MemoryStore, MemoryStore>,
        ))
        .layer(Extension(common::session_keys()));

    let (status, body) =
        common::send(&app, common::get("/export", Some(&common::bearer(&free)))).await;
    assert_eq!(status, 403);
    assert_eq!(body["feature"], "api_access");

    let (status, body) =
        common::send(&app, common::get("/export", Some(&common::bearer(&premium)))).await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);

    let (status, _) = common::send(&app, common::get("/export", None)).await;
    assert_eq!(status, 403);
}
