use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::{
    repositories::{
        payments::PaymentRepository, subscriptions::SubscriptionRepository,
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::subscriptions::{WebhookAck, WebhookOutcome},
};
use tracing::warn;

use crate::{
    axum_http::error_responses::{AppError, error_response},
    usecases::webhooks::{UseCaseResult, WebhookUseCase},
};

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

pub fn routes<S, Pay, U, Q, T>(webhooks: Arc<WebhookUseCase<S, Pay, U, Q, T>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    Router::new()
        .route("/webhook/stripe", post(stripe_webhook))
        .route("/webhook/paypal", post(paypal_webhook))
        .with_state(webhooks)
}

pub async fn stripe_webhook<S, Pay, U, Q, T>(
    State(webhooks): State<Arc<WebhookUseCase<S, Pay, U, Q, T>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("webhooks: stripe delivery without signature header");
        return error_response(StatusCode::BAD_REQUEST, "Missing Stripe-Signature header");
    };

    acknowledge(webhooks.handle_stripe_webhook(&body, signature).await)
}

pub async fn paypal_webhook<S, Pay, U, Q, T>(
    State(webhooks): State<Arc<WebhookUseCase<S, Pay, U, Q, T>>>,
    body: Bytes,
) -> Response
where
    S: SubscriptionRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    acknowledge(webhooks.handle_paypal_webhook(&body).await)
}

/// Providers retry anything that is not 2xx, so only retriable failures and
/// authenticity problems get an error status.
fn acknowledge(result: UseCaseResult<WebhookOutcome>) -> Response {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) if err.is_rejected_event() => WebhookOutcome::Rejected,
        Err(err) => return AppError::from(err).into_response(),
    };

    (
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            outcome,
        }),
    )
        .into_response()
}
