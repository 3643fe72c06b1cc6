use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use crates::domain::{
    repositories::{
        payments::PaymentRepository, topology_counter::TopologyCounter,
        user_quotas::UserQuotaRepository, users::UserRepository,
    },
    value_objects::{
        enums::subscription_tiers::SubscriptionTier, subscriptions::CreateCheckoutRequest,
    },
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::{
        error_responses::AppError,
        middleware::{TierRequirement, require_tier},
    },
    usecases::{payments::PaymentUseCase, quotas::QuotaUseCase},
};

pub fn routes<Pay, U, Q, T>(
    payments: Arc<PaymentUseCase<Pay>>,
    quotas: Arc<QuotaUseCase<U, Q, T>>,
) -> Router
where
    Pay: PaymentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/history", get(payment_history))
        .route_layer(middleware::from_fn_with_state(
            TierRequirement {
                quotas,
                required: SubscriptionTier::Free,
            },
            require_tier::<U, Q, T>,
        ))
        .with_state(payments)
}

pub async fn create_checkout<Pay>(
    State(payments): State<Arc<PaymentUseCase<Pay>>>,
    AuthUser { user_id, email, .. }: AuthUser,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, AppError>
where
    Pay: PaymentRepository + Send + Sync + 'static,
{
    info!(%user_id, provider = %request.provider, "payments: checkout request received");
    let checkout = payments.create_checkout(user_id, &email, request).await?;
    Ok(Json(checkout))
}

pub async fn payment_history<Pay>(
    State(payments): State<Arc<PaymentUseCase<Pay>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    Pay: PaymentRepository + Send + Sync + 'static,
{
    let history = payments.payment_history(user_id).await?;
    Ok(Json(history))
}
