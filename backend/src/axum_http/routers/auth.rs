use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use crates::domain::repositories::{
    subscriptions::SubscriptionRepository, topology_counter::TopologyCounter,
    user_quotas::UserQuotaRepository, users::UserRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{AuthError, AuthUser, SessionKeys},
    axum_http::error_responses::AppError,
    usecases::accounts::AccountUseCase,
};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_in: usize,
}

pub fn routes<U, S, Q, T>(accounts: Arc<AccountUseCase<U, S, Q, T>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    Router::new()
        .route("/me", get(get_me))
        .route("/refresh", post(refresh_token))
        .with_state(accounts)
}

pub async fn get_me<U, S, Q, T>(
    State(accounts): State<Arc<AccountUseCase<U, S, Q, T>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    info!(%user_id, "auth: profile request received");
    let profile = accounts.get_profile(user_id).await?;
    Ok(Json(profile))
}

pub async fn refresh_token(
    Extension(keys): Extension<Arc<SessionKeys>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let token = keys.refresh(&request.token).inspect_err(|err| {
        warn!(error = %err, "auth: session refresh rejected");
    })?;
    let claims = keys.validate(&token)?;
    let expires_in = claims
        .exp
        .saturating_sub(chrono::Utc::now().timestamp().max(0) as usize);

    Ok(Json(RefreshResponse { token, expires_in }))
}
