use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use crates::domain::repositories::{
    topology_counter::TopologyCounter, user_quotas::UserQuotaRepository, users::UserRepository,
};
use serde::Serialize;

use crate::{
    auth::OptionalAuthUser, axum_http::error_responses::AppError, usecases::quotas::QuotaUseCase,
};

#[derive(Debug, Serialize)]
pub struct FeatureAccess {
    pub feature: String,
    pub allowed: bool,
}

pub fn routes<U, Q, T>(quotas: Arc<QuotaUseCase<U, Q, T>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    Router::new()
        .route("/:feature", get(check_feature))
        .with_state(quotas)
}

/// Names that are not gated capabilities are always allowed.
pub async fn check_feature<U, Q, T>(
    State(quotas): State<Arc<QuotaUseCase<U, Q, T>>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(feature): Path<String>,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let allowed = quotas
        .can_use_feature(user.map(|user| user.user_id), &feature)
        .await?;

    Ok(Json(FeatureAccess { feature, allowed }))
}
