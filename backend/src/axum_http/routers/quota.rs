use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::domain::{
    repositories::{
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::quotas::UserQuotaDto,
};

use crate::{auth::AuthUser, axum_http::error_responses::AppError, usecases::quotas::QuotaUseCase};

pub fn routes<U, Q, T>(quotas: Arc<QuotaUseCase<U, Q, T>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    Router::new().route("/", get(get_quota)).with_state(quotas)
}

pub async fn get_quota<U, Q, T>(
    State(quotas): State<Arc<QuotaUseCase<U, Q, T>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let quota = quotas.get_or_create_quota(user_id).await?;
    Ok(Json(UserQuotaDto::from(quota)))
}
