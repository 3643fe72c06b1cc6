use std::sync::Arc;

use axum::{
    Extension, Json, Router, middleware,
    response::IntoResponse,
    routing::post,
};
use crates::domain::{
    repositories::{
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::enums::quota_kinds::QuotaKind,
};
use serde::Serialize;
use tracing::info;

use crate::{
    axum_http::middleware::{QuotaGuard, enforce_quota},
    usecases::quota_gate::{QuotaAdmission, QuotaGate},
};

#[derive(Debug, Serialize)]
pub struct UsageAdmission {
    pub allowed: bool,
    pub kind: QuotaKind,
    pub used: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl From<QuotaAdmission> for UsageAdmission {
    fn from(admission: QuotaAdmission) -> Self {
        Self {
            allowed: true,
            kind: admission.kind,
            used: admission.used,
            max: admission.max,
        }
    }
}

pub fn routes<U, Q, T>(gate: Arc<QuotaGate<U, Q, T>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let topologies = Router::new()
        .route("/topologies", post(record_topology))
        .route_layer(middleware::from_fn_with_state(
            QuotaGuard {
                gate: Arc::clone(&gate),
                kind: QuotaKind::Topology,
            },
            enforce_quota::<U, Q, T>,
        ));

    let simulations = Router::new()
        .route("/simulations", post(record_simulation))
        .route_layer(middleware::from_fn_with_state(
            QuotaGuard {
                gate,
                kind: QuotaKind::Simulation,
            },
            enforce_quota::<U, Q, T>,
        ));

    topologies.merge(simulations)
}

/// Answers whether one more topology fits. Topology usage is recounted from
/// the store on every check.
pub async fn record_topology(Extension(admission): Extension<QuotaAdmission>) -> impl IntoResponse {
    info!(user_id = ?admission.user_id, used = admission.used, "usage: topology slot granted");
    Json(UsageAdmission::from(admission))
}

/// Records one simulation run. The gate charges it once this answers 2xx.
pub async fn record_simulation(
    Extension(admission): Extension<QuotaAdmission>,
) -> impl IntoResponse {
    info!(user_id = ?admission.user_id, used = admission.used, "usage: simulation accepted");
    Json(UsageAdmission::from(admission))
}
