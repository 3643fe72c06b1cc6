use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use crates::domain::{
    repositories::{
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::enums::{
        features::Feature, quota_kinds::QuotaKind, subscription_tiers::SubscriptionTier,
    },
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    auth::OptionalAuthUser,
    axum_http::error_responses::{AppError, error_response},
    usecases::{
        quota_gate::QuotaGate,
        quotas::{QuotaError, QuotaUseCase},
    },
};

/// State for [`enforce_quota`]: which gate and which quota it meters.
pub struct QuotaGuard<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub gate: Arc<QuotaGate<U, Q, T>>,
    pub kind: QuotaKind,
}

impl<U, Q, T> Clone for QuotaGuard<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            kind: self.kind,
        }
    }
}

/// Admits the request through the quota gate and charges usage only when the
/// handler answered 2xx. The admission is available to the handler as a
/// request extension. Handlers behind this layer must not take the user's
/// quota lock themselves.
pub async fn enforce_quota<U, Q, T>(
    State(guard): State<QuotaGuard<U, Q, T>>,
    OptionalAuthUser(user): OptionalAuthUser,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let user_id = user.map(|user| user.user_id);
    let permit = match guard.gate.admit(user_id, guard.kind).await {
        Ok(permit) => permit,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(permit.admission());
    let response = next.run(request).await;

    if !response.status().is_success() {
        info!(
            user_id = ?user_id,
            kind = %guard.kind,
            status = %response.status(),
            "quota_gate: handler failed, usage not charged"
        );
        return response;
    }

    if let Err(err) = guard.gate.commit(permit).await {
        error!(
            user_id = ?user_id,
            kind = %guard.kind,
            error = ?err,
            "quota_gate: failed to charge usage after success"
        );
    }
    response
}

/// State for [`require_tier`].
pub struct TierRequirement<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub quotas: Arc<QuotaUseCase<U, Q, T>>,
    pub required: SubscriptionTier,
}

impl<U, Q, T> Clone for TierRequirement<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            quotas: Arc::clone(&self.quotas),
            required: self.required,
        }
    }
}

#[derive(Debug, Serialize)]
struct TierDenied {
    code: u16,
    message: String,
    required: SubscriptionTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<SubscriptionTier>,
}

/// Anonymous callers count as `demo`. A stored tier that is not recognised
/// never passes.
pub async fn require_tier<U, Q, T>(
    State(requirement): State<TierRequirement<U, Q, T>>,
    OptionalAuthUser(user): OptionalAuthUser,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let current = match user {
        None => Some(SubscriptionTier::Demo),
        Some(user) => match requirement.quotas.stored_tier(user.user_id).await {
            Ok(tier) => tier,
            Err(QuotaError::UserNotFound) => return AppError::Unauthorized.into_response(),
            Err(err) => {
                error!(user_id = %user.user_id, error = ?err, "tier_gate: failed to load tier");
                return AppError::Unavailable.into_response();
            }
        },
    };

    if current.is_some_and(|tier| tier.satisfies(requirement.required)) {
        return next.run(request).await;
    }

    warn!(
        required = %requirement.required,
        current = ?current,
        "tier_gate: insufficient subscription tier"
    );
    let status = StatusCode::FORBIDDEN;
    (
        status,
        Json(TierDenied {
            code: status.as_u16(),
            message: "Insufficient subscription tier".to_string(),
            required: requirement.required,
            current,
        }),
    )
        .into_response()
}

/// State for [`require_feature`].
pub struct FeatureRequirement<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub quotas: Arc<QuotaUseCase<U, Q, T>>,
    pub feature: Feature,
}

impl<U, Q, T> Clone for FeatureRequirement<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            quotas: Arc::clone(&self.quotas),
            feature: self.feature,
        }
    }
}

#[derive(Debug, Serialize)]
struct FeatureDenied {
    code: u16,
    message: String,
    feature: Feature,
}

pub async fn require_feature<U, Q, T>(
    State(requirement): State<FeatureRequirement<U, Q, T>>,
    OptionalAuthUser(user): OptionalAuthUser,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    let user_id = user.map(|user| user.user_id);
    match requirement
        .quotas
        .can_use_feature(user_id, requirement.feature.as_str())
        .await
    {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            info!(user_id = ?user_id, feature = %requirement.feature, "feature_gate: denied");
            let status = StatusCode::FORBIDDEN;
            (
                status,
                Json(FeatureDenied {
                    code: status.as_u16(),
                    message: "Feature not available for your subscription tier".to_string(),
                    feature: requirement.feature,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!(user_id = ?user_id, error = ?err, "feature_gate: failed to check feature");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Feature check unavailable")
        }
    }
}
