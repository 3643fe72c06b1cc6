use std::sync::Arc;

use crates::domain::{
    repositories::{
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::{enums::quota_kinds::QuotaKind, quotas::QuotaExceeded},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::quotas::{AnonymousLockGuard, QuotaError, QuotaUseCase, UserLockGuard};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("{} quota exceeded", .0.kind)]
    Exceeded(QuotaExceeded),
    #[error("quota state unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl GateError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GateError::Exceeded(_) => StatusCode::FORBIDDEN,
            GateError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<QuotaError> for GateError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::UserNotFound => {
                GateError::Unavailable(anyhow::anyhow!("user record not found"))
            }
            QuotaError::Internal(err) => GateError::Unavailable(err),
        }
    }
}

/// What the gate saw when it let a request through. Handlers read this from
/// the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaAdmission {
    pub kind: QuotaKind,
    pub user_id: Option<Uuid>,
    pub used: i32,
    pub max: Option<i32>,
}

/// Lock held by an admitted request: the user's quota row, or the shared
/// anonymous topology pool.
enum HeldLock {
    User(UserLockGuard),
    Anonymous { _pool: AnonymousLockGuard },
}

/// An admitted request. The quota lock is held until the permit is
/// committed or dropped, so nothing else can spend the same slot meanwhile.
pub struct QuotaPermit {
    admission: QuotaAdmission,
    lock: Option<HeldLock>,
}

impl QuotaPermit {
    pub fn admission(&self) -> QuotaAdmission {
        self.admission
    }
}

pub struct QuotaGate<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    quotas: Arc<QuotaUseCase<U, Q, T>>,
}

impl<U, Q, T> QuotaGate<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub fn new(quotas: Arc<QuotaUseCase<U, Q, T>>) -> Self {
        Self { quotas }
    }

    /// Fails closed: any error reading quota state denies the request.
    pub async fn admit(
        &self,
        user_id: Option<Uuid>,
        kind: QuotaKind,
    ) -> Result<QuotaPermit, GateError> {
        let result = match kind {
            QuotaKind::Topology => self.admit_topology(user_id).await,
            QuotaKind::Simulation => self.admit_simulation(user_id).await,
        };

        match &result {
            Ok(permit) => info!(
                user_id = ?user_id,
                kind = %kind,
                used = permit.admission.used,
                max = ?permit.admission.max,
                "quota_gate: request admitted"
            ),
            Err(GateError::Exceeded(exceeded)) => warn!(
                user_id = ?user_id,
                kind = %kind,
                used = ?exceeded.used,
                max = ?exceeded.max,
                "quota_gate: quota exceeded"
            ),
            Err(GateError::Unavailable(err)) => error!(
                user_id = ?user_id,
                kind = %kind,
                error = ?err,
                "quota_gate: quota state unavailable, denying"
            ),
        }
        result
    }

    async fn admit_topology(&self, user_id: Option<Uuid>) -> Result<QuotaPermit, GateError> {
        let (check, lock) = match user_id {
            None => {
                let guard = self.quotas.lock_anonymous().await;
                let check = self.quotas.check_anonymous_topology_quota_held(&guard).await?;
                (check, HeldLock::Anonymous { _pool: guard })
            }
            Some(user_id) => {
                let guard = self.quotas.lock_user(user_id).await;
                let check = self.quotas.check_topology_quota_held(&guard).await?;
                (check, HeldLock::User(guard))
            }
        };

        if !check.allowed {
            return Err(GateError::Exceeded(QuotaExceeded {
                kind: QuotaKind::Topology,
                used: Some(check.used),
                max: Some(check.max),
            }));
        }

        Ok(QuotaPermit {
            admission: QuotaAdmission {
                kind: QuotaKind::Topology,
                user_id,
                used: check.used,
                max: Some(check.max),
            },
            lock: Some(lock),
        })
    }

    async fn admit_simulation(&self, user_id: Option<Uuid>) -> Result<QuotaPermit, GateError> {
        // Anonymous simulations are not metered.
        let Some(user_id) = user_id else {
            return Ok(QuotaPermit {
                admission: QuotaAdmission {
                    kind: QuotaKind::Simulation,
                    user_id: None,
                    used: 0,
                    max: None,
                },
                lock: None,
            });
        };

        let guard = self.quotas.lock_user(user_id).await;
        let quota = self.quotas.get_or_create_quota_held(&guard).await?;

        if quota.used_simulations_today >= quota.max_simulations_per_day {
            return Err(GateError::Exceeded(QuotaExceeded {
                kind: QuotaKind::Simulation,
                used: Some(quota.used_simulations_today),
                max: Some(quota.max_simulations_per_day),
            }));
        }

        Ok(QuotaPermit {
            admission: QuotaAdmission {
                kind: QuotaKind::Simulation,
                user_id: Some(user_id),
                used: quota.used_simulations_today,
                max: Some(quota.max_simulations_per_day),
            },
            lock: Some(HeldLock::User(guard)),
        })
    }

    /// Charges the admitted usage. Call only after the protected action succeeded.
    /// Topology usage is recounted from the store on the next check, so only
    /// simulations are charged here.
    pub async fn commit(&self, permit: QuotaPermit) -> Result<(), GateError> {
        let QuotaPermit { admission, lock } = permit;
        let (QuotaKind::Simulation, Some(HeldLock::User(guard))) = (admission.kind, lock) else {
            return Ok(());
        };

        match self.quotas.increment_simulation_count_held(&guard).await? {
            Some(_) => Ok(()),
            None => Err(GateError::Exceeded(QuotaExceeded {
                kind: QuotaKind::Simulation,
                used: Some(admission.used),
                max: admission.max,
            })),
        }
    }
}
