use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{user_quotas::UserQuotaEntity, users::UserEntity},
    repositories::{
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::{
        enums::{
            features::Feature, subscription_statuses::SubscriptionStatus,
            subscription_tiers::SubscriptionTier,
        },
        quotas::{DEMO_TOPOLOGY_LIMIT, QuotaDefaults, TopologyQuotaCheck, start_of_day},
    },
};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl QuotaError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            QuotaError::UserNotFound => StatusCode::NOT_FOUND,
            QuotaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, QuotaError>;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

/// Exclusive hold on one user's quota row for the lifetime of the guard.
///
/// Every compound read-modify-write in [`QuotaUseCase`] runs under one of
/// these; the `*_held` methods take it as proof the caller already owns it.
pub struct UserLockGuard {
    user_id: Uuid,
    locks: Arc<LockMap>,
    _guard: OwnedMutexGuard<()>,
}

impl UserLockGuard {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        // The map and this guard hold the only references when nobody is waiting.
        self.locks
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) <= 2);
    }
}

/// Exclusive hold on the shared pool of anonymous topologies.
pub struct AnonymousLockGuard {
    _guard: OwnedMutexGuard<()>,
}

pub struct QuotaUseCase<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    quota_repo: Arc<Q>,
    topology_counter: Arc<T>,
    locks: Arc<LockMap>,
    anonymous: Arc<Mutex<()>>,
}

impl<U, Q, T> QuotaUseCase<U, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, quota_repo: Arc<Q>, topology_counter: Arc<T>) -> Self {
        Self {
            user_repo,
            quota_repo,
            topology_counter,
            locks: Arc::new(DashMap::new()),
            anonymous: Arc::new(Mutex::new(())),
        }
    }

    pub async fn lock_anonymous(&self) -> AnonymousLockGuard {
        AnonymousLockGuard {
            _guard: Arc::clone(&self.anonymous).lock_owned().await,
        }
    }

    pub async fn lock_user(&self, user_id: Uuid) -> UserLockGuard {
        let mutex = Arc::clone(self.locks.entry(user_id).or_default().value());
        let guard = mutex.lock_owned().await;
        UserLockGuard {
            user_id,
            locks: Arc::clone(&self.locks),
            _guard: guard,
        }
    }

    pub async fn get_or_create_quota(&self, user_id: Uuid) -> UseCaseResult<UserQuotaEntity> {
        let guard = self.lock_user(user_id).await;
        self.get_or_create_quota_held(&guard).await
    }

    /// Loads the quota row, seeding it from the user's tier when absent and
    /// applying the daily simulation rollover.
    pub async fn get_or_create_quota_held(
        &self,
        guard: &UserLockGuard,
    ) -> UseCaseResult<UserQuotaEntity> {
        let user_id = guard.user_id();
        let now = Utc::now();

        let quota = match self.quota_repo.find_by_user_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "quotas: failed to load quota");
            QuotaError::Internal(err)
        })? {
            Some(quota) => quota,
            None => self.create_default_quota(user_id, now).await?,
        };

        if !quota.needs_daily_reset(now) {
            return Ok(quota);
        }

        let day_start = start_of_day(now);
        let reset = self
            .quota_repo
            .reset_daily_simulations(user_id, day_start)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to reset daily simulations");
                QuotaError::Internal(err)
            })?;

        match reset {
            Some(quota) => {
                info!(%user_id, %day_start, "quotas: daily simulation counter rolled over");
                Ok(quota)
            }
            None => {
                // Another instance won the conditional reset; read its result.
                debug!(%user_id, "quotas: rollover already applied, reloading");
                self.quota_repo
                    .find_by_user_id(user_id)
                    .await
                    .map_err(|err| {
                        error!(%user_id, db_error = ?err, "quotas: failed to reload quota");
                        QuotaError::Internal(err)
                    })?
                    .ok_or_else(|| {
                        QuotaError::Internal(anyhow::anyhow!("quota vanished during rollover"))
                    })
            }
        }
    }

    async fn create_default_quota(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> UseCaseResult<UserQuotaEntity> {
        let user = self.user_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "quotas: failed to load user for default quota");
            QuotaError::Internal(err)
        })?;

        let tier = match user {
            Some(user) => SubscriptionTier::from_str(&user.subscription_tier),
            None => {
                warn!(%user_id, "quotas: user not found, seeding free defaults");
                SubscriptionTier::Free
            }
        };

        let quota = self
            .quota_repo
            .insert_if_absent(QuotaDefaults::for_tier(tier).into_quota(user_id, now))
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to create default quota");
                QuotaError::Internal(err)
            })?;

        info!(%user_id, tier = %tier, "quotas: default quota created");
        Ok(quota)
    }

    /// `None` checks the anonymous pool against the demo limit without
    /// touching the quota store.
    pub async fn check_topology_quota(
        &self,
        user_id: Option<Uuid>,
    ) -> UseCaseResult<TopologyQuotaCheck> {
        match user_id {
            None => {
                let guard = self.lock_anonymous().await;
                self.check_anonymous_topology_quota_held(&guard).await
            }
            Some(user_id) => {
                let guard = self.lock_user(user_id).await;
                self.check_topology_quota_held(&guard).await
            }
        }
    }

    pub async fn check_anonymous_topology_quota_held(
        &self,
        _guard: &AnonymousLockGuard,
    ) -> UseCaseResult<TopologyQuotaCheck> {
        let used = self.count_topologies(None).await?;
        Ok(TopologyQuotaCheck::new(used, DEMO_TOPOLOGY_LIMIT))
    }

    pub async fn check_topology_quota_held(
        &self,
        guard: &UserLockGuard,
    ) -> UseCaseResult<TopologyQuotaCheck> {
        let user_id = guard.user_id();
        self.get_or_create_quota_held(guard).await?;

        let used = self.count_topologies(Some(user_id)).await?;
        let quota = self
            .quota_repo
            .record_topology_usage(user_id, used)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to record topology usage");
                QuotaError::Internal(err)
            })?;

        Ok(TopologyQuotaCheck::new(
            quota.used_topologies,
            quota.max_topologies,
        ))
    }

    async fn count_topologies(&self, user_id: Option<Uuid>) -> UseCaseResult<i32> {
        let count = self
            .topology_counter
            .count_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id = ?user_id, db_error = ?err, "quotas: failed to count topologies");
                QuotaError::Internal(err)
            })?;

        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// Anonymous callers have no simulation ledger and are always allowed.
    pub async fn check_simulation_quota(&self, user_id: Option<Uuid>) -> UseCaseResult<bool> {
        let Some(user_id) = user_id else {
            return Ok(true);
        };

        let guard = self.lock_user(user_id).await;
        let quota = self.get_or_create_quota_held(&guard).await?;
        Ok(quota.used_simulations_today < quota.max_simulations_per_day)
    }

    /// Charges one simulation unless the daily limit is already reached, in
    /// which case nothing is written and `None` comes back.
    pub async fn increment_simulation_count_held(
        &self,
        guard: &UserLockGuard,
    ) -> UseCaseResult<Option<UserQuotaEntity>> {
        let user_id = guard.user_id();
        self.get_or_create_quota_held(guard).await?;

        let quota = self
            .quota_repo
            .try_consume_simulation(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to consume simulation");
                QuotaError::Internal(err)
            })?;

        match &quota {
            Some(quota) => debug!(
                %user_id,
                used = quota.used_simulations_today,
                max = quota.max_simulations_per_day,
                "quotas: simulation recorded"
            ),
            None => warn!(%user_id, "quotas: daily simulation limit reached, nothing charged"),
        }
        Ok(quota)
    }

    /// Feature names outside the gated set are always allowed.
    pub async fn can_use_feature(
        &self,
        user_id: Option<Uuid>,
        feature: &str,
    ) -> UseCaseResult<bool> {
        let Some(feature) = Feature::from_str(feature) else {
            return Ok(true);
        };
        let Some(user_id) = user_id else {
            return Ok(false);
        };

        let quota = self.get_or_create_quota(user_id).await?;
        Ok(quota.allows_feature(feature))
    }

    /// Stored tier of the user; `None` when the stored value is not a known tier.
    pub async fn stored_tier(&self, user_id: Uuid) -> UseCaseResult<Option<SubscriptionTier>> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to load user tier");
                QuotaError::Internal(err)
            })?
            .ok_or(QuotaError::UserNotFound)?;

        Ok(SubscriptionTier::parse(&user.subscription_tier))
    }

    /// Moves the user to `tier`, marks them active and replaces the quota row
    /// with fresh defaults. Usage counters are reset to zero.
    pub async fn update_user_tier(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> UseCaseResult<UserEntity> {
        let guard = self.lock_user(user_id).await;
        self.update_user_tier_held(&guard, tier).await
    }

    pub async fn update_user_tier_held(
        &self,
        guard: &UserLockGuard,
        tier: SubscriptionTier,
    ) -> UseCaseResult<UserEntity> {
        let user_id = guard.user_id();
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to load user for tier update");
                QuotaError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, "quotas: tier update for unknown user");
                QuotaError::UserNotFound
            })?;

        let previous_tier = user.subscription_tier.clone();
        user.subscription_tier = tier.as_str().to_string();
        user.subscription_status = SubscriptionStatus::Active.as_str().to_string();

        self.quota_repo
            .upsert(QuotaDefaults::for_tier(tier).into_quota(user_id, Utc::now()))
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "quotas: failed to regenerate quota");
                QuotaError::Internal(err)
            })?;

        let user = self.user_repo.update(user).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "quotas: failed to persist user tier");
            QuotaError::Internal(err)
        })?;

        info!(
            %user_id,
            previous_tier = %previous_tier,
            tier = %tier,
            "quotas: user tier updated"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::{
        entities::user_quotas::InsertUserQuotaEntity,
        repositories::{
            topology_counter::MockTopologyCounter, user_quotas::MockUserQuotaRepository,
            users::MockUserRepository,
        },
        value_objects::quotas::UNLIMITED,
    };
    use mockall::predicate::{always, eq};

    fn sample_user(user_id: Uuid, tier: &str) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: user_id,
            email: "user@example.com".to_string(),
            name: None,
            avatar_url: None,
            subscription_tier: tier.to_string(),
            subscription_status: "active".to_string(),
            subscription_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn quota_from(insert: InsertUserQuotaEntity) -> UserQuotaEntity {
        let now = Utc::now();
        UserQuotaEntity {
            id: Uuid::new_v4(),
            user_id: insert.user_id,
            max_topologies: insert.max_topologies,
            used_topologies: insert.used_topologies,
            max_simulations_per_day: insert.max_simulations_per_day,
            used_simulations_today: insert.used_simulations_today,
            last_simulation_reset_date: insert.last_simulation_reset_date,
            can_use_3d_rendering: insert.can_use_3d_rendering,
            can_use_ai_prediction: insert.can_use_ai_prediction,
            can_use_advanced_security: insert.can_use_advanced_security,
            can_access_api: insert.can_access_api,
            created_at: now,
            updated_at: now,
        }
    }

    fn stored_quota(user_id: Uuid, defaults: QuotaDefaults) -> UserQuotaEntity {
        quota_from(defaults.into_quota(user_id, Utc::now()))
    }

    fn usecase(
        user_repo: MockUserRepository,
        quota_repo: MockUserQuotaRepository,
        counter: MockTopologyCounter,
    ) -> QuotaUseCase<MockUserRepository, MockUserQuotaRepository, MockTopologyCounter> {
        QuotaUseCase::new(Arc::new(user_repo), Arc::new(quota_repo), Arc::new(counter))
    }

    #[tokio::test]
    async fn creates_quota_from_user_tier_when_absent() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        quota_repo
            .expect_find_by_user_id()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                let user = sample_user(user_id, "premium");
                Box::pin(async move { Ok(Some(user)) })
            });
        quota_repo
            .expect_insert_if_absent()
            .withf(move |quota| {
                quota.user_id == user_id
                    && quota.max_simulations_per_day == UNLIMITED
                    && quota.can_access_api
            })
            .times(1)
            .returning(|quota| Box::pin(async move { Ok(quota_from(quota)) }));

        let quotas = usecase(user_repo, quota_repo, MockTopologyCounter::new());
        let quota = quotas.get_or_create_quota(user_id).await.unwrap();

        assert_eq!(quota.max_topologies, UNLIMITED);
        assert_eq!(quota.used_simulations_today, 0);
    }

    #[tokio::test]
    async fn missing_user_falls_back_to_free_defaults() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        quota_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        quota_repo
            .expect_insert_if_absent()
            .withf(|quota| quota.max_simulations_per_day == 100 && !quota.can_access_api)
            .returning(|quota| Box::pin(async move { Ok(quota_from(quota)) }));

        let quotas = usecase(user_repo, quota_repo, MockTopologyCounter::new());
        let quota = quotas.get_or_create_quota(user_id).await.unwrap();

        assert_eq!(quota.max_simulations_per_day, 100);
    }

    #[tokio::test]
    async fn user_store_failure_is_not_masked() {
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        quota_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        quota_repo.expect_insert_if_absent().never();

        let quotas = usecase(user_repo, quota_repo, MockTopologyCounter::new());
        let result = quotas.get_or_create_quota(Uuid::new_v4()).await;

        assert!(matches!(result, Err(QuotaError::Internal(_))));
    }

    #[tokio::test]
    async fn stale_reset_date_rolls_counter_over() {
        let user_id = Uuid::new_v4();
        let mut quota_repo = MockUserQuotaRepository::new();

        let mut stale = stored_quota(user_id, QuotaDefaults::free());
        stale.used_simulations_today = 7;
        stale.last_simulation_reset_date = start_of_day(Utc::now()) - Duration::days(1);

        quota_repo.expect_find_by_user_id().returning(move |_| {
            let stale = stale.clone();
            Box::pin(async move { Ok(Some(stale)) })
        });
        quota_repo
            .expect_reset_daily_simulations()
            .with(eq(user_id), eq(start_of_day(Utc::now())))
            .times(1)
            .returning(move |user_id, day_start| {
                let mut fresh = stored_quota(user_id, QuotaDefaults::free());
                fresh.last_simulation_reset_date = day_start;
                Box::pin(async move { Ok(Some(fresh)) })
            });

        let quotas = usecase(MockUserRepository::new(), quota_repo, MockTopologyCounter::new());
        let quota = quotas.get_or_create_quota(user_id).await.unwrap();

        assert_eq!(quota.used_simulations_today, 0);
        assert_eq!(quota.last_simulation_reset_date, start_of_day(Utc::now()));
    }

    #[tokio::test]
    async fn current_reset_date_skips_rollover() {
        let user_id = Uuid::new_v4();
        let mut quota_repo = MockUserQuotaRepository::new();

        let mut current = stored_quota(user_id, QuotaDefaults::free());
        current.used_simulations_today = 4;
        quota_repo.expect_find_by_user_id().returning(move |_| {
            let current = current.clone();
            Box::pin(async move { Ok(Some(current)) })
        });
        quota_repo.expect_reset_daily_simulations().never();

        let quotas = usecase(MockUserRepository::new(), quota_repo, MockTopologyCounter::new());

        assert_eq!(
            quotas.get_or_create_quota(user_id).await.unwrap().used_simulations_today,
            4
        );
    }

    #[tokio::test]
    async fn anonymous_topology_check_uses_demo_limit_only() {
        let mut counter = MockTopologyCounter::new();
        counter
            .expect_count_by_user_id()
            .with(eq(None))
            .returning(|_| Box::pin(async { Ok(3) }));

        let mut quota_repo = MockUserQuotaRepository::new();
        quota_repo.expect_find_by_user_id().never();

        let quotas = usecase(MockUserRepository::new(), quota_repo, counter);
        let check = quotas.check_topology_quota(None).await.unwrap();

        assert_eq!(check, TopologyQuotaCheck { allowed: false, used: 3, max: 3 });
    }

    #[tokio::test]
    async fn authenticated_topology_check_persists_refreshed_count() {
        let user_id = Uuid::new_v4();
        let mut counter = MockTopologyCounter::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        quota_repo.expect_find_by_user_id().returning(move |_| {
            let quota = stored_quota(user_id, QuotaDefaults::demo());
            Box::pin(async move { Ok(Some(quota)) })
        });
        counter
            .expect_count_by_user_id()
            .with(eq(Some(user_id)))
            .returning(|_| Box::pin(async { Ok(2) }));
        quota_repo
            .expect_record_topology_usage()
            .with(eq(user_id), eq(2))
            .times(1)
            .returning(move |_, used| {
                let mut quota = stored_quota(user_id, QuotaDefaults::demo());
                quota.used_topologies = used;
                Box::pin(async move { Ok(quota) })
            });

        let quotas = usecase(MockUserRepository::new(), quota_repo, counter);
        let check = quotas.check_topology_quota(Some(user_id)).await.unwrap();

        assert_eq!(check, TopologyQuotaCheck { allowed: true, used: 2, max: 3 });
    }

    #[tokio::test]
    async fn anonymous_simulation_is_always_allowed() {
        let quotas = usecase(
            MockUserRepository::new(),
            MockUserQuotaRepository::new(),
            MockTopologyCounter::new(),
        );

        assert!(quotas.check_simulation_quota(None).await.unwrap());
    }

    #[tokio::test]
    async fn feature_gating_for_anonymous_and_unknown_features() {
        let quotas = usecase(
            MockUserRepository::new(),
            MockUserQuotaRepository::new(),
            MockTopologyCounter::new(),
        );

        assert!(!quotas.can_use_feature(None, "ai_prediction").await.unwrap());
        assert!(!quotas.can_use_feature(None, "3d_rendering").await.unwrap());
        assert!(quotas.can_use_feature(None, "unknown_feature").await.unwrap());
    }

    #[tokio::test]
    async fn authenticated_feature_reads_quota_flags() {
        let user_id = Uuid::new_v4();
        let mut quota_repo = MockUserQuotaRepository::new();
        quota_repo.expect_find_by_user_id().returning(move |_| {
            let quota = stored_quota(user_id, QuotaDefaults::free());
            Box::pin(async move { Ok(Some(quota)) })
        });

        let quotas = usecase(MockUserRepository::new(), quota_repo, MockTopologyCounter::new());

        assert!(quotas.can_use_feature(Some(user_id), "ai_prediction").await.unwrap());
        assert!(!quotas.can_use_feature(Some(user_id), "api_access").await.unwrap());
    }

    #[tokio::test]
    async fn tier_update_resets_usage_and_activates_user() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        user_repo.expect_find_by_id().returning(move |_| {
            let mut user = sample_user(user_id, "free");
            user.subscription_status = "cancelled".to_string();
            Box::pin(async move { Ok(Some(user)) })
        });
        quota_repo
            .expect_upsert()
            .withf(move |quota| {
                quota.user_id == user_id
                    && quota.used_topologies == 0
                    && quota.max_topologies == UNLIMITED
                    && quota.can_access_api
            })
            .times(1)
            .returning(|quota| Box::pin(async move { Ok(quota_from(quota)) }));
        user_repo
            .expect_update()
            .with(always())
            .times(1)
            .returning(|user| Box::pin(async move { Ok(user) }));

        let quotas = usecase(user_repo, quota_repo, MockTopologyCounter::new());
        let user = quotas
            .update_user_tier(user_id, SubscriptionTier::Premium)
            .await
            .unwrap();

        assert_eq!(user.subscription_tier, "premium");
        assert_eq!(user.subscription_status, "active");
    }

    #[tokio::test]
    async fn tier_update_for_unknown_user_fails() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        let mut quota_repo = MockUserQuotaRepository::new();
        quota_repo.expect_upsert().never();

        let quotas = usecase(user_repo, quota_repo, MockTopologyCounter::new());
        let result = quotas
            .update_user_tier(Uuid::new_v4(), SubscriptionTier::Premium)
            .await;

        assert!(matches!(result, Err(QuotaError::UserNotFound)));
    }

    #[tokio::test]
    async fn lock_entries_are_released_after_use() {
        let quotas = usecase(
            MockUserRepository::new(),
            MockUserQuotaRepository::new(),
            MockTopologyCounter::new(),
        );
        let user_id = Uuid::new_v4();

        {
            let _guard = quotas.lock_user(user_id).await;
            assert!(quotas.locks.contains_key(&user_id));
        }

        assert!(!quotas.locks.contains_key(&user_id));
    }
}
