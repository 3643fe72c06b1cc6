use std::{fmt::Debug, future::Future, sync::Arc};

use crates::domain::{
    entities::users::InsertUserEntity,
    repositories::{
        subscriptions::SubscriptionRepository, topology_counter::TopologyCounter,
        user_quotas::UserQuotaRepository, users::UserRepository,
    },
    value_objects::{
        accounts::{LoginDto, OAuthIdentity, ProfileDto},
        enums::{subscription_statuses::SubscriptionStatus, subscription_tiers::SubscriptionTier},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::quotas::QuotaUseCase;
use crate::auth::SessionKeys;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("identity has no usable email")]
    InvalidIdentity,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AccountError::InvalidIdentity => StatusCode::BAD_REQUEST,
            AccountError::UserNotFound => StatusCode::NOT_FOUND,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AccountError>;

/// Informational read: a failure is logged and becomes `None`.
/// Never use this on a path that gates access.
pub async fn best_effort<V, E, F>(what: &'static str, user_id: Uuid, fetch: F) -> Option<V>
where
    F: Future<Output = Result<V, E>>,
    E: Debug,
{
    match fetch.await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%user_id, error = ?err, "accounts: best-effort {} read failed", what);
            None
        }
    }
}

pub struct AccountUseCase<U, S, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    subscription_repo: Arc<S>,
    quotas: Arc<QuotaUseCase<U, Q, T>>,
    session_keys: Arc<SessionKeys>,
}

impl<U, S, Q, T> AccountUseCase<U, S, Q, T>
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    Q: UserQuotaRepository + Send + Sync + 'static,
    T: TopologyCounter + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        subscription_repo: Arc<S>,
        quotas: Arc<QuotaUseCase<U, Q, T>>,
        session_keys: Arc<SessionKeys>,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            quotas,
            session_keys,
        }
    }

    /// Finishes a login for an identity the OAuth provider already verified.
    pub async fn complete_oauth_login(&self, identity: OAuthIdentity) -> UseCaseResult<LoginDto> {
        let email = identity.email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(AccountError::InvalidIdentity);
        }

        let existing = self.user_repo.find_by_email(&email).await.map_err(|err| {
            error!(%email, db_error = ?err, "accounts: failed to look up user by email");
            AccountError::Internal(err)
        })?;

        let user = match existing {
            Some(mut user) => {
                let name = identity.name.or_else(|| user.name.clone());
                let avatar_url = identity.avatar_url.or_else(|| user.avatar_url.clone());
                if name != user.name || avatar_url != user.avatar_url {
                    user.name = name;
                    user.avatar_url = avatar_url;
                    user = self.user_repo.update(user).await.map_err(|err| {
                        error!(%email, db_error = ?err, "accounts: failed to refresh profile");
                        AccountError::Internal(err)
                    })?;
                }
                user
            }
            None => {
                let user = self
                    .user_repo
                    .create(InsertUserEntity {
                        email: email.clone(),
                        name: identity.name,
                        avatar_url: identity.avatar_url,
                        subscription_tier: SubscriptionTier::Free.as_str().to_string(),
                        subscription_status: SubscriptionStatus::Active.as_str().to_string(),
                        subscription_expires_at: None,
                    })
                    .await
                    .map_err(|err| {
                        error!(%email, db_error = ?err, "accounts: failed to create user");
                        AccountError::Internal(err)
                    })?;
                info!(user_id = %user.id, "accounts: user created on first login");
                user
            }
        };

        if let Err(err) = self.quotas.get_or_create_quota(user.id).await {
            warn!(user_id = %user.id, error = ?err, "accounts: default quota not ensured at login");
        }

        let token = self
            .session_keys
            .issue(&user)
            .map_err(|err| AccountError::Internal(anyhow::anyhow!("{err}")))?;

        info!(user_id = %user.id, tier = %user.subscription_tier, "accounts: login completed");
        Ok(LoginDto {
            token,
            user: user.into(),
        })
    }

    pub async fn get_profile(&self, user_id: Uuid) -> UseCaseResult<ProfileDto> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "accounts: failed to load profile");
                AccountError::Internal(err)
            })?
            .ok_or(AccountError::UserNotFound)?;

        let subscription = best_effort(
            "subscription",
            user_id,
            self.subscription_repo.find_active_by_user_id(user_id),
        )
        .await
        .flatten();
        let quota = best_effort("quota", user_id, self.quotas.get_or_create_quota(user_id)).await;

        Ok(ProfileDto {
            user: user.into(),
            subscription: subscription.map(Into::into),
            quota: quota.map(Into::into),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::{
            user_quotas::{InsertUserQuotaEntity, UserQuotaEntity},
            users::UserEntity,
        },
        repositories::{
            subscriptions::MockSubscriptionRepository, topology_counter::MockTopologyCounter,
            user_quotas::MockUserQuotaRepository, users::MockUserRepository,
        },
    };
    use mockall::predicate::eq;

    type TestUseCase = AccountUseCase<
        MockUserRepository,
        MockSubscriptionRepository,
        MockUserQuotaRepository,
        MockTopologyCounter,
    >;

    fn keys() -> Arc<SessionKeys> {
        Arc::new(SessionKeys::new("account-test-secret", 3600))
    }

    fn build(
        user_repo: MockUserRepository,
        subscription_repo: MockSubscriptionRepository,
        quota_repo: MockUserQuotaRepository,
    ) -> TestUseCase {
        let user_repo = Arc::new(user_repo);
        let quotas = QuotaUseCase::new(
            Arc::clone(&user_repo),
            Arc::new(quota_repo),
            Arc::new(MockTopologyCounter::new()),
        );
        AccountUseCase::new(
            user_repo,
            Arc::new(subscription_repo),
            Arc::new(quotas),
            keys(),
        )
    }

    fn user_from(insert: InsertUserEntity) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: Uuid::new_v4(),
            email: insert.email,
            name: insert.name,
            avatar_url: insert.avatar_url,
            subscription_tier: insert.subscription_tier,
            subscription_status: insert.subscription_status,
            subscription_expires_at: insert.subscription_expires_at,
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

    #[tokio::test]
    async fn first_login_creates_free_user_and_issues_token() {
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        user_repo
            .expect_find_by_email()
            .with(eq("new@example.com"))
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_create()
            .withf(|user| user.subscription_tier == "free" && user.subscription_status == "active")
            .times(1)
            .returning(|user| Box::pin(async move { Ok(user_from(user)) }));
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        quota_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        quota_repo
            .expect_insert_if_absent()
            .times(1)
            .returning(|quota| Box::pin(async move { Ok(quota_from(quota)) }));

        let login = build(user_repo, MockSubscriptionRepository::new(), quota_repo)
            .complete_oauth_login(OAuthIdentity {
                email: "  New@Example.com ".to_string(),
                name: Some("New User".to_string()),
                avatar_url: None,
            })
            .await
            .unwrap();

        assert_eq!(login.user.email, "new@example.com");
        assert_eq!(login.user.subscription_tier, "free");

        let claims = keys().validate(&login.token).unwrap();
        assert_eq!(claims.sub, login.user.id.to_string());
        assert_eq!(claims.tier, "free");
    }

    #[tokio::test]
    async fn quota_failure_does_not_fail_login() {
        let mut user_repo = MockUserRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        user_repo.expect_find_by_email().returning(|email| {
            let user = user_from(InsertUserEntity {
                email: email.to_string(),
                name: Some("Known".to_string()),
                avatar_url: None,
                subscription_tier: "premium".to_string(),
                subscription_status: "active".to_string(),
                subscription_expires_at: None,
            });
            Box::pin(async move { Ok(Some(user)) })
        });
        user_repo.expect_update().never();
        quota_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("quota store down")) }));

        let login = build(user_repo, MockSubscriptionRepository::new(), quota_repo)
            .complete_oauth_login(OAuthIdentity {
                email: "known@example.com".to_string(),
                name: None,
                avatar_url: None,
            })
            .await
            .unwrap();

        assert_eq!(login.user.subscription_tier, "premium");
    }

    #[tokio::test]
    async fn blank_email_is_rejected() {
        let err = build(
            MockUserRepository::new(),
            MockSubscriptionRepository::new(),
            MockUserQuotaRepository::new(),
        )
        .complete_oauth_login(OAuthIdentity {
            email: "   ".to_string(),
            name: None,
            avatar_url: None,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AccountError::InvalidIdentity));
    }

    #[tokio::test]
    async fn profile_survives_failing_side_reads() {
        let user_id = Uuid::new_v4();
        let mut user_repo = MockUserRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut quota_repo = MockUserQuotaRepository::new();

        user_repo
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| {
                let mut user = user_from(InsertUserEntity {
                    email: "me@example.com".to_string(),
                    name: None,
                    avatar_url: None,
                    subscription_tier: "free".to_string(),
                    subscription_status: "active".to_string(),
                    subscription_expires_at: None,
                });
                user.id = user_id;
                Box::pin(async move { Ok(Some(user)) })
            });
        subscription_repo
            .expect_find_active_by_user_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("timeout")) }));
        quota_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("timeout")) }));

        let profile = build(user_repo, subscription_repo, quota_repo)
            .get_profile(user_id)
            .await
            .unwrap();

        assert_eq!(profile.user.id, user_id);
        assert!(profile.subscription.is_none());
        assert!(profile.quota.is_none());
    }

    #[tokio::test]
    async fn profile_for_missing_user_is_not_found() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let err = build(
            user_repo,
            MockSubscriptionRepository::new(),
            MockUserQuotaRepository::new(),
        )
        .get_profile(Uuid::new_v4())
        .await
        .unwrap_err();

        assert!(matches!(err, AccountError::UserNotFound));
    }
}
