use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        payments::{InsertPaymentEntity, PaymentEntity},
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        user_quotas::{InsertUserQuotaEntity, UserQuotaEntity},
        users::{InsertUserEntity, UserEntity},
    },
    repositories::{
        payments::PaymentRepository, subscriptions::SubscriptionRepository,
        topology_counter::TopologyCounter, user_quotas::UserQuotaRepository,
        users::UserRepository,
    },
    value_objects::enums::{
        payment_providers::PaymentProvider, subscription_statuses::SubscriptionStatus,
    },
};

/// In-process store implementing every repository trait with the same
/// uniqueness rules as the Postgres schema. Used by tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, UserEntity>>>,
    quotas: Arc<RwLock<HashMap<Uuid, UserQuotaEntity>>>,
    subscriptions: Arc<RwLock<Vec<SubscriptionEntity>>>,
    payments: Arc<RwLock<Vec<PaymentEntity>>>,
    topologies: Arc<RwLock<Vec<Option<Uuid>>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn add_topology(&self, user_id: Option<Uuid>) {
        self.topologies.write().await.push(user_id);
    }

    pub async fn subscriptions(&self) -> Vec<SubscriptionEntity> {
        self.subscriptions.read().await.clone()
    }

    pub async fn payments(&self) -> Vec<PaymentEntity> {
        self.payments.read().await.clone()
    }

    /// Rewrites the stored reset date, for simulating a day boundary.
    pub async fn backdate_simulation_reset(&self, user_id: Uuid, at: DateTime<Utc>) {
        if let Some(quota) = self.quotas.write().await.get_mut(&user_id) {
            quota.last_simulation_reset_date = at;
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("memory store marked unavailable");
        }
        Ok(())
    }

    fn quota_from_insert(quota: InsertUserQuotaEntity, id: Uuid) -> UserQuotaEntity {
        let now = Utc::now();
        UserQuotaEntity {
            id,
            user_id: quota.user_id,
            max_topologies: quota.max_topologies,
            used_topologies: quota.used_topologies,
            max_simulations_per_day: quota.max_simulations_per_day,
            used_simulations_today: quota.used_simulations_today,
            last_simulation_reset_date: quota.last_simulation_reset_date,
            can_use_3d_rendering: quota.can_use_3d_rendering,
            can_use_ai_prediction: quota.can_use_ai_prediction,
            can_use_advanced_security: quota.can_use_advanced_security,
            can_access_api: quota.can_access_api,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        self.ensure_available()?;
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        self.ensure_available()?;
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn create(&self, user: InsertUserEntity) -> Result<UserEntity> {
        self.ensure_available()?;
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }

        let now = Utc::now();
        let entity = UserEntity {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            subscription_tier: user.subscription_tier,
            subscription_status: user.subscription_status,
            subscription_expires_at: user.subscription_expires_at,
            created_at: now,
            updated_at: now,
        };
        users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, mut user: UserEntity) -> Result<UserEntity> {
        self.ensure_available()?;
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user.id) else {
            bail!("user {} not found", user.id);
        };
        user.updated_at = Utc::now();
        *stored = user.clone();
        Ok(user)
    }
}

#[async_trait]
impl UserQuotaRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>> {
        self.ensure_available()?;
        Ok(self.quotas.read().await.get(&user_id).cloned())
    }

    async fn insert_if_absent(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity> {
        self.ensure_available()?;
        let mut quotas = self.quotas.write().await;
        let stored = quotas
            .entry(quota.user_id)
            .or_insert_with(|| Self::quota_from_insert(quota, Uuid::new_v4()));
        Ok(stored.clone())
    }

    async fn upsert(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity> {
        self.ensure_available()?;
        let mut quotas = self.quotas.write().await;
        let entity = match quotas.get(&quota.user_id) {
            Some(existing) => UserQuotaEntity {
                created_at: existing.created_at,
                ..Self::quota_from_insert(quota, existing.id)
            },
            None => Self::quota_from_insert(quota, Uuid::new_v4()),
        };
        quotas.insert(entity.user_id, entity.clone());
        Ok(entity)
    }

    async fn reset_daily_simulations(
        &self,
        user_id: Uuid,
        day_start: DateTime<Utc>,
    ) -> Result<Option<UserQuotaEntity>> {
        self.ensure_available()?;
        let mut quotas = self.quotas.write().await;
        match quotas.get_mut(&user_id) {
            Some(quota) if quota.last_simulation_reset_date < day_start => {
                quota.used_simulations_today = 0;
                quota.last_simulation_reset_date = day_start;
                quota.updated_at = Utc::now();
                Ok(Some(quota.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_topology_usage(&self, user_id: Uuid, used: i32) -> Result<UserQuotaEntity> {
        self.ensure_available()?;
        let mut quotas = self.quotas.write().await;
        let Some(quota) = quotas.get_mut(&user_id) else {
            bail!("quota for user {user_id} not found");
        };
        quota.used_topologies = used;
        quota.updated_at = Utc::now();
        Ok(quota.clone())
    }

    async fn try_consume_simulation(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>> {
        self.ensure_available()?;
        let mut quotas = self.quotas.write().await;
        let Some(quota) = quotas.get_mut(&user_id) else {
            bail!("quota for user {user_id} not found");
        };
        if quota.used_simulations_today >= quota.max_simulations_per_day {
            return Ok(None);
        }
        quota.used_simulations_today += 1;
        quota.updated_at = Utc::now();
        Ok(Some(quota.clone()))
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn create_if_absent(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        self.ensure_available()?;
        let mut subscriptions = self.subscriptions.write().await;

        if subscription.payment_provider.is_some() && subscription.payment_subscription_id.is_some()
        {
            let exists = subscriptions.iter().any(|existing| {
                existing.payment_provider == subscription.payment_provider
                    && existing.payment_subscription_id == subscription.payment_subscription_id
            });
            if exists {
                return Ok(None);
            }
        }

        let now = Utc::now();
        let entity = SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            tier: subscription.tier,
            status: subscription.status,
            payment_provider: subscription.payment_provider,
            payment_subscription_id: subscription.payment_subscription_id,
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            created_at: now,
            updated_at: now,
        };
        subscriptions.push(entity.clone());
        Ok(Some(entity))
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> Result<Vec<SubscriptionEntity>> {
        self.ensure_available()?;
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .iter()
            .filter(|subscription| {
                subscription.payment_provider.as_deref() == Some(provider.as_str())
                    && subscription.payment_subscription_id.as_deref()
                        == Some(provider_subscription_id)
            })
            .cloned()
            .collect())
    }

    async fn update(&self, mut subscription: SubscriptionEntity) -> Result<SubscriptionEntity> {
        self.ensure_available()?;
        let mut subscriptions = self.subscriptions.write().await;
        let Some(stored) = subscriptions
            .iter_mut()
            .find(|existing| existing.id == subscription.id)
        else {
            bail!("subscription {} not found", subscription.id);
        };
        subscription.updated_at = Utc::now();
        *stored = subscription.clone();
        Ok(subscription)
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        self.ensure_available()?;
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .iter()
            .rev()
            .find(|subscription| {
                subscription.user_id == user_id
                    && subscription.status == SubscriptionStatus::Active.as_str()
            })
            .cloned())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn create(&self, payment: InsertPaymentEntity) -> Result<PaymentEntity> {
        self.ensure_available()?;
        let mut payments = self.payments.write().await;
        if payments.iter().any(|existing| {
            existing.payment_provider == payment.payment_provider
                && existing.payment_provider_id == payment.payment_provider_id
        }) {
            bail!("duplicate key value violates unique constraint \"payments_provider_ref_key\"");
        }

        let now = Utc::now();
        let entity = PaymentEntity {
            id: Uuid::new_v4(),
            user_id: payment.user_id,
            subscription_id: payment.subscription_id,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            payment_provider: payment.payment_provider,
            payment_provider_id: payment.payment_provider_id,
            status: payment.status,
            metadata: payment.metadata,
            created_at: now,
            updated_at: now,
        };
        payments.push(entity.clone());
        Ok(entity)
    }

    async fn find_by_provider_payment_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEntity>> {
        self.ensure_available()?;
        let payments = self.payments.read().await;
        Ok(payments
            .iter()
            .find(|payment| {
                payment.payment_provider == provider.as_str()
                    && payment.payment_provider_id == provider_payment_id
            })
            .cloned())
    }

    async fn list_by_user_id(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>> {
        self.ensure_available()?;
        let payments = self.payments.read().await;
        Ok(payments
            .iter()
            .rev()
            .filter(|payment| payment.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TopologyCounter for MemoryStore {
    async fn count_by_user_id(&self, user_id: Option<Uuid>) -> Result<i64> {
        self.ensure_available()?;
        let topologies = self.topologies.read().await;
        Ok(topologies.iter().filter(|owner| **owner == user_id).count() as i64)
    }
}
