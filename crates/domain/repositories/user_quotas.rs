use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::user_quotas::{InsertUserQuotaEntity, UserQuotaEntity};

/// Per-user quota ledger. Every mutating call is a single atomic statement
/// against the row keyed by `user_id`.
#[async_trait]
#[automock]
pub trait UserQuotaRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>>;

    /// Inserts `quota` unless a row exists; returns whichever row is stored.
    async fn insert_if_absent(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity>;

    /// Inserts `quota` or overwrites every column of the existing row.
    async fn upsert(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity>;

    /// Zeroes the daily counter only when the stored reset date is before
    /// `day_start`. `None` when nothing changed.
    async fn reset_daily_simulations(
        &self,
        user_id: Uuid,
        day_start: DateTime<Utc>,
    ) -> Result<Option<UserQuotaEntity>>;

    async fn record_topology_usage(&self, user_id: Uuid, used: i32) -> Result<UserQuotaEntity>;

    /// Increments the daily counter only while it is below the maximum.
    /// `None` when the limit is already reached.
    async fn try_consume_simulation(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>>;
}
