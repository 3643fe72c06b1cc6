use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update, upsert::excluded};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::user_quotas},
};
use domain::{
    entities::user_quotas::{InsertUserQuotaEntity, UserQuotaEntity},
    repositories::user_quotas::UserQuotaRepository,
};

pub struct UserQuotaPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserQuotaPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserQuotaRepository for UserQuotaPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = user_quotas::table
            .filter(user_quotas::user_id.eq(user_id))
            .select(UserQuotaEntity::as_select())
            .first::<UserQuotaEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert_if_absent(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<UserQuotaEntity, diesel::result::Error, _>(|conn| {
            insert_into(user_quotas::table)
                .values(&quota)
                .on_conflict(user_quotas::user_id)
                .do_nothing()
                .execute(conn)?;

            user_quotas::table
                .filter(user_quotas::user_id.eq(quota.user_id))
                .select(UserQuotaEntity::as_select())
                .first::<UserQuotaEntity>(conn)
        })?;

        Ok(result)
    }

    async fn upsert(&self, quota: InsertUserQuotaEntity) -> Result<UserQuotaEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(user_quotas::table)
            .values(&quota)
            .on_conflict(user_quotas::user_id)
            .do_update()
            .set((
                user_quotas::max_topologies.eq(excluded(user_quotas::max_topologies)),
                user_quotas::used_topologies.eq(excluded(user_quotas::used_topologies)),
                user_quotas::max_simulations_per_day
                    .eq(excluded(user_quotas::max_simulations_per_day)),
                user_quotas::used_simulations_today
                    .eq(excluded(user_quotas::used_simulations_today)),
                user_quotas::last_simulation_reset_date
                    .eq(excluded(user_quotas::last_simulation_reset_date)),
                user_quotas::can_use_3d_rendering.eq(excluded(user_quotas::can_use_3d_rendering)),
                user_quotas::can_use_ai_prediction
                    .eq(excluded(user_quotas::can_use_ai_prediction)),
                user_quotas::can_use_advanced_security
                    .eq(excluded(user_quotas::can_use_advanced_security)),
                user_quotas::can_access_api.eq(excluded(user_quotas::can_access_api)),
                user_quotas::updated_at.eq(Utc::now()),
            ))
            .returning(UserQuotaEntity::as_returning())
            .get_result::<UserQuotaEntity>(&mut conn)?;

        Ok(result)
    }

    async fn reset_daily_simulations(
        &self,
        user_id: Uuid,
        day_start: DateTime<Utc>,
    ) -> Result<Option<UserQuotaEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Conditional on the stored date so concurrent resets collapse into one.
        let result = update(
            user_quotas::table
                .filter(user_quotas::user_id.eq(user_id))
                .filter(user_quotas::last_simulation_reset_date.lt(day_start)),
        )
        .set((
            user_quotas::used_simulations_today.eq(0),
            user_quotas::last_simulation_reset_date.eq(day_start),
            user_quotas::updated_at.eq(Utc::now()),
        ))
        .returning(UserQuotaEntity::as_returning())
        .get_result::<UserQuotaEntity>(&mut conn)
        .optional()?;

        Ok(result)
    }

    async fn record_topology_usage(&self, user_id: Uuid, used: i32) -> Result<UserQuotaEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(user_quotas::table.filter(user_quotas::user_id.eq(user_id)))
            .set((
                user_quotas::used_topologies.eq(used),
                user_quotas::updated_at.eq(Utc::now()),
            ))
            .returning(UserQuotaEntity::as_returning())
            .get_result::<UserQuotaEntity>(&mut conn)?;

        Ok(result)
    }

    async fn try_consume_simulation(&self, user_id: Uuid) -> Result<Option<UserQuotaEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(
            user_quotas::table
                .filter(user_quotas::user_id.eq(user_id))
                .filter(user_quotas::used_simulations_today.lt(user_quotas::max_simulations_per_day)),
        )
        .set((
            user_quotas::used_simulations_today.eq(user_quotas::used_simulations_today + 1),
            user_quotas::updated_at.eq(Utc::now()),
        ))
        .returning(UserQuotaEntity::as_returning())
        .get_result::<UserQuotaEntity>(&mut conn)
        .optional()?;

        Ok(result)
    }
}
