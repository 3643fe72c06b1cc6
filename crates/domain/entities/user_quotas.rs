use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_quotas;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_quotas)]
pub struct UserQuotaEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub max_topologies: i32,
    pub used_topologies: i32,
    pub max_simulations_per_day: i32,
    pub used_simulations_today: i32,
    pub last_simulation_reset_date: DateTime<Utc>,
    pub can_use_3d_rendering: bool,
    pub can_use_ai_prediction: bool,
    pub can_use_advanced_security: bool,
    pub can_access_api: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full quota row keyed by `user_id`; used for first creation and for the
/// overwrite that follows a tier change.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = user_quotas)]
pub struct InsertUserQuotaEntity {
    pub user_id: Uuid,
    pub max_topologies: i32,
    pub used_topologies: i32,
    pub max_simulations_per_day: i32,
    pub used_simulations_today: i32,
    pub last_simulation_reset_date: DateTime<Utc>,
    pub can_use_3d_rendering: bool,
    pub can_use_ai_prediction: bool,
    pub can_use_advanced_security: bool,
    pub can_access_api: bool,
}
