use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::user_quotas::{InsertUserQuotaEntity, UserQuotaEntity};
use crate::domain::value_objects::enums::{
    features::Feature, quota_kinds::QuotaKind, subscription_tiers::SubscriptionTier,
};

/// Sentinel stored for "unlimited" limits.
pub const UNLIMITED: i32 = 999_999;

/// Hard cap for anonymous topologies, checked against the anonymous pool.
pub const DEMO_TOPOLOGY_LIMIT: i32 = 3;

/// Limits and capability flags a tier starts with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaDefaults {
    pub max_topologies: i32,
    pub max_simulations_per_day: i32,
    pub can_use_3d_rendering: bool,
    pub can_use_ai_prediction: bool,
    pub can_use_advanced_security: bool,
    pub can_access_api: bool,
}

impl QuotaDefaults {
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Demo => Self::demo(),
            SubscriptionTier::Free => Self::free(),
            SubscriptionTier::Premium => Self::premium(),
        }
    }

    pub fn demo() -> Self {
        Self {
            max_topologies: DEMO_TOPOLOGY_LIMIT,
            max_simulations_per_day: 10,
            can_use_3d_rendering: false,
            can_use_ai_prediction: false,
            can_use_advanced_security: false,
            can_access_api: false,
        }
    }

    pub fn free() -> Self {
        Self {
            max_topologies: UNLIMITED,
            max_simulations_per_day: 100,
            can_use_3d_rendering: true,
            can_use_ai_prediction: true,
            can_use_advanced_security: true,
            can_access_api: false,
        }
    }

    pub fn premium() -> Self {
        Self {
            max_topologies: UNLIMITED,
            max_simulations_per_day: UNLIMITED,
            can_use_3d_rendering: true,
            can_use_ai_prediction: true,
            can_use_advanced_security: true,
            can_access_api: true,
        }
    }

    /// Fresh ledger row: usage counters at zero, reset date at the start of `now`'s day.
    pub fn into_quota(self, user_id: Uuid, now: DateTime<Utc>) -> InsertUserQuotaEntity {
        InsertUserQuotaEntity {
            user_id,
            max_topologies: self.max_topologies,
            used_topologies: 0,
            max_simulations_per_day: self.max_simulations_per_day,
            used_simulations_today: 0,
            last_simulation_reset_date: start_of_day(now),
            can_use_3d_rendering: self.can_use_3d_rendering,
            can_use_ai_prediction: self.can_use_ai_prediction,
            can_use_advanced_security: self.can_use_advanced_security,
            can_access_api: self.can_access_api,
        }
    }
}

/// Truncates to 00:00:00 UTC of the same calendar day.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

impl UserQuotaEntity {
    pub fn needs_daily_reset(&self, now: DateTime<Utc>) -> bool {
        self.last_simulation_reset_date < start_of_day(now)
    }

    pub fn allows_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Rendering3d => self.can_use_3d_rendering,
            Feature::AiPrediction => self.can_use_ai_prediction,
            Feature::AdvancedSecurity => self.can_use_advanced_security,
            Feature::ApiAccess => self.can_access_api,
        }
    }
}

/// Result of a topology quota check.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TopologyQuotaCheck {
    pub allowed: bool,
    pub used: i32,
    pub max: i32,
}

impl TopologyQuotaCheck {
    pub fn new(used: i32, max: i32) -> Self {
        Self {
            allowed: used < max,
            used,
            max,
        }
    }
}

/// Structured "quota exceeded" signal rendered at the HTTP edge.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct QuotaExceeded {
    pub kind: QuotaKind,
    pub used: Option<i32>,
    pub max: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserQuotaDto {
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

impl From<UserQuotaEntity> for UserQuotaDto {
    fn from(value: UserQuotaEntity) -> Self {
        Self {
            max_topologies: value.max_topologies,
            used_topologies: value.used_topologies,
            max_simulations_per_day: value.max_simulations_per_day,
            used_simulations_today: value.used_simulations_today,
            last_simulation_reset_date: value.last_simulation_reset_date,
            can_use_3d_rendering: value.can_use_3d_rendering,
            can_use_ai_prediction: value.can_use_ai_prediction,
            can_use_advanced_security: value.can_use_advanced_security,
            can_access_api: value.can_access_api,
        }
    }
}
