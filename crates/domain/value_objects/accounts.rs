use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::users::UserEntity;
use crate::domain::value_objects::{quotas::UserQuotaDto, subscriptions::SubscriptionDto};

/// Identity returned by an OAuth provider after the code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthIdentity {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub subscription_tier: String,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl From<UserEntity> for UserDto {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            name: value.name,
            avatar_url: value.avatar_url,
            subscription_tier: value.subscription_tier,
            subscription_status: value.subscription_status,
            subscription_expires_at: value.subscription_expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginDto {
    pub token: String,
    pub user: UserDto,
}

/// `GET /auth/me` payload. Subscription and quota are best effort.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDto {
    pub user: UserDto,
    pub subscription: Option<SubscriptionDto>,
    pub quota: Option<UserQuotaDto>,
}
