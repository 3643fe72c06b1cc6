use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};
use crate::domain::value_objects::enums::payment_providers::PaymentProvider;

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// `None` when a row with the same provider reference already exists.
    async fn create_if_absent(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Oldest first.
    async fn find_by_provider_subscription_id(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn update(&self, subscription: SubscriptionEntity) -> Result<SubscriptionEntity>;

    async fn find_active_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;
}
