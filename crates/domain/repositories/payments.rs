use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payments::{InsertPaymentEntity, PaymentEntity};
use crate::domain::value_objects::enums::payment_providers::PaymentProvider;

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn create(&self, payment: InsertPaymentEntity) -> Result<PaymentEntity>;

    async fn find_by_provider_payment_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<PaymentEntity>>;

    /// Newest first.
    async fn list_by_user_id(&self, user_id: Uuid) -> Result<Vec<PaymentEntity>>;
}
