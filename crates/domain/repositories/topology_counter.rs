use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// Counts stored topologies. `None` counts the anonymous pool.
#[async_trait]
#[automock]
pub trait TopologyCounter {
    async fn count_by_user_id(&self, user_id: Option<Uuid>) -> Result<i64>;
}
