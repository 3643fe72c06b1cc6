use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::repositories::topology_counter::TopologyCounter,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::topologies},
};

pub struct TopologyCounterPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TopologyCounterPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TopologyCounter for TopologyCounterPostgres {
    async fn count_by_user_id(&self, user_id: Option<Uuid>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = match user_id {
            Some(user_id) => topologies::table
                .filter(topologies::user_id.eq(user_id))
                .count()
                .get_result::<i64>(&mut conn)?,
            None => topologies::table
                .filter(topologies::user_id.is_null())
                .count()
                .get_result::<i64>(&mut conn)?,
        };

        Ok(count)
    }
}
