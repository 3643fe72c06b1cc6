use anyhow::{Context, Result};
use backend::axum_http::http_serve;
use backend::config::config_loader;
use crates::infra::db::postgres::postgres_connection;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("entitlements backend exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = config_loader::load().context("invalid configuration")?;
    info!(
        stage = ?config.stage,
        stripe = config.stripe.is_some(),
        paypal = config.paypal.is_some(),
        "config: loaded"
    );

    let db_pool = postgres_connection::establish_connection(
        &config.database.url,
        config.database.max_connections,
    )?;
    info!(
        max_connections = config.database.max_connections,
        "postgres: pool established"
    );

    http_serve::start(Arc::new(config), Arc::new(db_pool)).await
}
