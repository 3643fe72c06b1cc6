mod config;

use anyhow::Result;
use config::{LogFormat, ObservabilityConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber. `RUST_LOG` wins over `LOG_LEVEL`;
/// `LOG_FORMAT=json` switches to one JSON object per event.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let (pretty, json) = match config.format {
        LogFormat::Pretty => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339()),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(pretty)
        .with(json)
        .with(env_filter)
        .try_init()?;

    info!(
        service = %config.service_context.service_name,
        environment = %config.service_context.environment,
        component = %config.service_context.component,
        format = ?config.format,
        "observability: tracing initialised"
    );

    Ok(())
}
