use std::env;

#[derive(Clone, Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: Option<String>) -> Self {
        match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub(crate) default_filter: String,
    pub(crate) format: LogFormat,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        Self {
            service_context: ServiceContext {
                service_name: env_string("SERVICE_NAME").unwrap_or_else(|| component.clone()),
                environment: env_string("STAGE").unwrap_or_else(|| "unknown".to_string()),
                component,
            },
            default_filter: env_string("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(env_string("LOG_FORMAT")),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
