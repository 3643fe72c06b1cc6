use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub session: Session,
    pub frontend: Frontend,
    pub stripe: Option<StripeConfig>,
    pub paypal: Option<PayPalConfig>,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub jwt_secret: String,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Frontend {
    pub base_url: url::Url,
}

impl Frontend {
    pub fn checkout_success_url(&self) -> String {
        self.join("/billing/success")
    }

    pub fn checkout_cancel_url(&self) -> String {
        self.join("/billing/cancel")
    }

    fn join(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.base_url.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub premium_price_id: String,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub premium_plan_id: String,
}
