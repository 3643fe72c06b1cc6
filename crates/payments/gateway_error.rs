use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider is not configured")]
    NotConfigured,
    #[error("webhook signature is invalid")]
    InvalidSignature,
    #[error("webhook payload is malformed: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Request(#[from] anyhow::Error),
}
