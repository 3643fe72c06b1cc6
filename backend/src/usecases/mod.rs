pub mod accounts;
pub mod payment_gateways;
pub mod payments;
pub mod quota_gate;
pub mod quotas;
pub mod webhooks;
