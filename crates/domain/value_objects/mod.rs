pub mod accounts;
pub mod enums;
pub mod quotas;
pub mod subscriptions;
