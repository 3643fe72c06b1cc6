pub mod payments;
pub mod subscriptions;
pub mod user_quotas;
pub mod users;
