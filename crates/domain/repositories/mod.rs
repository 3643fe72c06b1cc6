pub mod payments;
pub mod subscriptions;
pub mod topology_counter;
pub mod user_quotas;
pub mod users;
