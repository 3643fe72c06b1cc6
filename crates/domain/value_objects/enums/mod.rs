pub mod features;
pub mod payment_providers;
pub mod payment_statuses;
pub mod quota_kinds;
pub mod subscription_statuses;
pub mod subscription_tiers;
