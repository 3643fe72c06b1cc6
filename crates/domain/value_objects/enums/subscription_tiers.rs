use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Entitlement level of a user. Anonymous traffic is always `Demo`.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Demo,
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Demo => "demo",
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
        }
    }

    /// Strict parse, `None` for anything that is not a known tier.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "demo" => Some(SubscriptionTier::Demo),
            "free" => Some(SubscriptionTier::Free),
            "premium" => Some(SubscriptionTier::Premium),
            _ => None,
        }
    }

    /// Lenient parse used for stored tiers and session claims.
    ///
    /// Intentional fail-open: an unrecognised value resolves to `Free` so a
    /// bad row or migration never locks a paying user out of the product.
    pub fn from_str(value: &str) -> Self {
        Self::parse(value).unwrap_or(SubscriptionTier::Free)
    }

    pub fn rank(&self) -> u8 {
        match self {
            SubscriptionTier::Demo => 0,
            SubscriptionTier::Free => 1,
            SubscriptionTier::Premium => 2,
        }
    }

    pub fn satisfies(&self, required: SubscriptionTier) -> bool {
        self.rank() >= required.rank()
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
