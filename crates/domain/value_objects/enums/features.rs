use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Capabilities gated by the quota's boolean flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Feature {
    #[serde(rename = "3d_rendering")]
    Rendering3d,
    #[serde(rename = "ai_prediction")]
    AiPrediction,
    #[serde(rename = "advanced_security")]
    AdvancedSecurity,
    #[serde(rename = "api_access")]
    ApiAccess,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Rendering3d => "3d_rendering",
            Feature::AiPrediction => "ai_prediction",
            Feature::AdvancedSecurity => "advanced_security",
            Feature::ApiAccess => "api_access",
        }
    }

    /// `None` means the name is not a gated capability.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "3d_rendering" => Some(Feature::Rendering3d),
            "ai_prediction" => Some(Feature::AiPrediction),
            "advanced_security" => Some(Feature::AdvancedSecurity),
            "api_access" => Some(Feature::ApiAccess),
            _ => None,
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
