//! Provider efficiency table.
//!
//! Each provider is keyed by the name that appears in usage records and
//! carries an efficiency coefficient in (0, 1], where 1.0 is the most
//! cost-efficient reference provider, plus the advice shown when switching
//! away from it is recommended.
//!
//! # Example
//!
//! ```toml
//! [providers]
//! default_coefficient = 0.7
//!
//! [providers.gemini]
//! coefficient = 1.0
//! recommendation = "Already using the most cost-effective provider"
//!
//! [providers.openai]
//! coefficient = 0.6
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;

const GENERIC_RECOMMENDATION: &str = "Review usage patterns to optimize model selection";

/// Efficiency settings for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ProviderEfficiency {
    /// Relative cost-effectiveness, 0 < coefficient <= 1.
    pub coefficient: f64,

    /// Advice attached to optimization recommendations for this provider.
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Provider efficiency coefficients keyed by provider name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub struct ProviderEfficiencyTable {
    /// Coefficient for providers not listed in the table. Default: 0.7.
    #[serde(default = "default_coefficient")]
    pub default_coefficient: f64,

    /// Per-provider settings keyed by provider name.
    #[serde(flatten)]
    pub providers: HashMap<String, ProviderEfficiency>,
}

impl Default for ProviderEfficiencyTable {
    fn default() -> Self {
        let providers = [
            (
                "gemini",
                1.0,
                "Already using the most cost-effective provider, consider expanding usage",
            ),
            (
                "claude",
                0.85,
                "Use Claude Haiku for quick tasks and reserve Opus for complex reasoning",
            ),
            (
                "grok",
                0.75,
                "Good balance of cost and performance, consider it for real-time data tasks",
            ),
            (
                "openai",
                0.6,
                "Use GPT-3.5-Turbo or GPT-4o-mini for simpler tasks, or switch to Gemini for cost savings",
            ),
        ]
        .into_iter()
        .map(|(name, coefficient, advice)| {
            (
                name.to_string(),
                ProviderEfficiency {
                    coefficient,
                    recommendation: Some(advice.to_string()),
                },
            )
        })
        .collect();

        Self {
            default_coefficient: default_coefficient(),
            providers,
        }
    }
}

fn default_coefficient() -> f64 {
    0.7
}

impl ProviderEfficiencyTable {
    /// Coefficient for a provider, falling back to `default_coefficient`.
    pub fn coefficient(&self, provider: &str) -> f64 {
        self.providers
            .get(provider)
            .map(|p| p.coefficient)
            .unwrap_or(self.default_coefficient)
    }

    /// The most efficient coefficient available. Never below the 1.0
    /// reference unless every configured provider is below it.
    pub fn best_coefficient(&self) -> f64 {
        self.providers
            .values()
            .map(|p| p.coefficient)
            .fold(self.default_coefficient, f64::max)
    }

    pub fn recommendation(&self, provider: &str) -> &str {
        self.providers
            .get(provider)
            .and_then(|p| p.recommendation.as_deref())
            .unwrap_or(GENERIC_RECOMMENDATION)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |c: f64| c > 0.0 && c <= 1.0;
        if !in_range(self.default_coefficient) {
            return Err(ConfigError::Validation(format!(
                "providers.default_coefficient must be in (0, 1] (got {})",
                self.default_coefficient
            )));
        }
        for (name, provider) in &self.providers {
            if !in_range(provider.coefficient) {
                return Err(ConfigError::Validation(format!(
                    "providers.{name}.coefficient must be in (0, 1] (got {})",
                    provider.coefficient
                )));
            }
        }
        Ok(())
    }
}
