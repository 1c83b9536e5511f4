use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validators::{validate_amount, validate_fraction};

/// Budget period for spending limits
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Daily => "daily",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
        }
    }
}

/// A spending budget configured for the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Budget {
    /// Budget limit in dollars
    #[validate(custom(function = "validate_amount"))]
    pub amount: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
    /// Amount already spent in the current period (dollars)
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub spent: f64,
    /// Fraction of `amount` at which alerts fire (e.g. 0.8 = 80%)
    #[serde(default = "default_alert_threshold")]
    #[validate(custom(function = "validate_fraction"))]
    pub alert_threshold: f64,
}

fn default_alert_threshold() -> f64 {
    0.8
}

impl Budget {
    /// Fraction of the budget already spent. `None` for a zero budget.
    pub fn utilization(&self) -> Option<f64> {
        (self.amount > 0.0).then(|| self.spent / self.amount)
    }

    /// Whether spend has crossed the alert threshold.
    pub fn is_alerting(&self) -> bool {
        self.utilization()
            .is_some_and(|u| u >= self.alert_threshold)
    }
}

/// Configuration-completeness signals used by the risk and compliance scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceSignals {
    #[serde(default)]
    pub api_key_count: u32,
    #[serde(default)]
    pub alert_rule_count: u32,
    #[serde(default)]
    pub team_size: u32,
    /// Cost-threshold-exceeded alerts fired during the scoring window
    #[serde(default)]
    pub threshold_alerts_fired: u32,
    /// Whole days since the most recent usage record; `None` if never used
    #[serde(default)]
    pub days_since_last_usage: Option<i64>,
}
