use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validators::validate_amount;

/// Usage record for a single AI request.
///
/// Costs are in dollars. Records are supplied by the usage data source and
/// are never mutated by the analytics layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    #[validate(length(min = 1, max = 255))]
    pub provider: String,
    #[validate(length(min = 1, max = 255))]
    pub model: String,
    /// Cost of the request in dollars
    #[validate(custom(function = "validate_amount"))]
    pub cost: f64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One calendar day of aggregated usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    /// Total cost in dollars
    pub cost: f64,
    pub tokens: u64,
    pub request_count: u64,
}

impl DailyBucket {
    /// A zero-activity day.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            cost: 0.0,
            tokens: 0,
            request_count: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.request_count > 0 || self.cost > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpend {
    pub provider: String,
    /// Total cost in dollars
    pub total_cost: f64,
    pub total_tokens: u64,
    pub request_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Total cost in dollars
    pub total_cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub request_count: u64,
    pub first_request_at: Option<DateTime<Utc>>,
    pub last_request_at: Option<DateTime<Utc>>,
}

impl UsageSummary {
    /// Average cost per request, `None` when there were no requests.
    pub fn cost_per_request(&self) -> Option<f64> {
        (self.request_count > 0).then(|| self.total_cost / self.request_count as f64)
    }
}
