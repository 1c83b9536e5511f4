use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cost forecast for a single future day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub date: NaiveDate,
    /// Predicted cost in dollars
    pub predicted_cost: f64,
    /// Confidence percentage (0-100)
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Human-readable notes on what influenced the prediction
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Trend,
    Spike,
    Dip,
    Seasonal,
    Anomaly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// A detected usage pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub description: String,
    pub impact: Impact,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Magnitude of the finding (slope, cost, or weekday spread)
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Critical,
    Warning,
}

/// A day whose cost lies far outside the window's distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAnomaly {
    pub date: NaiveDate,
    /// Provider scope of the observation ("all" for the organization total)
    pub provider: String,
    pub actual: f64,
    pub expected: f64,
    /// Percentage deviation from the expected cost
    pub deviation_pct: f64,
    pub z_score: f64,
    pub severity: AnomalySeverity,
    pub possible_cause: String,
}

/// A ranked cost-saving opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOptimization {
    /// Provider name, or a pseudo-provider such as `batch-processing`
    pub provider: String,
    pub current_cost: f64,
    pub optimal_cost: f64,
    pub savings_potential: f64,
    pub recommendation: String,
    /// Confidence (0-1)
    pub confidence: f64,
}

/// Executive dashboard scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveMetrics {
    /// Cost efficiency (0-100, higher is better)
    pub efficiency: f64,
    /// Financial risk (0-100, lower is better)
    pub risk_score: f64,
    /// Backtested forecast accuracy (0-100)
    pub forecast_accuracy: f64,
    /// Governance completeness (0-100)
    pub compliance_score: f64,
    /// Potential savings in dollars
    pub savings_opportunity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Cost,
    Usage,
    Efficiency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: NaiveDate,
    pub value: f64,
    /// Percentage change from the previous day
    pub change: f64,
    /// Projected next value, only present on the final point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Success,
    Warning,
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveTrends {
    pub cost: Vec<TrendPoint>,
    pub usage: Vec<TrendPoint>,
    pub efficiency: Vec<TrendPoint>,
}

/// Everything an executive dashboard needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveReport {
    pub org_id: Uuid,
    pub as_of: NaiveDate,
    pub metrics: ExecutiveMetrics,
    pub trends: ExecutiveTrends,
    pub forecasts: Vec<Forecast>,
    pub patterns: Vec<Pattern>,
    pub optimizations: Vec<CostOptimization>,
    pub insights: Vec<BusinessInsight>,
    pub generated_at: DateTime<Utc>,
}
