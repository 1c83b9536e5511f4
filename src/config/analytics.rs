use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Tunable heuristics for the analytics pipeline.
///
/// Every threshold and weight used by the forecaster, pattern detector,
/// optimization recommender and executive scorer lives here so it can be
/// tuned per deployment and pinned in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Offset from UTC, in minutes, of the calendar-day boundary used to
    /// group records into daily buckets. Default: 0 (UTC days).
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Ensemble forecast and backtest settings.
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Pattern and anomaly detection settings.
    #[serde(default)]
    pub patterns: PatternConfig,

    /// Optimization recommender settings.
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Executive scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // chrono accepts offsets strictly inside +/- 24h
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ConfigError::Validation(format!(
                "analytics.utc_offset_minutes must be within +/-1439 (got {})",
                self.utc_offset_minutes
            )));
        }
        self.forecast.validate()?;
        self.patterns.validate()?;
        self.optimization.validate()?;
        self.scoring.validate()?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forecast
// ─────────────────────────────────────────────────────────────────────────────

/// Weights of the three estimators in the ensemble forecast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct EnsembleWeights {
    #[serde(default = "default_moving_average_weight")]
    pub moving_average: f64,
    #[serde(default = "default_trend_weight")]
    pub trend: f64,
    #[serde(default = "default_seasonal_weight")]
    pub seasonal: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            moving_average: default_moving_average_weight(),
            trend: default_trend_weight(),
            seasonal: default_seasonal_weight(),
        }
    }
}

fn default_moving_average_weight() -> f64 {
    0.3
}

fn default_trend_weight() -> f64 {
    0.3
}

fn default_seasonal_weight() -> f64 {
    0.4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Days of history fetched for forecasting. Default: 90.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Days forecast when the caller does not specify a horizon. Default: 7.
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,

    /// Minimum active history days before the ensemble is used. Default: 7.
    #[serde(default = "default_min_history_days")]
    pub min_history_days: usize,

    /// Trailing window of the moving-average estimator. Default: 7.
    #[serde(default = "default_window")]
    pub moving_average_window: usize,

    #[serde(default)]
    pub weights: EnsembleWeights,

    /// History shorter than this is penalized and flagged. Default: 30.
    #[serde(default = "default_ample_history_days")]
    pub ample_history_days: usize,

    /// Confidence points lost per missing day below `ample_history_days`.
    #[serde(default = "default_sparse_history_penalty")]
    pub sparse_history_penalty_per_day: f64,

    /// Confidence points lost per day of forecast horizon. Default: 2.
    #[serde(default = "default_horizon_penalty")]
    pub horizon_penalty_per_day: f64,

    /// Slope magnitude ($/day) reported as a strong trend. Default: 0.5.
    #[serde(default = "default_strong_trend_slope")]
    pub strong_trend_slope: f64,

    /// Horizons beyond this many days are flagged as long-range. Default: 14.
    #[serde(default = "default_long_range_days")]
    pub long_range_days: u32,

    /// Daily cost assumed when there is not enough history. Default: 10.
    #[serde(default = "default_fallback_baseline_cost")]
    pub fallback_baseline_cost: f64,

    /// Confidence reported for baseline forecasts. Default: 25.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Trailing days used to predict each day during backtesting. Default: 7.
    #[serde(default = "default_window")]
    pub backtest_window: usize,

    /// Predictions required before backtest accuracy is trusted. Default: 7.
    #[serde(default = "default_backtest_min_predictions")]
    pub backtest_min_predictions: usize,

    /// Accuracy reported when the backtest has too few predictions. Default: 75.
    #[serde(default = "default_backtest_default_accuracy")]
    pub backtest_default_accuracy: f64,

    /// Lowest accuracy the backtest will report. Default: 50.
    #[serde(default = "default_backtest_floor")]
    pub backtest_floor: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            default_horizon_days: default_horizon_days(),
            min_history_days: default_min_history_days(),
            moving_average_window: default_window(),
            weights: EnsembleWeights::default(),
            ample_history_days: default_ample_history_days(),
            sparse_history_penalty_per_day: default_sparse_history_penalty(),
            horizon_penalty_per_day: default_horizon_penalty(),
            strong_trend_slope: default_strong_trend_slope(),
            long_range_days: default_long_range_days(),
            fallback_baseline_cost: default_fallback_baseline_cost(),
            fallback_confidence: default_fallback_confidence(),
            backtest_window: default_window(),
            backtest_min_predictions: default_backtest_min_predictions(),
            backtest_default_accuracy: default_backtest_default_accuracy(),
            backtest_floor: default_backtest_floor(),
        }
    }
}

impl ForecastConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        if w.moving_average < 0.0 || w.trend < 0.0 || w.seasonal < 0.0 {
            return Err(ConfigError::Validation(
                "analytics.forecast.weights must be non-negative".into(),
            ));
        }
        let sum = w.moving_average + w.trend + w.seasonal;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Validation(format!(
                "analytics.forecast.weights must sum to 1.0 (got {sum})"
            )));
        }
        if self.moving_average_window == 0 || self.backtest_window == 0 {
            return Err(ConfigError::Validation(
                "analytics.forecast windows must be at least 1 day".into(),
            ));
        }
        if self.history_days == 0 {
            return Err(ConfigError::Validation(
                "analytics.forecast.history_days must be > 0".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.fallback_confidence)
            || !(0.0..=100.0).contains(&self.backtest_default_accuracy)
            || !(0.0..=100.0).contains(&self.backtest_floor)
        {
            return Err(ConfigError::Validation(
                "analytics.forecast confidence and accuracy values must be within 0-100".into(),
            ));
        }
        if self.fallback_baseline_cost < 0.0 {
            return Err(ConfigError::Validation(
                "analytics.forecast.fallback_baseline_cost cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

fn default_history_days() -> u32 {
    90
}

fn default_horizon_days() -> u32 {
    7
}

fn default_min_history_days() -> usize {
    7
}

fn default_window() -> usize {
    7
}

fn default_ample_history_days() -> usize {
    30
}

fn default_sparse_history_penalty() -> f64 {
    0.5
}

fn default_horizon_penalty() -> f64 {
    2.0
}

fn default_strong_trend_slope() -> f64 {
    0.5
}

fn default_long_range_days() -> u32 {
    14
}

fn default_fallback_baseline_cost() -> f64 {
    10.0
}

fn default_fallback_confidence() -> f64 {
    25.0
}

fn default_backtest_min_predictions() -> usize {
    7
}

fn default_backtest_default_accuracy() -> f64 {
    75.0
}

fn default_backtest_floor() -> f64 {
    50.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// Days of history scanned for patterns. Default: 30.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Fewer days than this yields no patterns. Default: 7.
    #[serde(default = "default_min_pattern_days")]
    pub min_days: usize,

    /// Minimum slope magnitude ($/day) reported as a trend. Default: 0.1.
    #[serde(default = "default_trend_sensitivity")]
    pub trend_sensitivity: f64,

    /// Slope magnitude above which a trend is high impact. Default: 1.0.
    #[serde(default = "default_trend_high_impact")]
    pub trend_high_impact: f64,

    /// Trailing window for the spike/dip baseline. Default: 7.
    #[serde(default = "default_window")]
    pub spike_window: usize,

    /// Percent deviation from baseline that counts as a spike or dip. Default: 50.
    #[serde(default = "default_spike_threshold_pct")]
    pub spike_threshold_pct: f64,

    /// Percent deviation above which a spike is high impact. Default: 100.
    #[serde(default = "default_spike_high_impact_pct")]
    pub spike_high_impact_pct: f64,

    /// Peak-to-low weekday ratio that makes a weekly pattern significant. Default: 1.5.
    #[serde(default = "default_seasonal_ratio")]
    pub seasonal_ratio: f64,

    /// Minimum days before anomaly detection runs. Default: 14.
    #[serde(default = "default_anomaly_min_days")]
    pub anomaly_min_days: usize,

    /// |z| at or above which a day is a warning. Default: 2.
    #[serde(default = "default_anomaly_warning_z")]
    pub anomaly_warning_z: f64,

    /// |z| at or above which a day is critical. Default: 3.
    #[serde(default = "default_anomaly_critical_z")]
    pub anomaly_critical_z: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            min_days: default_min_pattern_days(),
            trend_sensitivity: default_trend_sensitivity(),
            trend_high_impact: default_trend_high_impact(),
            spike_window: default_window(),
            spike_threshold_pct: default_spike_threshold_pct(),
            spike_high_impact_pct: default_spike_high_impact_pct(),
            seasonal_ratio: default_seasonal_ratio(),
            anomaly_min_days: default_anomaly_min_days(),
            anomaly_warning_z: default_anomaly_warning_z(),
            anomaly_critical_z: default_anomaly_critical_z(),
        }
    }
}

impl PatternConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.anomaly_warning_z <= 0.0 || self.anomaly_critical_z < self.anomaly_warning_z {
            return Err(ConfigError::Validation(
                "analytics.patterns requires 0 < anomaly_warning_z <= anomaly_critical_z".into(),
            ));
        }
        if self.trend_high_impact < self.trend_sensitivity {
            return Err(ConfigError::Validation(
                "analytics.patterns.trend_high_impact must be >= trend_sensitivity".into(),
            ));
        }
        if self.spike_high_impact_pct < self.spike_threshold_pct {
            return Err(ConfigError::Validation(
                "analytics.patterns.spike_high_impact_pct must be >= spike_threshold_pct".into(),
            ));
        }
        if self.seasonal_ratio < 1.0 {
            return Err(ConfigError::Validation(
                "analytics.patterns.seasonal_ratio must be >= 1.0".into(),
            ));
        }
        if self.spike_window == 0 {
            return Err(ConfigError::Validation(
                "analytics.patterns.spike_window must be at least 1 day".into(),
            ));
        }
        Ok(())
    }
}

fn default_lookback_days() -> u32 {
    30
}

fn default_min_pattern_days() -> usize {
    7
}

fn default_trend_sensitivity() -> f64 {
    0.1
}

fn default_trend_high_impact() -> f64 {
    1.0
}

fn default_spike_threshold_pct() -> f64 {
    50.0
}

fn default_spike_high_impact_pct() -> f64 {
    100.0
}

fn default_seasonal_ratio() -> f64 {
    1.5
}

fn default_anomaly_min_days() -> usize {
    14
}

fn default_anomaly_warning_z() -> f64 {
    2.0
}

fn default_anomaly_critical_z() -> f64 {
    3.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Optimization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct OptimizationConfig {
    /// Days of usage considered for recommendations. Default: 30.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Window request volume above which batching is recommended. Default: 1000.
    #[serde(default = "default_batch_request_threshold")]
    pub batch_request_threshold: u64,

    /// Fraction of window spend batching is expected to save. Default: 0.3.
    #[serde(default = "default_batch_savings_rate")]
    pub batch_savings_rate: f64,

    /// Average daily requests above which response caching is recommended.
    /// Default: 1000.
    #[serde(default = "default_caching_daily_request_threshold")]
    pub caching_daily_request_threshold: f64,

    /// Fraction of window spend caching is expected to save. Default: 0.15.
    #[serde(default = "default_caching_savings_rate")]
    pub caching_savings_rate: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            batch_request_threshold: default_batch_request_threshold(),
            batch_savings_rate: default_batch_savings_rate(),
            caching_daily_request_threshold: default_caching_daily_request_threshold(),
            caching_savings_rate: default_caching_savings_rate(),
        }
    }
}

impl OptimizationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, rate) in [
            ("batch_savings_rate", self.batch_savings_rate),
            ("caching_savings_rate", self.caching_savings_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!(
                    "analytics.optimization.{name} must be between 0 and 1 (got {rate})"
                )));
            }
        }
        Ok(())
    }
}

fn default_batch_request_threshold() -> u64 {
    1000
}

fn default_batch_savings_rate() -> f64 {
    0.3
}

fn default_caching_daily_request_threshold() -> f64 {
    1000.0
}

fn default_caching_savings_rate() -> f64 {
    0.15
}

// ─────────────────────────────────────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Length of the current (and previous) scoring window. Default: 30.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Share of window spend attributed to general usage optimization
    /// headroom in the savings figure. Default: 0.1.
    #[serde(default = "default_usage_headroom_rate")]
    pub usage_headroom_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            usage_headroom_rate: default_usage_headroom_rate(),
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_days == 0 {
            return Err(ConfigError::Validation(
                "analytics.scoring.lookback_days must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.usage_headroom_rate) {
            return Err(ConfigError::Validation(format!(
                "analytics.scoring.usage_headroom_rate must be between 0 and 1 (got {})",
                self.usage_headroom_rate
            )));
        }
        Ok(())
    }
}

fn default_usage_headroom_rate() -> f64 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = AnalyticsConfig::default();
        config.forecast.weights.seasonal = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = AnalyticsConfig::default();
        config.forecast.weights = EnsembleWeights {
            moving_average: -0.2,
            trend: 0.6,
            seasonal: 0.6,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_anomaly_thresholds_ordered() {
        let mut config = AnalyticsConfig::default();
        config.patterns.anomaly_critical_z = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utc_offset_range() {
        let mut config = AnalyticsConfig::default();
        config.utc_offset_minutes = -300;
        assert!(config.validate().is_ok());
        config.utc_offset_minutes = 1440;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_savings_rate_range() {
        let mut config = AnalyticsConfig::default();
        config.optimization.batch_savings_rate = 1.5;
        assert!(config.validate().is_err());
    }
}
