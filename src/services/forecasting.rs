//! Ensemble cost forecasting.
//!
//! # Algorithm
//!
//! Three simple estimators are blended with configurable weights
//! (default 0.3 / 0.3 / 0.4):
//!
//! - a trailing moving average of the last week,
//! - an OLS linear trend extrapolated `i` days past the series start,
//! - the historical average for the forecast day's weekday.
//!
//! Confidence starts at 100 and loses points for sparse history, volatility
//! (coefficient of variation) and horizon distance. Bounds widen linearly
//! with the horizon.
//!
//! Organizations with less than a week of usage get an explicitly flagged
//! baseline forecast instead of an error.

use chrono::{Days, NaiveDate};

use super::{
    aggregation::{costs, trim_leading_inactive, validate_series},
    error::{AnalyticsError, AnalyticsResult},
    stats::{
        LinearTrend, WeeklyProfile, coefficient_of_variation, linear_trend, mean,
        moving_average, round2, weekday_index, weekday_name,
    },
};
use crate::{
    config::ForecastConfig,
    models::{DailyBucket, Forecast},
};

/// Forecast the `days` days following `as_of` from the daily `history`.
///
/// `history` must be a valid contiguous daily series, normally ending at
/// `as_of`. Leading days without activity are ignored.
pub fn generate_forecast(
    history: &[DailyBucket],
    days: u32,
    as_of: NaiveDate,
    config: &ForecastConfig,
) -> AnalyticsResult<Vec<Forecast>> {
    if days == 0 {
        return Err(AnalyticsError::InvalidInput(
            "forecast horizon must be at least 1 day".to_string(),
        ));
    }
    validate_series(history)?;

    let history = trim_leading_inactive(history);
    if history.len() < config.min_history_days {
        return baseline_forecast(days, as_of, config);
    }

    let values = costs(history);
    let model = EnsembleModel {
        moving_average: moving_average(&values, config.moving_average_window),
        trend: linear_trend(&values),
        weekly: WeeklyProfile::from_buckets(history),
        volatility: coefficient_of_variation(&values),
        data_points: history.len(),
    };

    (1..=days)
        .map(|i| {
            let date = forecast_date(as_of, i)?;
            Ok(model.predict(i, date, config))
        })
        .collect()
}

/// Accuracy (50-100) of a trailing-mean predictor replayed over `series`.
///
/// Each day after the first `backtest_window` days is predicted from the
/// mean of the preceding window and scored by relative error. Days with zero
/// actual cost are skipped. Too few scored days yield
/// `backtest_default_accuracy`.
pub fn backtest_accuracy(series: &[DailyBucket], config: &ForecastConfig) -> f64 {
    let window = config.backtest_window.max(1);
    let values = costs(series);

    let errors: Vec<f64> = (window..values.len())
        .filter(|&i| values[i] > 0.0)
        .map(|i| {
            let predicted = mean(&values[i - window..i]);
            let actual = values[i];
            (predicted - actual).abs() / actual
        })
        .collect();

    if errors.len() < config.backtest_min_predictions.max(1) {
        return config.backtest_default_accuracy;
    }

    let accuracy = (1.0 - mean(&errors)).max(0.0) * 100.0;
    accuracy.clamp(config.backtest_floor, 100.0)
}

struct EnsembleModel {
    moving_average: f64,
    trend: LinearTrend,
    weekly: WeeklyProfile,
    volatility: f64,
    data_points: usize,
}

impl EnsembleModel {
    fn predict(&self, i: u32, date: NaiveDate, config: &ForecastConfig) -> Forecast {
        let offset = f64::from(i);
        let weekday = weekday_index(date);

        let trend_prediction = self.trend.at(offset).max(0.0);
        let seasonal_prediction = self
            .weekly
            .average_for(weekday)
            .unwrap_or(self.moving_average);

        let weights = &config.weights;
        let predicted = (weights.moving_average * self.moving_average
            + weights.trend * trend_prediction
            + weights.seasonal * seasonal_prediction)
            .max(0.0);

        let margin = predicted * self.volatility * (offset / 10.0);

        Forecast {
            date,
            predicted_cost: round2(predicted),
            confidence: round2(self.confidence(i, config)),
            lower_bound: round2((predicted - margin).max(0.0)),
            upper_bound: round2(predicted + margin),
            factors: self.factors(i, weekday, config),
        }
    }

    fn confidence(&self, i: u32, config: &ForecastConfig) -> f64 {
        let mut confidence: f64 = 100.0;
        if self.data_points < config.ample_history_days {
            let missing = (config.ample_history_days - self.data_points) as f64;
            confidence -= missing * config.sparse_history_penalty_per_day;
        }
        confidence -= self.volatility * 100.0;
        confidence -= f64::from(i) * config.horizon_penalty_per_day;
        confidence.clamp(0.0, 100.0)
    }

    fn factors(&self, i: u32, weekday: usize, config: &ForecastConfig) -> Vec<String> {
        let mut factors = Vec::new();

        match weekday {
            0 | 6 => factors.push(format!("Weekend ({})", weekday_name(weekday))),
            1 => factors.push("Monday (typically higher usage)".to_string()),
            5 => factors.push("Friday (end of week)".to_string()),
            _ => {}
        }

        if self.trend.slope > config.strong_trend_slope {
            factors.push("Strong upward trend".to_string());
        } else if self.trend.slope < -config.strong_trend_slope {
            factors.push("Strong downward trend".to_string());
        }

        if i > config.long_range_days {
            factors.push("Long-range forecast (lower confidence)".to_string());
        }

        if self.data_points < config.ample_history_days {
            factors.push("Limited historical data".to_string());
        }

        factors
    }
}

fn baseline_forecast(
    days: u32,
    as_of: NaiveDate,
    config: &ForecastConfig,
) -> AnalyticsResult<Vec<Forecast>> {
    tracing::debug!(days, "Insufficient history, using baseline forecast");

    let baseline = config.fallback_baseline_cost;
    (1..=days)
        .map(|i| {
            Ok(Forecast {
                date: forecast_date(as_of, i)?,
                predicted_cost: round2(baseline),
                confidence: config.fallback_confidence,
                lower_bound: round2(baseline * 0.5),
                upper_bound: round2(baseline * 2.0),
                factors: vec![
                    "Insufficient historical data".to_string(),
                    "Using baseline estimates".to_string(),
                ],
            })
        })
        .collect()
}

fn forecast_date(as_of: NaiveDate, i: u32) -> AnalyticsResult<NaiveDate> {
    as_of
        .checked_add_days(Days::new(u64::from(i)))
        .ok_or_else(|| {
            AnalyticsError::InvalidInput(format!("forecast date {as_of} + {i} days overflows"))
        })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::rstest;

    use super::*;

    fn make_daily_bucket(date: NaiveDate, cost: f64) -> DailyBucket {
        DailyBucket {
            date,
            cost,
            tokens: 0,
            request_count: u64::from(cost > 0.0),
        }
    }

    /// Series ending at `as_of()`.
    fn make_history(costs: &[f64]) -> Vec<DailyBucket> {
        let start = as_of() - Duration::days(costs.len() as i64 - 1);
        costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| make_daily_bucket(start + Duration::days(i as i64), cost))
            .collect()
    }

    /// A Wednesday.
    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_flat_series_forecast() {
        let history = make_history(&[10.0; 21]);
        let forecasts = generate_forecast(&history, 7, as_of(), &ForecastConfig::default()).unwrap();

        assert_eq!(forecasts.len(), 7);
        let first = &forecasts[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
        assert_eq!(first.predicted_cost, 10.0);
        // 100 - (30 - 21) * 0.5 - 0 - 2
        assert_eq!(first.confidence, 93.5);
        assert_eq!(first.lower_bound, 10.0);
        assert_eq!(first.upper_bound, 10.0);
        assert!(first.factors.contains(&"Limited historical data".to_string()));

        for f in &forecasts {
            assert_eq!(f.predicted_cost, 10.0);
        }
    }

    #[test]
    fn test_ample_flat_history() {
        let history = make_history(&[12.5; 45]);
        let forecasts = generate_forecast(&history, 3, as_of(), &ForecastConfig::default()).unwrap();
        assert_eq!(forecasts[0].confidence, 98.0);
        assert_eq!(forecasts[2].confidence, 94.0);
        assert!(forecasts.iter().all(|f| f.predicted_cost == 12.5));
        assert!(
            forecasts
                .iter()
                .all(|f| !f.factors.iter().any(|x| x == "Limited historical data"))
        );
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(6)]
    fn test_insufficient_history_uses_baseline(#[case] days: usize) {
        let history = make_history(&vec![4.0; days]);
        let forecasts = generate_forecast(&history, 5, as_of(), &ForecastConfig::default()).unwrap();

        assert_eq!(forecasts.len(), 5);
        for f in &forecasts {
            assert_eq!(f.predicted_cost, 10.0);
            assert_eq!(f.confidence, 25.0);
            assert_eq!(f.lower_bound, 5.0);
            assert_eq!(f.upper_bound, 20.0);
            assert_eq!(
                f.factors,
                vec!["Insufficient historical data", "Using baseline estimates"]
            );
        }
    }

    #[test]
    fn test_leading_idle_days_are_not_history() {
        // 85 idle days followed by 5 active ones is still too little history
        let mut costs = vec![0.0; 85];
        costs.extend([8.0; 5]);
        let history = make_history(&costs);
        let forecasts = generate_forecast(&history, 2, as_of(), &ForecastConfig::default()).unwrap();
        assert!(forecasts.iter().all(|f| f.confidence == 25.0));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let history = make_history(&[10.0; 10]);
        let result = generate_forecast(&history, 0, as_of(), &ForecastConfig::default());
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_history_rejected() {
        let mut history = make_history(&[10.0; 10]);
        history.swap(2, 3);
        let result = generate_forecast(&history, 3, as_of(), &ForecastConfig::default());
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_bounds_and_confidence_invariants() {
        // Noisy, declining series that drives the trend estimator below zero
        let costs: Vec<f64> = (0..40)
            .map(|i| {
                let base = (100.0 - 3.0 * i as f64).max(0.5);
                if i % 3 == 0 { base * 1.8 } else { base }
            })
            .collect();
        let history = make_history(&costs);
        let forecasts = generate_forecast(&history, 30, as_of(), &ForecastConfig::default()).unwrap();

        assert_eq!(forecasts.len(), 30);
        for f in &forecasts {
            assert!(f.lower_bound >= 0.0);
            assert!(f.lower_bound <= f.predicted_cost);
            assert!(f.predicted_cost <= f.upper_bound);
            assert!((0.0..=100.0).contains(&f.confidence));
        }
        for pair in forecasts.windows(2) {
            assert!(pair[1].confidence <= pair[0].confidence);
        }
    }

    #[test]
    fn test_factors() {
        let costs: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let history = make_history(&costs);
        let forecasts = generate_forecast(&history, 16, as_of(), &ForecastConfig::default()).unwrap();

        // as_of is a Wednesday: +2 Friday, +3 Saturday, +5 Monday
        assert_eq!(forecasts[1].factors[0], "Friday (end of week)");
        assert_eq!(forecasts[2].factors[0], "Weekend (Saturday)");
        assert_eq!(forecasts[3].factors[0], "Weekend (Sunday)");
        assert_eq!(forecasts[4].factors[0], "Monday (typically higher usage)");
        assert!(forecasts[0].factors.contains(&"Strong upward trend".to_string()));
        assert!(
            !forecasts[13]
                .factors
                .contains(&"Long-range forecast (lower confidence)".to_string())
        );
        assert!(
            forecasts[14]
                .factors
                .contains(&"Long-range forecast (lower confidence)".to_string())
        );
    }

    #[test]
    fn test_custom_weights() {
        let mut config = ForecastConfig::default();
        config.weights.moving_average = 1.0;
        config.weights.trend = 0.0;
        config.weights.seasonal = 0.0;

        let mut costs = vec![1.0; 23];
        costs.extend([8.0; 7]);
        let forecasts = generate_forecast(&make_history(&costs), 1, as_of(), &config).unwrap();
        assert_eq!(forecasts[0].predicted_cost, 8.0);
    }

    #[test]
    fn test_backtest_default_for_short_series() {
        let config = ForecastConfig::default();
        assert_eq!(backtest_accuracy(&make_history(&[10.0; 13]), &config), 75.0);
        assert_eq!(backtest_accuracy(&[], &config), 75.0);
    }

    #[test]
    fn test_backtest_perfect_on_flat_series() {
        let config = ForecastConfig::default();
        assert_eq!(backtest_accuracy(&make_history(&[10.0; 30]), &config), 100.0);
    }

    #[test]
    fn test_backtest_floor() {
        let config = ForecastConfig::default();
        let costs: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 1.0 } else { 100.0 })
            .collect();
        assert_eq!(backtest_accuracy(&make_history(&costs), &config), 50.0);
    }

    #[test]
    fn test_backtest_skips_zero_days() {
        let config = ForecastConfig::default();
        let mut costs = vec![10.0; 30];
        for i in (8..30).step_by(2) {
            costs[i] = 0.0;
        }
        // Zero days are not scored but still drag later window means down
        let accuracy = backtest_accuracy(&make_history(&costs), &config);
        assert!(accuracy > 50.0 && accuracy < 100.0, "accuracy = {accuracy}");
    }
}
