//! Usage pattern and anomaly detection over a daily cost series.
//!
//! Findings are returned in a fixed order: trend, spikes and dips
//! (chronological), weekly seasonality, then critical anomalies. Callers
//! needing a top-N slice should take it from the returned list.

use super::{
    aggregation::{costs, validate_series},
    error::AnalyticsResult,
    stats::{
        WeeklyProfile, linear_trend, mean, moving_average, round1, round2, std_dev, weekday_name,
        z_score,
    },
};
use crate::{
    config::PatternConfig,
    models::{AnomalySeverity, DailyBucket, Impact, Pattern, PatternType, UsageAnomaly},
};

/// Scope label for anomalies computed over the organization's total spend.
const ALL_PROVIDERS: &str = "all";

/// Detect trend, spike/dip, seasonal and anomaly patterns in `series`.
///
/// Series shorter than `config.min_days` produce no patterns.
pub fn detect_patterns(
    series: &[DailyBucket],
    config: &PatternConfig,
) -> AnalyticsResult<Vec<Pattern>> {
    validate_series(series)?;

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Ok(Vec::new());
    };
    if series.len() < config.min_days {
        return Ok(Vec::new());
    }

    let values = costs(series);
    let mut patterns = Vec::new();

    let trend = linear_trend(&values);
    if trend.slope.abs() > config.trend_sensitivity {
        let increasing = trend.slope > 0.0;
        patterns.push(Pattern {
            pattern_type: PatternType::Trend,
            description: format!(
                "Costs {} by ${:.2}/day",
                if increasing { "increasing" } else { "decreasing" },
                trend.slope.abs()
            ),
            impact: if trend.slope.abs() > config.trend_high_impact {
                Impact::High
            } else {
                Impact::Medium
            },
            start_date: first.date,
            end_date: Some(last.date),
            value: round2(trend.slope),
            recommendation: Some(
                if increasing {
                    "Consider optimizing model selection or implementing usage limits"
                } else {
                    "Current optimization strategies are working well"
                }
                .to_string(),
            ),
        });
    }

    patterns.extend(spikes_and_dips(series, &values, config));

    if let Some(seasonal) = weekly_seasonality(series, config) {
        patterns.push(seasonal);
    }

    // Warning-level anomalies stay in detect_anomalies only
    for anomaly in detect_anomalies(series, config)?
        .into_iter()
        .filter(|a| a.severity == AnomalySeverity::Critical)
    {
        let spike = anomaly.actual > anomaly.expected;
        patterns.push(Pattern {
            pattern_type: PatternType::Anomaly,
            description: format!(
                "Unusual {} in usage on {}",
                if spike { "spike" } else { "drop" },
                anomaly.date
            ),
            impact: Impact::High,
            start_date: anomaly.date,
            end_date: None,
            value: anomaly.actual,
            recommendation: Some(anomaly.possible_cause),
        });
    }

    Ok(patterns)
}

/// Flag days whose cost lies far from the series mean.
///
/// Requires at least `config.anomaly_min_days` days; shorter series (and
/// series with no variance) yield no anomalies.
pub fn detect_anomalies(
    series: &[DailyBucket],
    config: &PatternConfig,
) -> AnalyticsResult<Vec<UsageAnomaly>> {
    validate_series(series)?;

    if series.len() < config.anomaly_min_days {
        return Ok(Vec::new());
    }

    let values = costs(series);
    let avg = mean(&values);
    let sd = std_dev(&values);

    let anomalies = series
        .iter()
        .filter_map(|bucket| {
            let z = z_score(bucket.cost, avg, sd);
            let severity = if z.abs() >= config.anomaly_critical_z {
                AnomalySeverity::Critical
            } else if z.abs() >= config.anomaly_warning_z {
                AnomalySeverity::Warning
            } else {
                return None;
            };

            // A nonzero z-score implies a positive mean for non-negative costs
            let deviation_pct = (bucket.cost - avg) / avg * 100.0;

            Some(UsageAnomaly {
                date: bucket.date,
                provider: ALL_PROVIDERS.to_string(),
                actual: round2(bucket.cost),
                expected: round2(avg),
                deviation_pct: round1(deviation_pct),
                z_score: round2(z),
                severity,
                possible_cause: possible_cause(bucket, avg).to_string(),
            })
        })
        .collect();

    Ok(anomalies)
}

fn spikes_and_dips(series: &[DailyBucket], values: &[f64], config: &PatternConfig) -> Vec<Pattern> {
    if series.len() < 3 {
        return Vec::new();
    }

    let baseline = moving_average(values, config.spike_window.min(values.len()));
    if baseline == 0.0 {
        return Vec::new();
    }

    // First and last days have no neighbour on one side and are skipped
    series[1..series.len() - 1]
        .iter()
        .filter_map(|bucket| {
            let deviation = (bucket.cost - baseline) / baseline * 100.0;
            if deviation > config.spike_threshold_pct {
                Some(Pattern {
                    pattern_type: PatternType::Spike,
                    description: format!("Cost spike of {}% above average", deviation.round()),
                    impact: if deviation > config.spike_high_impact_pct {
                        Impact::High
                    } else {
                        Impact::Medium
                    },
                    start_date: bucket.date,
                    end_date: None,
                    value: bucket.cost,
                    recommendation: Some(
                        "Review usage logs for this period to identify cause".to_string(),
                    ),
                })
            } else if deviation < -config.spike_threshold_pct {
                Some(Pattern {
                    pattern_type: PatternType::Dip,
                    description: format!(
                        "Cost dip of {}% below average",
                        deviation.abs().round()
                    ),
                    impact: Impact::Low,
                    start_date: bucket.date,
                    end_date: None,
                    value: bucket.cost,
                    recommendation: None,
                })
            } else {
                None
            }
        })
        .collect()
}

fn weekly_seasonality(series: &[DailyBucket], config: &PatternConfig) -> Option<Pattern> {
    let (first, last) = (series.first()?, series.last()?);
    let profile = WeeklyProfile::from_buckets(series);
    let (peak_day, peak) = profile.peak();
    let (low_day, low) = profile.low()?;

    if peak / low <= config.seasonal_ratio {
        return None;
    }

    Some(Pattern {
        pattern_type: PatternType::Seasonal,
        description: format!(
            "Weekly pattern detected: Peak on {}, Low on {}",
            weekday_name(peak_day),
            weekday_name(low_day)
        ),
        impact: Impact::Medium,
        start_date: first.date,
        end_date: Some(last.date),
        value: round2(peak - low),
        recommendation: Some(
            "Consider scheduling heavy workloads during low-cost periods".to_string(),
        ),
    })
}

fn possible_cause(bucket: &DailyBucket, mean: f64) -> &'static str {
    if bucket.cost > mean * 3.0 {
        "Possible batch processing or automated job"
    } else if bucket.cost < mean * 0.1 {
        "Possible service outage or maintenance"
    } else if bucket.request_count > 100 {
        "High request volume detected"
    } else {
        "Unusual usage pattern detected"
    }
}
