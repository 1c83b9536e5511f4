//! Daily chart series for the executive dashboard.

use super::stats::{round1, round2};
use crate::models::{DailyBucket, TrendMetric, TrendPoint};

/// Trailing points used to project the next value.
const PROJECTION_WINDOW: usize = 7;

/// One point per day of `series` for `metric`.
///
/// `change` is the percentage change from the previous day (0 for the first
/// day or after a zero day). The final point carries a projection of the
/// next day's value.
pub fn build_trend_series(series: &[DailyBucket], metric: TrendMetric) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = Vec::with_capacity(series.len());

    for (index, bucket) in series.iter().enumerate() {
        let value = round2(metric_value(bucket, metric));
        let change = match points.last() {
            Some(previous) if previous.value != 0.0 => {
                round1((value - previous.value) / previous.value * 100.0)
            }
            _ => 0.0,
        };
        let forecast =
            (index + 1 == series.len()).then(|| round2(forecast_next_value(&points, value)));

        points.push(TrendPoint {
            period: bucket.date,
            value,
            change,
            forecast,
        });
    }

    points
}

/// Efficiency of one day's requests (0-100), 0 for a day without requests.
///
/// Averages a cost score (100 at $0/request, 0 at $1+/request) and a token
/// score (100 at 0 tokens/request, 0 at 10k+ tokens/request).
pub fn daily_efficiency(bucket: &DailyBucket) -> f64 {
    if bucket.request_count == 0 {
        return 0.0;
    }
    let requests = bucket.request_count as f64;
    let cost_per_request = bucket.cost / requests;
    let tokens_per_request = bucket.tokens as f64 / requests;

    let cost_efficiency = (100.0 - cost_per_request * 100.0).max(0.0);
    let token_efficiency = (100.0 - tokens_per_request / 10_000.0 * 100.0).max(0.0);
    (cost_efficiency + token_efficiency) / 2.0
}

/// `current` plus the mean day-over-day delta of the trailing points.
///
/// Fewer than three prior points yield `current` unchanged. Never negative.
pub fn forecast_next_value(history: &[TrendPoint], current: f64) -> f64 {
    if history.len() < 3 {
        return current;
    }
    let recent = &history[history.len().saturating_sub(PROJECTION_WINDOW)..];
    let delta_sum: f64 = recent.windows(2).map(|w| w[1].value - w[0].value).sum();
    let mean_delta = delta_sum / (recent.len() - 1) as f64;
    (current + mean_delta).max(0.0)
}

fn metric_value(bucket: &DailyBucket, metric: TrendMetric) -> f64 {
    match metric {
        TrendMetric::Cost => bucket.cost,
        TrendMetric::Usage => bucket.request_count as f64,
        TrendMetric::Efficiency => daily_efficiency(bucket),
    }
}
