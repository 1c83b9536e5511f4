//! Numerical primitives shared by the analytics components.
//!
//! Every function is total: degenerate inputs (empty slices, zero mean, zero
//! standard deviation) map to documented fallback values so that no NaN or
//! infinity reaches a returned result for finite input.

use chrono::{Datelike, NaiveDate};

use crate::models::DailyBucket;

/// Coefficient of variation reported when the mean is zero.
pub const DEFAULT_VOLATILITY: f64 = 0.1;

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation, 0 for fewer than two points.
pub fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

/// `std_dev / mean`, or [`DEFAULT_VOLATILITY`] when the mean is zero.
pub fn coefficient_of_variation(xs: &[f64]) -> f64 {
    let m = mean(xs);
    if m == 0.0 {
        return DEFAULT_VOLATILITY;
    }
    std_dev(xs) / m
}

/// Ordinary-least-squares fit of `y = intercept + slope * x` where `x` is
/// the index into the series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Value of the fitted line at index `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub fn linear_trend(ys: &[f64]) -> LinearTrend {
    if ys.len() < 2 {
        return LinearTrend::default();
    }

    let n = ys.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = ys.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        },
    );

    // Nonzero for n >= 2 since the x values are distinct
    let denominator = n * sum_x2 - sum_x * sum_x;
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    LinearTrend { slope, intercept }
}

/// Standard score of `x`, 0 when the standard deviation is zero.
pub fn z_score(x: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (x - mean) / std_dev
}

/// Mean of the trailing `window` points, or of all points when fewer exist
/// (or `window` is 0). 0 for an empty slice.
pub fn moving_average(xs: &[f64], window: usize) -> f64 {
    if window == 0 || xs.len() < window {
        return mean(xs);
    }
    mean(&xs[xs.len() - window..])
}

/// Average daily cost per day of the week, 0 = Sunday.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyProfile {
    averages: [f64; 7],
    counts: [usize; 7],
}

impl WeeklyProfile {
    pub fn from_buckets(buckets: &[DailyBucket]) -> Self {
        let mut totals = [0.0; 7];
        let mut counts = [0usize; 7];
        for bucket in buckets {
            let day = weekday_index(bucket.date);
            totals[day] += bucket.cost;
            counts[day] += 1;
        }

        let mut averages = [0.0; 7];
        for day in 0..7 {
            if counts[day] > 0 {
                averages[day] = totals[day] / counts[day] as f64;
            }
        }

        Self { averages, counts }
    }

    /// Average cost for `weekday` (0 = Sunday), `None` without data.
    pub fn average_for(&self, weekday: usize) -> Option<f64> {
        (weekday < 7 && self.counts[weekday] > 0).then(|| self.averages[weekday])
    }

    /// Highest weekday average, first weekday wins ties.
    pub fn peak(&self) -> (usize, f64) {
        self.averages
            .iter()
            .copied()
            .enumerate()
            .fold((0, self.averages[0]), |best, (day, avg)| {
                if avg > best.1 { (day, avg) } else { best }
            })
    }

    /// Lowest positive weekday average, `None` if every average is zero.
    pub fn low(&self) -> Option<(usize, f64)> {
        self.averages
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, avg)| *avg > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (day, avg)| match best {
                Some((_, low)) if low <= avg => best,
                _ => Some((day, avg)),
            })
    }
}

/// Day of the week with 0 = Sunday.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

pub fn weekday_name(weekday: usize) -> &'static str {
    WEEKDAY_NAMES[weekday % 7]
}

/// Round to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}
