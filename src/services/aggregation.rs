//! Daily aggregation of raw usage records.
//!
//! Records are grouped by the calendar date of their timestamp at a fixed
//! UTC offset, so an organization can count its days from local midnight.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate};

use super::error::{AnalyticsError, AnalyticsResult};
use crate::{
    db::DateRange,
    models::{DailyBucket, ProviderSpend, UsageRecord, UsageSummary},
};

/// Day boundary for `utc_offset_minutes` east of UTC.
pub fn day_boundary(utc_offset_minutes: i32) -> AnalyticsResult<FixedOffset> {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            AnalyticsError::InvalidInput(format!(
                "UTC offset of {utc_offset_minutes} minutes is out of range"
            ))
        })
}

/// Aggregate records into one bucket per day of `range`, inclusive.
///
/// Days without records are zero-filled. Records need not be sorted; records
/// whose local date falls outside `range` are ignored.
pub fn aggregate_daily(
    records: &[UsageRecord],
    range: DateRange,
    offset: FixedOffset,
) -> AnalyticsResult<Vec<DailyBucket>> {
    validate_range(range)?;
    validate_records(records)?;

    let mut buckets: Vec<DailyBucket> = range
        .start
        .iter_days()
        .take_while(|date| *date <= range.end)
        .map(DailyBucket::empty)
        .collect();

    for record in records {
        let date = local_date(record, offset);
        if !range.contains(date) {
            continue;
        }
        let index = (date - range.start).num_days() as usize;
        let bucket = &mut buckets[index];
        bucket.cost += record.cost;
        bucket.tokens += record.total_tokens;
        bucket.request_count += 1;
    }

    Ok(buckets)
}

/// Total spend per provider within `range`, most expensive first.
pub fn aggregate_by_provider(
    records: &[UsageRecord],
    range: DateRange,
    offset: FixedOffset,
) -> AnalyticsResult<Vec<ProviderSpend>> {
    validate_range(range)?;
    validate_records(records)?;

    let mut by_provider: HashMap<&str, ProviderSpend> = HashMap::new();
    for record in records {
        if !range.contains(local_date(record, offset)) {
            continue;
        }
        let spend = by_provider
            .entry(record.provider.as_str())
            .or_insert_with(|| ProviderSpend {
                provider: record.provider.clone(),
                total_cost: 0.0,
                total_tokens: 0,
                request_count: 0,
            });
        spend.total_cost += record.cost;
        spend.total_tokens += record.total_tokens;
        spend.request_count += 1;
    }

    let mut providers: Vec<ProviderSpend> = by_provider.into_values().collect();
    providers.sort_by(|a, b| {
        b.total_cost
            .total_cmp(&a.total_cost)
            .then_with(|| a.provider.cmp(&b.provider))
    });
    Ok(providers)
}

/// Window totals for the records within `range`.
pub fn summarize(
    records: &[UsageRecord],
    range: DateRange,
    offset: FixedOffset,
) -> AnalyticsResult<UsageSummary> {
    validate_range(range)?;
    validate_records(records)?;

    let summary = records
        .iter()
        .filter(|r| range.contains(local_date(r, offset)))
        .fold(UsageSummary::default(), |mut acc, r| {
            acc.total_cost += r.cost;
            acc.input_tokens += r.input_tokens;
            acc.output_tokens += r.output_tokens;
            acc.total_tokens += r.total_tokens;
            acc.request_count += 1;
            acc.first_request_at = Some(match acc.first_request_at {
                Some(first) => first.min(r.timestamp),
                None => r.timestamp,
            });
            acc.last_request_at = Some(match acc.last_request_at {
                Some(last) => last.max(r.timestamp),
                None => r.timestamp,
            });
            acc
        });

    Ok(summary)
}

/// Check that a series is contiguous, ascending and holds finite,
/// non-negative costs.
pub fn validate_series(series: &[DailyBucket]) -> AnalyticsResult<()> {
    for bucket in series {
        if !bucket.cost.is_finite() || bucket.cost < 0.0 {
            return Err(AnalyticsError::InvalidInput(format!(
                "daily cost for {} must be a finite non-negative amount (got {})",
                bucket.date, bucket.cost
            )));
        }
    }
    for pair in series.windows(2) {
        let expected = pair[0].date.succ_opt();
        if expected != Some(pair[1].date) {
            return Err(AnalyticsError::InvalidInput(format!(
                "daily series must be contiguous and ascending: {} follows {}",
                pair[1].date, pair[0].date
            )));
        }
    }
    Ok(())
}

/// The series starting at the first day with any activity.
///
/// Days before an organization's first request carry no information about
/// its spend and are not counted as history.
pub fn trim_leading_inactive(series: &[DailyBucket]) -> &[DailyBucket] {
    let first_active = series
        .iter()
        .position(DailyBucket::is_active)
        .unwrap_or(series.len());
    &series[first_active..]
}

pub fn costs(series: &[DailyBucket]) -> Vec<f64> {
    series.iter().map(|b| b.cost).collect()
}

fn local_date(record: &UsageRecord, offset: FixedOffset) -> NaiveDate {
    record.timestamp.with_timezone(&offset).date_naive()
}

fn validate_range(range: DateRange) -> AnalyticsResult<()> {
    if range.start > range.end {
        return Err(AnalyticsError::InvalidInput(format!(
            "date range start {} is after end {}",
            range.start, range.end
        )));
    }
    Ok(())
}

fn validate_records(records: &[UsageRecord]) -> AnalyticsResult<()> {
    match records
        .iter()
        .find(|r| !r.cost.is_finite() || r.cost < 0.0)
    {
        Some(bad) => Err(AnalyticsError::InvalidInput(format!(
            "usage record at {} has invalid cost {}",
            bad.timestamp, bad.cost
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, hour, 0, 0).unwrap()
    }

    fn record(timestamp: DateTime<Utc>, provider: &str, cost: f64) -> UsageRecord {
        UsageRecord {
            timestamp,
            provider: provider.to_string(),
            model: "test-model".to_string(),
            cost,
            input_tokens: 40,
            output_tokens: 60,
            total_tokens: 100,
        }
    }

    fn utc() -> FixedOffset {
        day_boundary(0).unwrap()
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(1, 7, 7)]
    #[case(1, 31, 31)]
    fn test_output_covers_every_day(#[case] start: u32, #[case] end: u32, #[case] len: usize) {
        let buckets = aggregate_daily(&[], DateRange::new(date(start), date(end)), utc()).unwrap();
        assert_eq!(buckets.len(), len);
        assert!(buckets.iter().all(|b| !b.is_active()));
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_unsorted_records_grouped_by_day() {
        let records = vec![
            record(at(3, 12), "openai", 2.0),
            record(at(1, 8), "openai", 1.0),
            record(at(3, 1), "claude", 0.5),
            // outside the range
            record(at(9, 1), "claude", 100.0),
        ];

        let buckets = aggregate_daily(&records, DateRange::new(date(1), date(4)), utc()).unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].cost, 1.0);
        assert_eq!(buckets[0].request_count, 1);
        assert_eq!(buckets[1], DailyBucket::empty(date(2)));
        assert_eq!(buckets[2].cost, 2.5);
        assert_eq!(buckets[2].tokens, 200);
        assert_eq!(buckets[2].request_count, 2);
        assert_eq!(buckets[3].request_count, 0);

        let total: f64 = buckets.iter().map(|b| b.cost).sum();
        assert_eq!(total, 3.5);
    }

    #[test]
    fn test_day_boundary_offset() {
        // 23:00 UTC on the 1st is already the 2nd at UTC+2
        let records = vec![record(at(1, 23), "openai", 1.0)];
        let range = DateRange::new(date(1), date(2));

        let utc_buckets = aggregate_daily(&records, range, utc()).unwrap();
        assert_eq!(utc_buckets[0].cost, 1.0);

        let local_buckets = aggregate_daily(&records, range, day_boundary(120).unwrap()).unwrap();
        assert_eq!(local_buckets[0].cost, 0.0);
        assert_eq!(local_buckets[1].cost, 1.0);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = aggregate_daily(&[], DateRange::new(date(5), date(1)), utc());
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_cost_rejected(#[case] cost: f64) {
        let records = vec![record(at(1, 0), "openai", cost)];
        let result = aggregate_daily(&records, DateRange::new(date(1), date(2)), utc());
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_out_of_range_offset_rejected() {
        assert!(day_boundary(24 * 60).is_err());
        assert!(day_boundary(-300).is_ok());
    }

    #[test]
    fn test_aggregate_by_provider() {
        let records = vec![
            record(at(1, 0), "openai", 3.0),
            record(at(2, 0), "claude", 1.0),
            record(at(2, 5), "openai", 2.0),
            record(at(2, 6), "gemini", 1.0),
        ];

        let providers =
            aggregate_by_provider(&records, DateRange::new(date(1), date(2)), utc()).unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(names, vec!["openai", "claude", "gemini"]);
        assert_eq!(providers[0].total_cost, 5.0);
        assert_eq!(providers[0].request_count, 2);
        assert_eq!(providers[0].total_tokens, 200);
    }

    #[test]
    fn test_summarize() {
        let records = vec![
            record(at(2, 10), "openai", 3.0),
            record(at(1, 9), "claude", 1.0),
            record(at(8, 0), "claude", 50.0),
        ];

        let summary = summarize(&records, DateRange::new(date(1), date(7)), utc()).unwrap();
        assert_eq!(summary.total_cost, 4.0);
        assert_eq!(summary.request_count, 2);
        assert_eq!(summary.input_tokens, 80);
        assert_eq!(summary.output_tokens, 120);
        assert_eq!(summary.first_request_at, Some(at(1, 9)));
        assert_eq!(summary.last_request_at, Some(at(2, 10)));
        assert_eq!(summary.cost_per_request(), Some(2.0));

        let empty = summarize(&[], DateRange::new(date(1), date(7)), utc()).unwrap();
        assert_eq!(empty.cost_per_request(), None);
    }

    #[test]
    fn test_validate_series() {
        let good = vec![DailyBucket::empty(date(1)), DailyBucket::empty(date(2))];
        assert!(validate_series(&good).is_ok());
        assert!(validate_series(&[]).is_ok());

        let gapped = vec![DailyBucket::empty(date(1)), DailyBucket::empty(date(3))];
        assert!(validate_series(&gapped).is_err());

        let duplicated = vec![DailyBucket::empty(date(1)), DailyBucket::empty(date(1))];
        assert!(validate_series(&duplicated).is_err());

        let descending = vec![DailyBucket::empty(date(2)), DailyBucket::empty(date(1))];
        assert!(validate_series(&descending).is_err());

        let mut negative = DailyBucket::empty(date(1));
        negative.cost = -5.0;
        assert!(validate_series(&[negative]).is_err());
    }

    #[test]
    fn test_trim_leading_inactive() {
        let mut active = DailyBucket::empty(date(3));
        active.cost = 1.0;
        let series = vec![
            DailyBucket::empty(date(1)),
            DailyBucket::empty(date(2)),
            active,
            DailyBucket::empty(date(4)),
        ];

        let trimmed = trim_leading_inactive(&series);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].date, date(3));

        let idle = vec![DailyBucket::empty(date(1))];
        assert!(trim_leading_inactive(&idle).is_empty());
    }
}
