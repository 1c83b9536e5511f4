use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    aggregation::{aggregate_by_provider, aggregate_daily, day_boundary, summarize},
    error::AnalyticsResult,
    executive::{ScoringInput, compute_executive_metrics},
    forecasting::generate_forecast,
    insights::business_insights,
    optimization,
    patterns,
    trends::build_trend_series,
};
use crate::{
    config::CostsightConfig,
    db::{DateRange, GovernanceRepo, UsageRepo},
    models::{
        CostOptimization, ExecutiveMetrics, ExecutiveReport, ExecutiveTrends, Forecast, Pattern,
        TrendMetric, UsageAnomaly, UsageRecord,
    },
};

/// Service layer running the cost analytics for an organization.
///
/// Records are fetched through the injected repositories; every computation
/// on them is delegated to the pure functions of the sibling modules.
#[derive(Clone)]
pub struct AnalyticsService {
    usage: Arc<dyn UsageRepo>,
    governance: Arc<dyn GovernanceRepo>,
    config: Arc<CostsightConfig>,
}

impl AnalyticsService {
    pub fn new(
        usage: Arc<dyn UsageRepo>,
        governance: Arc<dyn GovernanceRepo>,
        config: Arc<CostsightConfig>,
    ) -> Self {
        Self {
            usage,
            governance,
            config,
        }
    }

    /// Forecast the days after `as_of`, `days` defaulting to the configured
    /// horizon.
    #[instrument(skip(self))]
    pub async fn forecast(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
        days: Option<u32>,
    ) -> AnalyticsResult<Vec<Forecast>> {
        let records = self.records(org_id, self.forecast_range(as_of)).await?;
        self.forecast_from(&records, as_of, days)
    }

    #[instrument(skip(self))]
    pub async fn detect_patterns(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> AnalyticsResult<Vec<Pattern>> {
        let records = self.records(org_id, self.pattern_range(as_of)).await?;
        self.patterns_from(&records, as_of)
    }

    #[instrument(skip(self))]
    pub async fn anomalies(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> AnalyticsResult<Vec<UsageAnomaly>> {
        let range = self.pattern_range(as_of);
        let records = self.records(org_id, range).await?;
        let daily = aggregate_daily(&records, range, self.offset()?)?;
        patterns::detect_anomalies(&daily, &self.config.analytics.patterns)
    }

    #[instrument(skip(self))]
    pub async fn recommend_optimizations(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> AnalyticsResult<Vec<CostOptimization>> {
        let records = self.records(org_id, self.optimization_range(as_of)).await?;
        self.optimizations_from(&records, as_of)
    }

    #[instrument(skip(self))]
    pub async fn executive_metrics(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> AnalyticsResult<ExecutiveMetrics> {
        let current = self.scoring_range(as_of);
        let span = DateRange::new(current.previous().start, current.end);
        let records = self.records(org_id, span).await?;
        self.metrics_from(org_id, &records, as_of).await
    }

    /// Metrics, trends, forecasts, patterns, optimizations and insights from
    /// a single fetch of the organization's records.
    #[instrument(skip(self))]
    pub async fn executive_report(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> AnalyticsResult<ExecutiveReport> {
        let scoring = self.scoring_range(as_of);
        let span = [
            self.forecast_range(as_of),
            self.pattern_range(as_of),
            self.optimization_range(as_of),
            scoring.previous(),
        ]
        .iter()
        .fold(scoring, |acc, r| {
            DateRange::new(acc.start.min(r.start), acc.end.max(r.end))
        });
        let records = self.records(org_id, span).await?;

        let metrics = self.metrics_from(org_id, &records, as_of).await?;
        let forecasts = self.forecast_from(&records, as_of, None)?;
        let patterns = self.patterns_from(&records, as_of)?;
        let optimizations = self.optimizations_from(&records, as_of)?;

        let daily = aggregate_daily(&records, scoring, self.offset()?)?;
        let trends = ExecutiveTrends {
            cost: build_trend_series(&daily, TrendMetric::Cost),
            usage: build_trend_series(&daily, TrendMetric::Usage),
            efficiency: build_trend_series(&daily, TrendMetric::Efficiency),
        };
        let insights = business_insights(&metrics, &patterns, &optimizations);

        debug!(
            patterns = patterns.len(),
            optimizations = optimizations.len(),
            insights = insights.len(),
            "Executive report generated"
        );

        Ok(ExecutiveReport {
            org_id,
            as_of,
            metrics,
            trends,
            forecasts,
            patterns,
            optimizations,
            insights,
            generated_at: Utc::now(),
        })
    }

    fn forecast_from(
        &self,
        records: &[UsageRecord],
        as_of: NaiveDate,
        days: Option<u32>,
    ) -> AnalyticsResult<Vec<Forecast>> {
        let config = &self.config.analytics.forecast;
        let history = aggregate_daily(records, self.forecast_range(as_of), self.offset()?)?;
        let days = days.unwrap_or(config.default_horizon_days);
        generate_forecast(&history, days, as_of, config)
    }

    fn patterns_from(
        &self,
        records: &[UsageRecord],
        as_of: NaiveDate,
    ) -> AnalyticsResult<Vec<Pattern>> {
        let daily = aggregate_daily(records, self.pattern_range(as_of), self.offset()?)?;
        patterns::detect_patterns(&daily, &self.config.analytics.patterns)
    }

    fn optimizations_from(
        &self,
        records: &[UsageRecord],
        as_of: NaiveDate,
    ) -> AnalyticsResult<Vec<CostOptimization>> {
        let config = &self.config.analytics.optimization;
        let providers =
            aggregate_by_provider(records, self.optimization_range(as_of), self.offset()?)?;
        Ok(optimization::recommend_optimizations(
            &providers,
            config.lookback_days,
            &self.config.providers,
            config,
        ))
    }

    async fn metrics_from(
        &self,
        org_id: Uuid,
        records: &[UsageRecord],
        as_of: NaiveDate,
    ) -> AnalyticsResult<ExecutiveMetrics> {
        let offset = self.offset()?;
        let range = self.scoring_range(as_of);

        let current = summarize(records, range, offset)?;
        let previous = summarize(records, range.previous(), offset)?;
        let providers = aggregate_by_provider(records, range, offset)?;
        let daily = aggregate_daily(records, range, offset)?;

        let budgets = self.governance.list_budgets(org_id).await?;
        let mut governance = self.governance.governance_signals(org_id, range).await?;
        governance.days_since_last_usage = self
            .usage
            .last_usage_at(org_id)
            .await?
            .map(|at| (as_of - at.with_timezone(&offset).date_naive()).num_days().max(0));

        if budgets.is_empty() {
            warn!(%org_id, "No budgets configured");
        }
        for budget in budgets.iter().filter(|b| b.is_alerting()) {
            warn!(
                %org_id,
                period = budget.period.as_str(),
                spent = budget.spent,
                amount = budget.amount,
                "Budget past its alert threshold"
            );
        }

        let metrics = compute_executive_metrics(
            &ScoringInput {
                current: &current,
                previous: &previous,
                providers: &providers,
                daily: &daily,
                budgets: &budgets,
                governance: &governance,
            },
            &self.config.providers,
            &self.config.analytics,
        );
        debug!(
            efficiency = metrics.efficiency,
            risk_score = metrics.risk_score,
            compliance_score = metrics.compliance_score,
            "Executive metrics computed"
        );
        Ok(metrics)
    }

    /// Records whose UTC date lies within `range` widened by a day on each
    /// side, enough for any day-boundary offset to regroup them.
    async fn records(&self, org_id: Uuid, range: DateRange) -> AnalyticsResult<Vec<UsageRecord>> {
        let fetch = DateRange::new(
            range.start.pred_opt().unwrap_or(range.start),
            range.end.succ_opt().unwrap_or(range.end),
        );
        let records = self.usage.list_records(org_id, fetch).await?;
        debug!(
            start = %fetch.start,
            end = %fetch.end,
            count = records.len(),
            "Fetched usage records"
        );
        Ok(records)
    }

    fn offset(&self) -> AnalyticsResult<FixedOffset> {
        day_boundary(self.config.analytics.utc_offset_minutes)
    }

    fn forecast_range(&self, as_of: NaiveDate) -> DateRange {
        DateRange::ending_at(as_of, self.config.analytics.forecast.history_days)
    }

    fn pattern_range(&self, as_of: NaiveDate) -> DateRange {
        DateRange::ending_at(as_of, self.config.analytics.patterns.lookback_days)
    }

    fn optimization_range(&self, as_of: NaiveDate) -> DateRange {
        DateRange::ending_at(as_of, self.config.analytics.optimization.lookback_days)
    }

    fn scoring_range(&self, as_of: NaiveDate) -> DateRange {
        DateRange::ending_at(as_of, self.config.analytics.scoring.lookback_days)
    }
}
