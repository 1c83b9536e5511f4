//! Executive dashboard scores.
//!
//! The point values below are business heuristics rather than derived
//! quantities. Scores are clamped to 0-100 and rounded to one decimal;
//! currency is rounded to cents.

use super::{
    aggregation::costs,
    forecasting::backtest_accuracy,
    optimization::provider_switches,
    stats::{mean, round1, round2, std_dev},
};
use crate::{
    config::{AnalyticsConfig, ProviderEfficiencyTable},
    models::{
        Budget, DailyBucket, ExecutiveMetrics, GovernanceSignals, ProviderSpend, UsageSummary,
    },
};

/// Daily points required before spend volatility contributes to risk.
const MIN_VOLATILITY_POINTS: usize = 10;

/// Alerts fired in the window above which risk increases.
const ALERT_STORM_THRESHOLD: u32 = 5;

/// Inputs to the executive scorer for one scoring window.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    /// Totals for the scoring window
    pub current: &'a UsageSummary,
    /// Totals for the equal-length window before it
    pub previous: &'a UsageSummary,
    /// Per-provider spend in the scoring window
    pub providers: &'a [ProviderSpend],
    /// Daily series covering the scoring window
    pub daily: &'a [DailyBucket],
    pub budgets: &'a [Budget],
    pub governance: &'a GovernanceSignals,
}

pub fn compute_executive_metrics(
    input: &ScoringInput<'_>,
    table: &ProviderEfficiencyTable,
    config: &AnalyticsConfig,
) -> ExecutiveMetrics {
    let efficiency = efficiency_score(input.current, input.previous, input.providers, table);
    let risk = risk_score(
        input.current.total_cost,
        input.budgets,
        input.providers,
        input.daily,
        input.governance.threshold_alerts_fired,
    );
    let compliance = compliance_score(input.governance, input.budgets);
    let accuracy = backtest_accuracy(input.daily, &config.forecast);
    let savings = savings_opportunity(
        input.current.total_cost,
        input.providers,
        table,
        config.scoring.usage_headroom_rate,
    );

    ExecutiveMetrics {
        efficiency: round1(efficiency),
        risk_score: round1(risk),
        forecast_accuracy: round1(accuracy),
        compliance_score: round1(compliance),
        savings_opportunity: savings,
    }
}

/// Base 50, up to +/-30 for cost-per-request change against the previous
/// window, plus up to 20 for a cost-weighted provider efficiency mix.
pub fn efficiency_score(
    current: &UsageSummary,
    previous: &UsageSummary,
    providers: &[ProviderSpend],
    table: &ProviderEfficiencyTable,
) -> f64 {
    let mut score: f64 = 50.0;

    if let (Some(current_cpr), Some(previous_cpr)) =
        (current.cost_per_request(), previous.cost_per_request())
        && previous_cpr > 0.0
    {
        let improvement = (previous_cpr - current_cpr) / previous_cpr * 100.0;
        score += improvement.clamp(-30.0, 30.0);
    }

    let total_cost: f64 = providers.iter().map(|p| p.total_cost).sum();
    if total_cost > 0.0 {
        let weighted: f64 = providers
            .iter()
            .map(|p| p.total_cost / total_cost * table.coefficient(&p.provider))
            .sum();
        score += weighted * 20.0;
    }

    score.clamp(0.0, 100.0)
}

/// Financial risk, lower is better.
pub fn risk_score(
    window_spend: f64,
    budgets: &[Budget],
    providers: &[ProviderSpend],
    daily: &[DailyBucket],
    threshold_alerts_fired: u32,
) -> f64 {
    let mut risk: f64 = 0.0;

    let total_budget: f64 = budgets.iter().map(|b| b.amount).sum();
    if total_budget > 0.0 {
        let utilization = window_spend / total_budget * 100.0;
        if utilization > 90.0 {
            risk += 40.0;
        } else if utilization > 75.0 {
            risk += 25.0;
        } else if utilization > 50.0 {
            risk += 10.0;
        }
    } else {
        risk += 30.0;
    }

    let provider_count = providers
        .iter()
        .filter(|p| p.request_count > 0 || p.total_cost > 0.0)
        .count();
    match provider_count {
        1 => risk += 30.0,
        2 => risk += 15.0,
        _ => {}
    }

    let active_days = daily.iter().filter(|d| d.is_active()).count();
    if active_days > MIN_VOLATILITY_POINTS {
        let values = costs(daily);
        let (sd, avg) = (std_dev(&values), mean(&values));
        if sd > avg * 2.0 {
            risk += 20.0;
        } else if sd > avg {
            risk += 10.0;
        }
    }

    if threshold_alerts_fired > ALERT_STORM_THRESHOLD {
        risk += 10.0;
    }

    risk.clamp(0.0, 100.0)
}

/// Governance completeness, starting at 100 and deducting for gaps.
pub fn compliance_score(governance: &GovernanceSignals, budgets: &[Budget]) -> f64 {
    let mut score: f64 = 100.0;

    if governance.api_key_count == 0 {
        score -= 30.0;
    }
    if budgets.is_empty() {
        score -= 20.0;
    }
    if governance.alert_rule_count == 0 {
        score -= 15.0;
    }
    match governance.days_since_last_usage {
        Some(days) if days > 7 => score -= 10.0,
        Some(days) if days > 3 => score -= 5.0,
        _ => {}
    }
    if governance.team_size == 1 {
        score -= 10.0;
    }

    score.clamp(0.0, 100.0)
}

/// Provider-switch savings plus a flat share of window spend.
pub fn savings_opportunity(
    window_spend: f64,
    providers: &[ProviderSpend],
    table: &ProviderEfficiencyTable,
    headroom_rate: f64,
) -> f64 {
    if window_spend <= 0.0 {
        return 0.0;
    }
    let switch_savings: f64 = provider_switches(providers, table)
        .iter()
        .map(|o| o.savings_potential)
        .sum();
    round2(switch_savings + window_spend * headroom_rate)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;

    use super::*;
    use crate::models::BudgetPeriod;

    fn summary(total_cost: f64, request_count: u64) -> UsageSummary {
        UsageSummary {
            total_cost,
            request_count,
            ..Default::default()
        }
    }

    fn spend(provider: &str, total_cost: f64) -> ProviderSpend {
        ProviderSpend {
            provider: provider.to_string(),
            total_cost,
            total_tokens: 0,
            request_count: 1,
        }
    }

    fn budget(amount: f64) -> Budget {
        Budget {
            amount,
            period: BudgetPeriod::Monthly,
            spent: 0.0,
            alert_threshold: 0.8,
        }
    }

    fn series(costs: &[f64]) -> Vec<DailyBucket> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| DailyBucket {
                date: start + Duration::days(i as i64),
                cost,
                tokens: 0,
                request_count: u64::from(cost > 0.0),
            })
            .collect()
    }

    fn governed() -> GovernanceSignals {
        GovernanceSignals {
            api_key_count: 3,
            alert_rule_count: 2,
            team_size: 5,
            threshold_alerts_fired: 0,
            days_since_last_usage: Some(0),
        }
    }

    #[test]
    fn test_efficiency_improvement_capped() {
        let table = ProviderEfficiencyTable::default();
        let providers = [spend("gemini", 10.0)];

        // cost per request halved: +50% improvement, capped at +30
        let score = efficiency_score(&summary(10.0, 10), &summary(20.0, 10), &providers, &table);
        assert_eq!(score, 100.0);

        // cost per request doubled: -100%, capped at -30
        let score = efficiency_score(&summary(40.0, 10), &summary(20.0, 10), &providers, &table);
        assert_eq!(score, 40.0);
    }

    #[test]
    fn test_efficiency_provider_mix() {
        let table = ProviderEfficiencyTable::default();
        // 50/50 openai (0.6) and gemini (1.0): 0.8 * 20 = 16
        let providers = [spend("openai", 50.0), spend("gemini", 50.0)];
        let score = efficiency_score(&summary(100.0, 10), &summary(0.0, 0), &providers, &table);
        assert!((score - 66.0).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_without_history_or_spend() {
        let table = ProviderEfficiencyTable::default();
        let score = efficiency_score(&summary(0.0, 0), &summary(0.0, 0), &[], &table);
        assert_eq!(score, 50.0);
    }

    #[rstest]
    #[case(95.0, 40.0)]
    #[case(80.0, 25.0)]
    #[case(60.0, 10.0)]
    #[case(50.0, 0.0)]
    fn test_risk_budget_utilization(#[case] spend_amount: f64, #[case] expected: f64) {
        let providers = [spend("a", 1.0), spend("b", 1.0), spend("c", 1.0)];
        let risk = risk_score(spend_amount, &[budget(100.0)], &providers, &[], 0);
        assert_eq!(risk, expected);
    }

    #[test]
    fn test_risk_no_budget_single_provider() {
        let risk = risk_score(10.0, &[], &[spend("openai", 10.0)], &[], 0);
        assert_eq!(risk, 60.0);

        let risk = risk_score(10.0, &[], &[spend("openai", 5.0), spend("claude", 5.0)], &[], 0);
        assert_eq!(risk, 45.0);
    }

    #[test]
    fn test_risk_volatility_needs_enough_points() {
        let providers = [spend("a", 1.0), spend("b", 1.0), spend("c", 1.0)];

        // One large day among quiet ones: std dev above twice the mean
        let mut costs = vec![1.0; 20];
        costs[10] = 200.0;
        let risk = risk_score(1.0, &[budget(1000.0)], &providers, &series(&costs), 0);
        assert_eq!(risk, 20.0);

        let risk = risk_score(1.0, &[budget(1000.0)], &providers, &series(&costs[5..15]), 0);
        assert_eq!(risk, 0.0);
    }

    #[test]
    fn test_risk_alerts_and_clamp() {
        let risk = risk_score(1000.0, &[budget(10.0)], &[spend("openai", 1.0)], &[], 6);
        assert_eq!(risk, 80.0);

        let mut costs = vec![1.0; 20];
        costs[3] = 500.0;
        let daily = series(&costs);
        let risk = risk_score(1000.0, &[budget(10.0)], &[spend("openai", 1.0)], &daily, 6);
        assert_eq!(risk, 100.0);
    }

    #[test]
    fn test_compliance_fully_governed() {
        assert_eq!(compliance_score(&governed(), &[budget(100.0)]), 100.0);
    }

    #[test]
    fn test_compliance_deductions() {
        let bare = GovernanceSignals {
            team_size: 1,
            days_since_last_usage: Some(10),
            ..Default::default()
        };
        // 100 - 30 - 20 - 15 - 10 - 10
        assert_eq!(compliance_score(&bare, &[]), 15.0);
    }

    #[rstest]
    #[case(None, 100.0)]
    #[case(Some(3), 100.0)]
    #[case(Some(4), 95.0)]
    #[case(Some(7), 95.0)]
    #[case(Some(8), 90.0)]
    fn test_compliance_freshness(#[case] days: Option<i64>, #[case] expected: f64) {
        let signals = GovernanceSignals {
            days_since_last_usage: days,
            ..governed()
        };
        assert_eq!(compliance_score(&signals, &[budget(1.0)]), expected);
    }

    #[test]
    fn test_savings_opportunity() {
        let table = ProviderEfficiencyTable::default();
        let providers = [spend("openai", 100.0), spend("gemini", 100.0)];
        // openai switch saves 40, plus 10% of 200
        assert_eq!(savings_opportunity(200.0, &providers, &table, 0.1), 60.0);
        assert_eq!(savings_opportunity(0.0, &providers, &table, 0.1), 0.0);
    }

    #[test]
    fn test_compute_executive_metrics_rounding() {
        let table = ProviderEfficiencyTable::default();
        let config = AnalyticsConfig::default();
        let current = summary(90.0, 30);
        let previous = summary(100.0, 30);
        let providers = [spend("claude", 45.0), spend("gemini", 45.0)];
        let daily = series(&[3.0; 30]);
        let governance = governed();
        let budgets = [budget(300.0)];

        let metrics = compute_executive_metrics(
            &ScoringInput {
                current: &current,
                previous: &previous,
                providers: &providers,
                daily: &daily,
                budgets: &budgets,
                governance: &governance,
            },
            &table,
            &config,
        );

        // 50 + 10 (cpr improved 10%) + 20 * (0.5 * 0.85 + 0.5 * 1.0)
        assert_eq!(metrics.efficiency, 78.5);
        // two providers
        assert_eq!(metrics.risk_score, 15.0);
        assert_eq!(metrics.forecast_accuracy, 100.0);
        assert_eq!(metrics.compliance_score, 100.0);
        // claude saves 6.75, plus 9.0 headroom
        assert_eq!(metrics.savings_opportunity, 15.75);
    }
}
