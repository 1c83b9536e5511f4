//! Cost-saving opportunities ranked by potential savings.

use super::stats::round2;
use crate::{
    config::{OptimizationConfig, ProviderEfficiencyTable},
    models::{CostOptimization, ProviderSpend},
};

pub const BATCH_PROCESSING: &str = "batch-processing";
pub const RESPONSE_CACHING: &str = "response-caching";

const BATCH_CONFIDENCE: f64 = 0.8;
const CACHING_CONFIDENCE: f64 = 0.7;

/// Rank provider-switch, batching and caching opportunities for the
/// per-provider spend of a `window_days` lookback window.
///
/// Results are sorted by `savings_potential`, highest first. Every entry
/// satisfies `optimal_cost <= current_cost` and `savings_potential >= 0`.
pub fn recommend_optimizations(
    providers: &[ProviderSpend],
    window_days: u32,
    table: &ProviderEfficiencyTable,
    config: &OptimizationConfig,
) -> Vec<CostOptimization> {
    let mut recommendations = provider_switches(providers, table);

    let total_cost: f64 = providers.iter().map(|p| p.total_cost).sum();
    let total_requests: u64 = providers.iter().map(|p| p.request_count).sum();

    if total_cost > 0.0 && total_requests > config.batch_request_threshold {
        recommendations.push(scaled_optimization(
            BATCH_PROCESSING,
            total_cost,
            config.batch_savings_rate,
            "Consider batching similar requests to reduce API calls and costs",
            BATCH_CONFIDENCE,
        ));
    }

    let avg_daily_requests = total_requests as f64 / f64::from(window_days.max(1));
    if total_cost > 0.0 && avg_daily_requests > config.caching_daily_request_threshold {
        recommendations.push(scaled_optimization(
            RESPONSE_CACHING,
            total_cost,
            config.caching_savings_rate,
            "Implement response caching for frequently repeated queries",
            CACHING_CONFIDENCE,
        ));
    }

    recommendations.sort_by(|a, b| b.savings_potential.total_cmp(&a.savings_potential));
    recommendations
}

/// Savings from moving each provider's spend to the most efficient
/// coefficient in the table.
pub fn provider_switches(
    providers: &[ProviderSpend],
    table: &ProviderEfficiencyTable,
) -> Vec<CostOptimization> {
    let best = table.best_coefficient();

    providers
        .iter()
        .filter(|p| p.total_cost > 0.0)
        .filter_map(|p| {
            let coefficient = table.coefficient(&p.provider);
            if coefficient >= best {
                return None;
            }

            // Round both legs first so the reported savings add up exactly
            let current_cost = round2(p.total_cost);
            let optimal_cost = round2(p.total_cost * coefficient / best).min(current_cost);

            Some(CostOptimization {
                provider: p.provider.clone(),
                current_cost,
                optimal_cost,
                savings_potential: round2(current_cost - optimal_cost).max(0.0),
                recommendation: table.recommendation(&p.provider).to_string(),
                confidence: round2(0.75 + 0.25 * coefficient),
            })
        })
        .collect()
}

fn scaled_optimization(
    provider: &str,
    total_cost: f64,
    savings_rate: f64,
    recommendation: &str,
    confidence: f64,
) -> CostOptimization {
    let current_cost = round2(total_cost);
    let optimal_cost = round2(total_cost * (1.0 - savings_rate)).min(current_cost);

    CostOptimization {
        provider: provider.to_string(),
        current_cost,
        optimal_cost,
        savings_potential: round2(current_cost - optimal_cost).max(0.0),
        recommendation: recommendation.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::ProviderEfficiency;

    fn spend(provider: &str, total_cost: f64, request_count: u64) -> ProviderSpend {
        ProviderSpend {
            provider: provider.to_string(),
            total_cost,
            total_tokens: 0,
            request_count,
        }
    }

    fn recommend(providers: &[ProviderSpend]) -> Vec<CostOptimization> {
        recommend_optimizations(
            providers,
            30,
            &ProviderEfficiencyTable::default(),
            &OptimizationConfig::default(),
        )
    }

    #[test]
    fn test_provider_switch_savings() {
        let recs = recommend(&[
            spend("openai", 100.0, 10),
            spend("claude", 40.0, 10),
            spend("gemini", 80.0, 10),
        ]);

        assert_eq!(recs.len(), 2);
        let openai = &recs[0];
        assert_eq!(openai.provider, "openai");
        assert_eq!(openai.current_cost, 100.0);
        assert_eq!(openai.optimal_cost, 60.0);
        assert_eq!(openai.savings_potential, 40.0);
        assert_eq!(openai.confidence, 0.9);
        assert!(openai.recommendation.contains("Gemini"));

        let claude = &recs[1];
        assert_eq!(claude.optimal_cost, 34.0);
        assert_eq!(claude.savings_potential, 6.0);
    }

    #[test]
    fn test_unknown_provider_uses_default_coefficient() {
        let recs = recommend(&[spend("mistral", 10.0, 1)]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].optimal_cost, 7.0);
        assert_eq!(recs[0].savings_potential, 3.0);
        assert_eq!(
            recs[0].recommendation,
            "Review usage patterns to optimize model selection"
        );
    }

    #[test]
    fn test_zero_cost_providers_skipped() {
        assert!(recommend(&[spend("openai", 0.0, 5)]).is_empty());
        assert!(recommend(&[]).is_empty());
    }

    #[test]
    fn test_batch_processing_above_threshold() {
        let recs = recommend(&[spend("gemini", 200.0, 1001)]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].provider, BATCH_PROCESSING);
        assert_eq!(recs[0].current_cost, 200.0);
        assert_eq!(recs[0].optimal_cost, 140.0);
        assert_eq!(recs[0].savings_potential, 60.0);
        assert_eq!(recs[0].confidence, 0.8);

        assert!(recommend(&[spend("gemini", 200.0, 1000)]).is_empty());
    }

    #[test]
    fn test_response_caching_on_high_daily_volume() {
        let recs = recommend(&[spend("gemini", 300.0, 31_000)]);
        let providers: Vec<&str> = recs.iter().map(|r| r.provider.as_str()).collect();
        assert_eq!(providers, vec![BATCH_PROCESSING, RESPONSE_CACHING]);
        assert_eq!(recs[1].savings_potential, 45.0);
        assert_eq!(recs[1].confidence, 0.7);
    }

    #[test]
    fn test_sorted_by_savings() {
        let recs = recommend(&[
            spend("grok", 10.0, 400),
            spend("openai", 500.0, 400),
            spend("claude", 50.0, 400),
        ]);
        for pair in recs.windows(2) {
            assert!(pair[0].savings_potential >= pair[1].savings_potential);
        }
        assert_eq!(recs[0].provider, "openai");
        assert_eq!(recs[1].provider, BATCH_PROCESSING);
    }

    #[rstest]
    #[case(0.004)]
    #[case(0.01)]
    #[case(1.2345)]
    #[case(99_999.999)]
    fn test_never_negative_savings(#[case] cost: f64) {
        let recs = recommend(&[
            spend("openai", cost, 2000),
            spend("claude", cost, 2000),
            spend("unknown", cost, 2000),
        ]);
        for rec in &recs {
            assert!(rec.optimal_cost <= rec.current_cost, "{rec:?}");
            assert!(rec.savings_potential >= 0.0, "{rec:?}");
            assert!((0.0..=1.0).contains(&rec.confidence));
        }
    }

    #[test]
    fn test_custom_table_reference() {
        let mut table = ProviderEfficiencyTable {
            default_coefficient: 0.5,
            providers: Default::default(),
        };
        table.providers.insert(
            "local".into(),
            ProviderEfficiency {
                coefficient: 0.8,
                recommendation: None,
            },
        );

        // "local" is the best available, so only "cloud" is scaled toward it
        let recs = recommend_optimizations(
            &[spend("local", 50.0, 1), spend("cloud", 80.0, 1)],
            30,
            &table,
            &OptimizationConfig::default(),
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].provider, "cloud");
        assert_eq!(recs[0].optimal_cost, 50.0);
        assert_eq!(recs[0].savings_potential, 30.0);
    }
}
