//! Plain-language insights for the executive dashboard.

use crate::models::{
    BusinessInsight, CostOptimization, ExecutiveMetrics, Impact, InsightKind, Pattern,
};

pub const MAX_INSIGHTS: usize = 6;

/// Derive at most [`MAX_INSIGHTS`] insights, in priority order: efficiency,
/// risk, savings, high-impact patterns, top optimization, compliance and
/// forecast accuracy.
///
/// `optimizations` is expected to be ranked by savings, as returned by
/// [`super::recommend_optimizations`].
pub fn business_insights(
    metrics: &ExecutiveMetrics,
    patterns: &[Pattern],
    optimizations: &[CostOptimization],
) -> Vec<BusinessInsight> {
    let mut insights = Vec::new();

    if metrics.efficiency > 80.0 {
        insights.push(insight(
            InsightKind::Success,
            "Excellent Cost Efficiency",
            format!(
                "Your organization is operating at {:.1}% efficiency, well above industry average",
                metrics.efficiency
            ),
            Some(format!("{:.1}%", metrics.efficiency)),
        ));
    } else if metrics.efficiency < 60.0 {
        insights.push(insight(
            InsightKind::Warning,
            "Efficiency Improvement Needed",
            format!(
                "Current efficiency at {:.1}%. Review optimization recommendations to improve",
                metrics.efficiency
            ),
            Some(format!("{:.1}%", metrics.efficiency)),
        ));
    }

    if metrics.risk_score > 60.0 {
        insights.push(insight(
            InsightKind::Danger,
            "High Financial Risk Detected",
            "Consider implementing budget controls and diversifying AI providers".to_string(),
            Some(format!("Risk: {}", metrics.risk_score)),
        ));
    } else if metrics.risk_score < 30.0 {
        insights.push(insight(
            InsightKind::Success,
            "Low Risk Profile",
            "Your AI spending is well-controlled with good provider diversity".to_string(),
            Some(format!("Risk: {}", metrics.risk_score)),
        ));
    }

    if metrics.savings_opportunity > 100.0 {
        insights.push(insight(
            InsightKind::Info,
            "Significant Savings Available",
            format!(
                "Potential monthly savings of ${:.2} identified through optimization",
                metrics.savings_opportunity
            ),
            Some(format!("${:.2}", metrics.savings_opportunity)),
        ));
    }

    if let Some(pattern) = patterns.iter().find(|p| p.impact == Impact::High) {
        insights.push(insight(
            InsightKind::Warning,
            "Usage Patterns Detected",
            pattern.description.clone(),
            Some("Review".to_string()),
        ));
    }

    if let Some(top) = optimizations.first()
        && top.savings_potential > 50.0
    {
        insights.push(insight(
            InsightKind::Info,
            "Top Optimization Opportunity",
            top.recommendation.clone(),
            Some(format!("Save ${:.2}", top.savings_potential)),
        ));
    }

    if metrics.compliance_score < 70.0 {
        insights.push(insight(
            InsightKind::Warning,
            "Compliance Score Below Target",
            "Configure budgets and alerts to improve governance".to_string(),
            Some(format!("{}%", metrics.compliance_score)),
        ));
    }

    if metrics.forecast_accuracy > 85.0 {
        insights.push(insight(
            InsightKind::Success,
            "Accurate Cost Forecasting",
            format!(
                "Predictions are {:.1}% accurate based on historical data",
                metrics.forecast_accuracy
            ),
            Some(format!("{:.1}%", metrics.forecast_accuracy)),
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

fn insight(
    kind: InsightKind,
    title: &str,
    message: String,
    metric: Option<String>,
) -> BusinessInsight {
    BusinessInsight {
        kind,
        title: title.to_string(),
        message,
        metric,
    }
}
