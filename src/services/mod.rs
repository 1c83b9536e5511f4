pub mod aggregation;
mod analytics;
mod error;
pub mod executive;
pub mod forecasting;
pub mod insights;
pub mod optimization;
pub mod patterns;
pub mod stats;
pub mod trends;

pub use aggregation::{aggregate_by_provider, aggregate_daily, day_boundary, summarize};
pub use analytics::AnalyticsService;
pub use error::{AnalyticsError, AnalyticsResult};
pub use executive::{ScoringInput, compute_executive_metrics};
pub use forecasting::{backtest_accuracy, generate_forecast};
pub use insights::business_insights;
pub use optimization::recommend_optimizations;
pub use patterns::{detect_anomalies, detect_patterns};
pub use trends::build_trend_series;
