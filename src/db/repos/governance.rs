use async_trait::async_trait;
use uuid::Uuid;

use super::DateRange;
use crate::{
    db::error::DbResult,
    models::{Budget, GovernanceSignals},
};

/// Source of budget configuration and configuration-completeness signals.
#[async_trait]
pub trait GovernanceRepo: Send + Sync {
    async fn list_budgets(&self, org_id: Uuid) -> DbResult<Vec<Budget>>;

    /// Signals for the scoring window. `threshold_alerts_fired` counts alerts
    /// fired inside `range`.
    async fn governance_signals(&self, org_id: Uuid, range: DateRange)
    -> DbResult<GovernanceSignals>;
}
