use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DateRange;
use crate::{db::error::DbResult, models::UsageRecord};

/// Source of raw usage records, already scoped to one organization per call.
#[async_trait]
pub trait UsageRepo: Send + Sync {
    /// Records whose UTC timestamp falls on a day in `range`.
    ///
    /// Implementations may return records slightly outside the range (e.g. to
    /// cover non-UTC day boundaries); the aggregator drops them. Order is
    /// unspecified.
    async fn list_records(&self, org_id: Uuid, range: DateRange) -> DbResult<Vec<UsageRecord>>;

    /// Timestamp of the organization's most recent usage record, if any.
    async fn last_usage_at(&self, org_id: Uuid) -> DbResult<Option<DateTime<Utc>>>;
}
