//! In-memory repositories backed by datasets loaded from disk.
//!
//! A dataset is a JSON document describing one organization:
//!
//! ```json
//! {
//!   "org_id": "5b0c8f0e-0000-4000-8000-000000000001",
//!   "records": [
//!     {"timestamp": "2024-03-01T09:30:00Z", "provider": "openai",
//!      "model": "gpt-4o", "cost": 1.25, "total_tokens": 5200}
//!   ],
//!   "budgets": [{"amount": 500.0, "period": "monthly", "spent": 120.0}],
//!   "api_key_count": 2,
//!   "alert_rule_count": 1,
//!   "team_size": 4,
//!   "threshold_alerts": ["2024-03-12T10:00:00Z"]
//! }
//! ```

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    error::{DbError, DbResult},
    repos::{DateRange, GovernanceRepo, UsageRepo},
};
use crate::models::{Budget, GovernanceSignals, UsageRecord};

/// Everything known about one organization's usage and governance setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default = "Uuid::new_v4")]
    pub org_id: Uuid,
    #[serde(default)]
    pub records: Vec<UsageRecord>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub api_key_count: u32,
    #[serde(default)]
    pub alert_rule_count: u32,
    #[serde(default)]
    pub team_size: u32,
    /// When cost-threshold alerts fired
    #[serde(default)]
    pub threshold_alerts: Vec<DateTime<Utc>>,
}

impl Dataset {
    pub fn from_json_str(contents: &str) -> DbResult<Self> {
        let dataset: Dataset = serde_json::from_str(contents)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Replace the dataset's records with those read from a CSV file.
    ///
    /// The header row must name the `UsageRecord` fields; token columns may
    /// be omitted.
    #[cfg(feature = "csv")]
    pub fn with_csv_records(mut self, path: impl AsRef<Path>) -> DbResult<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<UsageRecord>, _>>()?;
        self.records = records;
        self.validate()?;
        Ok(self)
    }

    /// Reject records and budgets that violate their field constraints.
    pub fn validate(&self) -> DbResult<()> {
        for (index, record) in self.records.iter().enumerate() {
            record
                .validate()
                .map_err(|e| DbError::Validation(format!("records[{index}]: {e}")))?;
        }
        for (index, budget) in self.budgets.iter().enumerate() {
            budget
                .validate()
                .map_err(|e| DbError::Validation(format!("budgets[{index}]: {e}")))?;
        }
        Ok(())
    }
}

/// Read-only store serving one or more datasets.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    datasets: HashMap<Uuid, Dataset>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset, replacing any existing one for the same organization.
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.insert(dataset.org_id, dataset);
        self
    }

    pub fn org_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.datasets.keys().copied()
    }

    fn dataset(&self, org_id: Uuid) -> DbResult<&Dataset> {
        self.datasets.get(&org_id).ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl UsageRepo for MemoryStore {
    async fn list_records(&self, org_id: Uuid, range: DateRange) -> DbResult<Vec<UsageRecord>> {
        let dataset = self.dataset(org_id)?;
        Ok(dataset
            .records
            .iter()
            .filter(|r| range.contains(r.timestamp.date_naive()))
            .cloned()
            .collect())
    }

    async fn last_usage_at(&self, org_id: Uuid) -> DbResult<Option<DateTime<Utc>>> {
        let dataset = self.dataset(org_id)?;
        Ok(dataset.records.iter().map(|r| r.timestamp).max())
    }
}

#[async_trait]
impl GovernanceRepo for MemoryStore {
    async fn list_budgets(&self, org_id: Uuid) -> DbResult<Vec<Budget>> {
        Ok(self.dataset(org_id)?.budgets.clone())
    }

    async fn governance_signals(
        &self,
        org_id: Uuid,
        range: DateRange,
    ) -> DbResult<GovernanceSignals> {
        let dataset = self.dataset(org_id)?;
        let threshold_alerts_fired = dataset
            .threshold_alerts
            .iter()
            .filter(|fired_at| range.contains(fired_at.date_naive()))
            .count();

        Ok(GovernanceSignals {
            api_key_count: dataset.api_key_count,
            alert_rule_count: dataset.alert_rule_count,
            team_size: dataset.team_size,
            threshold_alerts_fired: u32::try_from(threshold_alerts_fired).unwrap_or(u32::MAX),
            days_since_last_usage: None,
        })
    }
}
