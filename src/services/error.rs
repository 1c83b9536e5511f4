use crate::db::DbError;

/// Errors returned by the analytics layer.
///
/// Sparse data is never an error: components fall back to explicitly flagged
/// low-confidence defaults instead. Only contract violations by the caller
/// and repository failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
