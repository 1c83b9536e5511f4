//! Cost analytics for AI usage records.
//!
//! Turns a stream of per-request usage records into daily series, cost
//! forecasts, detected usage patterns, optimization recommendations and an
//! executive health score. The analytical core in [`services`] is pure; all
//! data access goes through the repository traits in [`db`].

pub mod config;
pub mod db;
pub mod models;
#[cfg(feature = "cli")]
pub mod observability;
pub mod services;

#[cfg(test)]
mod tests;
