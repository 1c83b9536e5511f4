mod governance;
mod usage;

use chrono::{Days, NaiveDate};
pub use governance::*;
pub use usage::*;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` calendar days ending at (and including) `end`.
    ///
    /// A zero-length window collapses to the single day `end`.
    pub fn ending_at(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// The window of equal length immediately before this one.
    pub fn previous(&self) -> Self {
        let len = self.days().max(1) as u64;
        let end = self
            .start
            .checked_sub_days(Days::new(1))
            .unwrap_or(NaiveDate::MIN);
        let start = end
            .checked_sub_days(Days::new(len - 1))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Number of calendar days covered, 0 when `start > end`.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
