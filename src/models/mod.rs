mod analytics;
mod budget;
mod usage;
mod validators;

pub use analytics::*;
pub use budget::*;
pub use usage::*;
pub use validators::{validate_amount, validate_fraction};
