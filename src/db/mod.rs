//! Data-access seam between the analytics layer and storage.
//!
//! The analytics services depend only on the repository traits in [`repos`];
//! [`MemoryStore`] serves datasets loaded from JSON (or CSV) files.

mod error;
mod memory;
pub mod repos;

pub use error::{DbError, DbResult};
pub use memory::{Dataset, MemoryStore};
pub use repos::*;
