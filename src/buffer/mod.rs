pub mod batch;
pub mod truncate;

pub use batch::{Batch, BatchBuffer, BatchConfig};
pub use truncate::{TRUNCATION_MARKER, Truncated, truncate_to_budget};
