//! Bounded parallel execution of conversion jobs.

mod coordinator;

pub use coordinator::{BatchCoordinator, BatchResult, BatchSummary};
