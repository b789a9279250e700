//! HTTP transport for the tracery conversion service.

pub mod api;
pub mod metrics;
pub mod state;
pub mod sweeper;
