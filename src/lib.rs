//! settle Library
//!
//! Waits for eventually-consistent device state by polling logs with a
//! bounded retry budget.

// Module declarations
pub mod config;
pub mod headless;

// Workspace crates, re-exported for the binary and integration tests
pub use settle_core as core;
pub use settle_device as device;

// Re-export main entry points
pub use headless::runner::{run_wait, WaitReport, WaitRequest};
pub use headless::HeadlessEvent;
