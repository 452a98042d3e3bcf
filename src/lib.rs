//! Load test for the qatools cars API
//!
//! Each iteration logs in, forwards the access token to the cars listing and
//! validates both responses, recording time-to-first-byte trends. A summary
//! is rendered to HTML and to the console once the run finishes.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scenario::{CarsScenario, IterationError};
