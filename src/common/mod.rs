//! Common utilities shared by the CLI, the engine and the scenario

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
