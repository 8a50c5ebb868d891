//! Shipload Library
//!
//! This module exports the harness components for use in integration tests
//! and external tooling.

pub mod api;
pub mod config;
pub mod harness;
pub mod scenarios;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use harness::{Scenario, StopHandle};
pub use session::UserSession;
