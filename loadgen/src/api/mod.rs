//! Client adapter and wire models for the target platform

pub mod client;
pub mod models;

pub use client::{ApiClient, ApiError};
