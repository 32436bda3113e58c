//! Shared types, errors, and configuration for Souk.
//!
//! This crate provides common types used across all other crates:
//! - Whole-unit money rounding helpers
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LogConfig};
pub use error::{AppError, AppResult, ErrorBody};
