//! Shared types, errors, and configuration for Stockledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency codes and the `Money` value type
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, LoggingConfig, RatesConfig, SequenceGranularity};
pub use error::{AppError, AppResult};
