//! Shared types, errors, and configuration for Spendgate.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Money amounts with decimal precision
//! - Pagination types for list queries
//! - The verified actor context handed to the approval engine
//! - Application-wide error types
//! - Configuration management

pub mod actor;
pub mod config;
pub mod error;
pub mod types;

pub use actor::{ActorContext, Role};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
