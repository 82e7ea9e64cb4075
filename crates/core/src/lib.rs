//! Core business logic for Spendgate.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and routing decisions live here.
//!
//! # Modules
//!
//! - `workflow` - Approval routing and report state transitions
//! - `report` - Drafting rules for reports and their expense lines

pub mod report;
pub mod workflow;
