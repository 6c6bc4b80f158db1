//! Semgate Core - Core types for the Semgate governance engine
//!
//! This crate provides the fundamental types used across the Semgate ecosystem:
//! - Value types for runtime data
//! - The rule data model (rules, conditions, actions, templates, rule sets)
//! - The condition-expression AST
//! - Execution context and result types
//! - Error types

pub mod ast;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::Value;
