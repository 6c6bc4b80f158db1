//! Semgate Runtime - rule evaluation engine and lifecycle management
//!
//! This crate turns a query [`ExecutionContext`] into an
//! [`EngineResponse`]: it filters applicable rules, orders them by
//! priority, evaluates conditions, dispatches actions, and aggregates
//! per-rule results into an overall allow/deny/modify decision. It also
//! owns the rule lifecycle: validation, conflict detection, template
//! instantiation, and persistence through an injected repository.
//!
//! [`ExecutionContext`]: semgate_core::types::ExecutionContext
//! [`EngineResponse`]: semgate_core::types::EngineResponse

pub mod actions;
pub mod conditions;
pub mod engine;
pub mod environment;
pub mod error;
pub mod eval;
pub mod store;

// Re-export main types
pub use actions::{ActionOutcome, QUERY_PLACEHOLDER};
pub use engine::{EngineStats, ImportReport, RuleEngine};
pub use environment::Environment;
pub use error::{EngineError, Result};
pub use store::{RuleFilter, RuleStore};
