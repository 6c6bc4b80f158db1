//! Rule action taxonomy
//!
//! Actions are what a rule does once its condition holds. `allow`, `deny`
//! and `modify` carry the core semantics; the remaining kinds are extension
//! points that succeed, carry their message, and tag result metadata so an
//! embedding system can intercept them without changing the pipeline.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// The effect taken when a rule's condition holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    /// Human-readable message surfaced in results
    pub message: String,

    /// Rewrite template for `modify` actions; must contain the `{query}`
    /// placeholder for the running query text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Closed set of action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Allow,
    Deny,
    Modify,
    Log,
    Notify,
    Alert,
    Escalate,
    Retry,
    Fallback,
    Rollback,
    Throttle,
    Cache,
    Optimize,
    Profiling,
    Validation,
    Cleansing,
    Enrichment,
    Aggregation,
}

impl ActionKind {
    /// Metadata flag name set by the extension-point dispatcher,
    /// e.g. `{"logged": true}` for `log`.
    pub fn metadata_flag(&self) -> &'static str {
        match self {
            ActionKind::Allow => "allowed",
            ActionKind::Deny => "denied",
            ActionKind::Modify => "modified",
            ActionKind::Log => "logged",
            ActionKind::Notify => "notified",
            ActionKind::Alert => "alerted",
            ActionKind::Escalate => "escalated",
            ActionKind::Retry => "retried",
            ActionKind::Fallback => "fallback",
            ActionKind::Rollback => "rollback",
            ActionKind::Throttle => "throttled",
            ActionKind::Cache => "cached",
            ActionKind::Optimize => "optimized",
            ActionKind::Profiling => "profiled",
            ActionKind::Validation => "validated",
            ActionKind::Cleansing => "cleansed",
            ActionKind::Enrichment => "enriched",
            ActionKind::Aggregation => "aggregated",
        }
    }
}

impl Action {
    pub fn allow(message: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Allow,
            message: message.into(),
            code: None,
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Deny,
            message: message.into(),
            code: None,
        }
    }

    pub fn modify(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Modify,
            message: message.into(),
            code: Some(code.into()),
        }
    }

    pub fn of_kind(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.kind == ActionKind::Modify && self.code.as_deref().unwrap_or("").is_empty() {
            return Err(CoreError::Validation(
                "modify action requires rewrite code".to_string(),
            ));
        }
        Ok(())
    }
}
