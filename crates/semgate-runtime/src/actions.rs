//! Action dispatch
//!
//! Runs the action of a rule whose condition held. `allow` and `deny`
//! succeed/fail immediately; `modify` substitutes the running query into
//! its rewrite template and hands the rewritten text back through result
//! metadata. Every other kind is an extension point: it succeeds, carries
//! its message, and tags metadata so an embedding system can intercept it.

use crate::error::{EngineError, Result};
use semgate_core::ast::{Action, ActionKind};
use semgate_core::Value;
use std::collections::HashMap;

/// Placeholder in `modify` rewrite templates for the running query text
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Metadata key carrying the rewritten query out of a `modify` dispatch
pub const MODIFIED_QUERY_KEY: &str = "modifiedQuery";

/// Outcome of dispatching one action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Success becomes the rule's pass; failure its fail
    pub success: bool,
    pub message: String,
    pub metadata: Option<HashMap<String, Value>>,
}

/// Dispatch an action against the current query text.
pub fn dispatch(action: &Action, query: &str) -> Result<ActionOutcome> {
    match action.kind {
        ActionKind::Allow => Ok(ActionOutcome {
            success: true,
            message: action.message.clone(),
            metadata: None,
        }),

        ActionKind::Deny => Ok(ActionOutcome {
            success: false,
            message: action.message.clone(),
            metadata: None,
        }),

        ActionKind::Modify => {
            let code = action.code.as_deref().ok_or_else(|| {
                EngineError::Evaluation("modify action has no rewrite code".to_string())
            })?;
            let rewritten = code.replace(QUERY_PLACEHOLDER, query);
            let mut metadata = HashMap::new();
            metadata.insert(MODIFIED_QUERY_KEY.to_string(), Value::String(rewritten));
            Ok(ActionOutcome {
                success: true,
                message: action.message.clone(),
                metadata: Some(metadata),
            })
        }

        // Extension points: succeed, tag metadata with the action's flag
        ActionKind::Log
        | ActionKind::Notify
        | ActionKind::Alert
        | ActionKind::Escalate
        | ActionKind::Retry
        | ActionKind::Fallback
        | ActionKind::Rollback
        | ActionKind::Throttle
        | ActionKind::Cache
        | ActionKind::Optimize
        | ActionKind::Profiling
        | ActionKind::Validation
        | ActionKind::Cleansing
        | ActionKind::Enrichment
        | ActionKind::Aggregation => {
            let mut metadata = HashMap::new();
            metadata.insert(action.kind.metadata_flag().to_string(), Value::Bool(true));
            Ok(ActionOutcome {
                success: true,
                message: action.message.clone(),
                metadata: Some(metadata),
            })
        }
    }
}
