//! Evaluation result types
//!
//! `ExecutionResult` is the per-rule outcome; `EngineResponse` aggregates a
//! whole evaluation run into the final allow/deny decision.

use crate::ast::{ActionKind, Severity};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-rule evaluation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub rule_id: String,

    pub rule_name: String,

    /// Whether the rule's net effect passed. A rule whose condition did not
    /// match passes trivially; a matched rule takes its action's outcome.
    pub passed: bool,

    /// Severity of the rule, present only when the rule matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Action taken, present only when the rule matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,

    pub execution_time_ms: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl ExecutionResult {
    /// Result for a rule whose condition did not match.
    pub fn not_matched(rule_id: &str, rule_name: &str, execution_time_ms: f64) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            passed: true,
            severity: None,
            message: None,
            action: None,
            execution_time_ms,
            metadata: None,
        }
    }
}

/// Aggregate decision for one evaluated query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    /// Overall decision
    pub allowed: bool,

    /// The (possibly rewritten) query, present only when allowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Per-rule results in evaluation order
    pub results: Vec<ExecutionResult>,

    pub warnings: Vec<String>,

    pub errors: Vec<String>,

    pub execution_time_ms: f64,

    pub stats: ResponseStats,
}

/// Counters over one evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub rules_evaluated: usize,
    pub rules_passed: usize,
    pub rules_failed: usize,
    pub rules_blocked: usize,
}

impl EngineResponse {
    /// Response when no rules were applicable: the query passes through.
    pub fn pass_through(query: String, execution_time_ms: f64) -> Self {
        Self {
            allowed: true,
            query: Some(query),
            results: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            execution_time_ms,
            stats: ResponseStats::default(),
        }
    }

    /// Response when the whole pipeline failed before any rule ran.
    pub fn denied(error: String, execution_time_ms: f64) -> Self {
        Self {
            allowed: false,
            query: None,
            results: Vec::new(),
            warnings: Vec::new(),
            errors: vec![error],
            execution_time_ms,
            stats: ResponseStats::default(),
        }
    }
}
