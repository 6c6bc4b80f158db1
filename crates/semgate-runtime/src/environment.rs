//! Evaluation environment
//!
//! Conditions reference the execution context through dotted paths:
//! `queryType`, `tables`, `columns`, `user.role`, `user.permissions`,
//! `hour` (0-23), and `weekday` (0-6, Sunday = 0). The environment is built
//! once per evaluation run and resolved per path lookup.

use chrono::{Datelike, Timelike};
use semgate_core::types::ExecutionContext;
use semgate_core::Value;
use std::collections::HashMap;

/// Dotted-path value environment derived from an execution context
#[derive(Debug, Clone)]
pub struct Environment {
    root: HashMap<String, Value>,
}

impl Environment {
    /// Build the environment for one evaluation run.
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        let mut root = HashMap::new();
        root.insert(
            "queryType".to_string(),
            Value::String(ctx.query_type.clone()),
        );
        root.insert(
            "tables".to_string(),
            Value::Array(ctx.tables.iter().cloned().map(Value::String).collect()),
        );
        root.insert(
            "columns".to_string(),
            Value::Array(ctx.columns.iter().cloned().map(Value::String).collect()),
        );

        let mut user = HashMap::new();
        user.insert("role".to_string(), Value::String(ctx.user.role.clone()));
        user.insert(
            "permissions".to_string(),
            Value::Array(
                ctx.user
                    .permissions
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        root.insert("user".to_string(), Value::Object(user));

        root.insert(
            "hour".to_string(),
            Value::Number(ctx.timestamp.hour() as f64),
        );
        root.insert(
            "weekday".to_string(),
            Value::Number(ctx.timestamp.weekday().num_days_from_sunday() as f64),
        );

        Self { root }
    }

    /// Resolve a dotted path. `None` means the path is undefined; the
    /// comparison semantics treat that distinctly from `Null`.
    pub fn resolve(&self, path: &[String]) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(first)?;
        for segment in rest {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current.clone())
    }
}
