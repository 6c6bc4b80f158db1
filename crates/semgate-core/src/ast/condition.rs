//! Rule condition variants
//!
//! A condition is the boolean predicate attached to a rule. The variant set
//! is closed: dispatch sites match exhaustively, so adding a variant is a
//! compile-time-checked change.

use crate::error::CoreError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rule condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// A string in the condition-expression mini-language
    Expression { expression: String },

    /// A regular expression tested case-insensitively against the query text
    Pattern { pattern: String },

    /// A named built-in predicate with a parameter bag
    Function {
        function: BuiltinFunction,
        #[serde(default)]
        parameters: HashMap<String, Value>,
    },

    /// A boolean combinator over child conditions
    Composite {
        operator: CompositeOp,
        conditions: Vec<Condition>,
    },

    /// A (metric, column, threshold) triple. Used only for conflict
    /// detection between rules; never fires during live evaluation.
    DataQuality {
        metric: String,
        column: String,
        threshold: f64,
    },
}

/// Built-in predicate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuiltinFunction {
    HasTable,
    HasColumn,
    IsQueryType,
    HasUserRole,
    IsTimeWindow,
}

/// Composite operators. NOT requires exactly one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompositeOp {
    And,
    Or,
    Not,
}

impl Condition {
    pub fn expression(expression: impl Into<String>) -> Self {
        Condition::Expression {
            expression: expression.into(),
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Condition::Pattern {
            pattern: pattern.into(),
        }
    }

    pub fn function(function: BuiltinFunction, parameters: HashMap<String, Value>) -> Self {
        Condition::Function {
            function,
            parameters,
        }
    }

    pub fn composite(operator: CompositeOp, conditions: Vec<Condition>) -> Self {
        Condition::Composite {
            operator,
            conditions,
        }
    }

    /// The raw condition text, for scope matching. Only expression and
    /// pattern conditions have a textual form.
    pub fn text(&self) -> Option<&str> {
        match self {
            Condition::Expression { expression } => Some(expression),
            Condition::Pattern { pattern } => Some(pattern),
            _ => None,
        }
    }

    /// Structural validation, applied before a rule enters the store.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Condition::Expression { expression } => {
                if expression.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "condition expression must not be empty".to_string(),
                    ));
                }
            }
            Condition::Pattern { pattern } => {
                if pattern.is_empty() {
                    return Err(CoreError::Validation(
                        "condition pattern must not be empty".to_string(),
                    ));
                }
            }
            Condition::Function { .. } => {}
            Condition::Composite {
                operator,
                conditions,
            } => {
                if *operator == CompositeOp::Not && conditions.len() != 1 {
                    return Err(CoreError::Validation(format!(
                        "NOT composite requires exactly one child condition, got {}",
                        conditions.len()
                    )));
                }
                if conditions.is_empty() {
                    return Err(CoreError::Validation(
                        "composite condition must have at least one child".to_string(),
                    ));
                }
                for child in conditions {
                    child.validate()?;
                }
            }
            Condition::DataQuality { metric, column, .. } => {
                if metric.is_empty() || column.is_empty() {
                    return Err(CoreError::Validation(
                        "data-quality condition requires metric and column".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_serde_tags() {
        let cond = Condition::expression("{user.role} == 'admin'");
        let json = serde_json::to_string(&cond).unwrap();
        assert!(json.contains("\"type\":\"expression\""));

        let cond = Condition::DataQuality {
            metric: "completeness".to_string(),
            column: "email".to_string(),
            threshold: 0.95,
        };
        let json = serde_json::to_string(&cond).unwrap();
        assert!(json.contains("\"type\":\"dataQuality\""));

        let round: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(round, cond);
    }

    #[test]
    fn test_function_serde_names() {
        let cond = Condition::function(BuiltinFunction::IsTimeWindow, HashMap::new());
        let json = serde_json::to_string(&cond).unwrap();
        assert!(json.contains("\"function\":\"isTimeWindow\""));
    }

    #[test]
    fn test_composite_not_arity_validation() {
        let bad = Condition::composite(
            CompositeOp::Not,
            vec![
                Condition::expression("true"),
                Condition::expression("false"),
            ],
        );
        assert!(bad.validate().is_err());

        let ok = Condition::composite(CompositeOp::Not, vec![Condition::expression("true")]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_empty_expression_rejected() {
        assert!(Condition::expression("   ").validate().is_err());
    }

    #[test]
    fn test_condition_text() {
        assert_eq!(
            Condition::expression("'users' in {tables}").text(),
            Some("'users' in {tables}")
        );
        assert_eq!(Condition::pattern("delete\\s+from").text(), Some("delete\\s+from"));
        assert_eq!(
            Condition::function(BuiltinFunction::HasTable, HashMap::new()).text(),
            None
        );
    }
}
