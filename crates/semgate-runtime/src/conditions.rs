//! Condition evaluation
//!
//! Dispatches over the condition variant: expressions go through the parsed
//! AST (cached per rule where available), patterns are case-insensitive
//! regex tests over the running query text, functions hit the built-in
//! predicate table, and composites combine child results. Data-quality
//! conditions exist for conflict detection only and never fire at runtime.

use crate::environment::Environment;
use crate::error::{EngineError, Result};
use crate::eval;
use regex::RegexBuilder;
use semgate_core::ast::{BuiltinFunction, CompositeOp, Condition, ConditionExpr};
use semgate_core::types::ExecutionContext;
use semgate_core::Value;
use semgate_parser::ExpressionParser;
use std::collections::HashMap;

/// Evaluate a rule condition against the context.
///
/// `compiled` is the pre-parsed AST for top-level expression conditions;
/// expressions without one (composite children, cache misses) are parsed on
/// the fly. A malformed expression evaluates to false; other failures (bad
/// regex, missing function parameter) surface as evaluation errors and are
/// converted to error-severity results at the rule boundary.
pub fn evaluate_condition(
    condition: &Condition,
    compiled: Option<&ConditionExpr>,
    ctx: &ExecutionContext,
    env: &Environment,
    query: &str,
) -> Result<bool> {
    match condition {
        Condition::Expression { expression } => Ok(match compiled {
            Some(ast) => eval::evaluate(ast, env),
            None => ExpressionParser::parse(expression)
                .map(|ast| eval::evaluate(&ast, env))
                .unwrap_or(false),
        }),

        Condition::Pattern { pattern } => {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    EngineError::Evaluation(format!("invalid pattern '{}': {}", pattern, e))
                })?;
            Ok(re.is_match(query))
        }

        Condition::Function {
            function,
            parameters,
        } => call_builtin(*function, parameters, ctx),

        Condition::Composite {
            operator,
            conditions,
        } => match operator {
            CompositeOp::And => {
                for child in conditions {
                    if !evaluate_condition(child, None, ctx, env, query)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            CompositeOp::Or => {
                for child in conditions {
                    if evaluate_condition(child, None, ctx, env, query)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CompositeOp::Not => {
                if conditions.len() != 1 {
                    return Err(EngineError::Evaluation(format!(
                        "NOT composite requires exactly one child, got {}",
                        conditions.len()
                    )));
                }
                Ok(!evaluate_condition(&conditions[0], None, ctx, env, query)?)
            }
        },

        Condition::DataQuality { .. } => Ok(false),
    }
}

fn call_builtin(
    function: BuiltinFunction,
    parameters: &HashMap<String, Value>,
    ctx: &ExecutionContext,
) -> Result<bool> {
    match function {
        BuiltinFunction::HasTable => {
            let table = string_param(parameters, "table")?;
            Ok(ctx.tables.iter().any(|t| t == &table))
        }
        BuiltinFunction::HasColumn => {
            let column = string_param(parameters, "column")?;
            Ok(ctx.columns.iter().any(|c| c == &column))
        }
        BuiltinFunction::IsQueryType => {
            let query_type = string_param(parameters, "queryType")?;
            Ok(ctx.query_type.eq_ignore_ascii_case(&query_type))
        }
        BuiltinFunction::HasUserRole => {
            let role = string_param(parameters, "role")?;
            Ok(ctx.user.role == role)
        }
        BuiltinFunction::IsTimeWindow => {
            let start = parse_minute_of_day(&string_param(parameters, "start")?)?;
            let end = parse_minute_of_day(&string_param(parameters, "end")?)?;
            let now = minute_of_day(ctx);
            // start > end means the window wraps across midnight
            if start <= end {
                Ok(now >= start && now <= end)
            } else {
                Ok(now >= start || now <= end)
            }
        }
    }
}

fn string_param(parameters: &HashMap<String, Value>, name: &str) -> Result<String> {
    match parameters.get(name) {
        Some(value) => value.as_text().ok_or_else(|| {
            EngineError::Evaluation(format!("function parameter '{}' must be a string", name))
        }),
        None => Err(EngineError::Evaluation(format!(
            "missing function parameter '{}'",
            name
        ))),
    }
}

fn minute_of_day(ctx: &ExecutionContext) -> u32 {
    use chrono::Timelike;
    ctx.timestamp.hour() * 60 + ctx.timestamp.minute()
}

/// Parse `HH:MM` into a minute-of-day.
fn parse_minute_of_day(text: &str) -> Result<u32> {
    let invalid =
        || EngineError::Evaluation(format!("invalid time '{}', expected HH:MM", text));
    let (hours, minutes) = text.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}
