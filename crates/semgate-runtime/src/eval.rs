//! Expression AST evaluator
//!
//! Evaluates a parsed `ConditionExpr` against an [`Environment`].
//! Evaluation is total: an unresolved path makes the operand undefined, and
//! every comparison against undefined is false except `!=`. The evaluator
//! never errors; the fail-to-false contract for malformed expressions is
//! enforced at the parse boundary.

use crate::environment::Environment;
use semgate_core::ast::{CompareOp, ConditionExpr, Operand};
use semgate_core::Value;

/// Evaluate an expression to a boolean.
pub fn evaluate(expr: &ConditionExpr, env: &Environment) -> bool {
    match expr {
        ConditionExpr::Or(left, right) => evaluate(left, env) || evaluate(right, env),
        ConditionExpr::And(left, right) => evaluate(left, env) && evaluate(right, env),
        ConditionExpr::Not(inner) => !evaluate(inner, env),
        ConditionExpr::Literal(b) => *b,
        ConditionExpr::Compare { left, op, right } => {
            compare(resolve(left, env), *op, resolve(right, env))
        }
    }
}

/// Resolve an operand to a runtime value. `None` is "undefined".
fn resolve(operand: &Operand, env: &Environment) -> Option<Value> {
    match operand {
        Operand::Path(path) => env.resolve(path),
        Operand::List(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| resolve(item, env).unwrap_or(Value::Null))
                .collect(),
        )),
        Operand::String(s) => Some(Value::String(s.clone())),
        Operand::Bool(b) => Some(Value::Bool(*b)),
        Operand::Number(n) => Some(Value::Number(*n)),
    }
}

fn compare(left: Option<Value>, op: CompareOp, right: Option<Value>) -> bool {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        // undefined on either side: only != holds
        _ => return op == CompareOp::Ne,
    };

    match op {
        CompareOp::In => match right.as_array() {
            Some(items) => items.contains(&left),
            None => false,
        },
        CompareOp::Contains => match &left {
            Value::Array(items) => items.contains(&right),
            Value::String(s) => match right.as_text() {
                Some(needle) => s.contains(&needle),
                None => false,
            },
            _ => false,
        },
        CompareOp::Eq => left == right,
        CompareOp::Ne => left != right,
        CompareOp::Ge => numeric(&left, &right).map_or(false, |(l, r)| l >= r),
        CompareOp::Le => numeric(&left, &right).map_or(false, |(l, r)| l <= r),
        CompareOp::Gt => numeric(&left, &right).map_or(false, |(l, r)| l > r),
        CompareOp::Lt => numeric(&left, &right).map_or(false, |(l, r)| l < r),
    }
}

fn numeric(left: &Value, right: &Value) -> Option<(f64, f64)> {
    Some((left.as_number()?, right.as_number()?))
}
