//! Condition-expression AST nodes
//!
//! Condition expressions are a small boolean mini-language over comparisons
//! of environment paths and literals, e.g.
//! `{user.role} == 'admin' && ('users' in {tables} || {hour} >= 18)`.
//! The parser (semgate-parser) produces this AST once per rule; the runtime
//! evaluates it against an environment built from the execution context.

use serde::{Deserialize, Serialize};

/// A parsed condition expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionExpr {
    /// Logical OR (lowest precedence)
    Or(Box<ConditionExpr>, Box<ConditionExpr>),

    /// Logical AND
    And(Box<ConditionExpr>, Box<ConditionExpr>),

    /// Logical NOT (`!expr` or `not expr`)
    Not(Box<ConditionExpr>),

    /// A single comparison between two operands
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },

    /// An expression with no recognized comparison operator. The parser
    /// resolves bare `true`/`false` text here; anything else is `false`.
    Literal(bool),
}

/// Comparison operators, in the fixed priority order the parser scans them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Membership: left value is an element of the right sequence
    In,
    /// Sequence-contains-element, or substring when the left side is a string
    Contains,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
    /// Structural equality (==)
    Eq,
    /// Structural inequality (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
}

impl CompareOp {
    /// The source token for this operator. Word operators keep their
    /// surrounding spaces so scans cannot match inside identifiers.
    pub fn token(&self) -> &'static str {
        match self {
            CompareOp::In => " in ",
            CompareOp::Contains => " contains ",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }

    /// All operators in scan-priority order.
    pub const SCAN_ORDER: [CompareOp; 8] = [
        CompareOp::In,
        CompareOp::Contains,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Lt,
    ];
}

/// An operand of a comparison, parsed independently as a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// `{path.to.value}` — a dotted path resolved against the environment
    Path(Vec<String>),
    /// `[a, b, c]` — a literal sequence
    List(Vec<Operand>),
    /// Quoted text, or a bare token that is not a number or boolean
    String(String),
    /// `true` / `false`
    Bool(bool),
    /// Numeric literal
    Number(f64),
}

impl ConditionExpr {
    pub fn or(left: ConditionExpr, right: ConditionExpr) -> Self {
        ConditionExpr::Or(Box::new(left), Box::new(right))
    }

    pub fn and(left: ConditionExpr, right: ConditionExpr) -> Self {
        ConditionExpr::And(Box::new(left), Box::new(right))
    }

    pub fn not(inner: ConditionExpr) -> Self {
        ConditionExpr::Not(Box::new(inner))
    }

    pub fn compare(left: Operand, op: CompareOp, right: Operand) -> Self {
        ConditionExpr::Compare { left, op, right }
    }
}

impl Operand {
    pub fn path(segments: &[&str]) -> Self {
        Operand::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Operand::String(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_expression() {
        let expr = ConditionExpr::compare(
            Operand::path(&["user", "role"]),
            CompareOp::Eq,
            Operand::string("admin"),
        );

        match expr {
            ConditionExpr::Compare { left, op, right } => {
                assert_eq!(left, Operand::Path(vec!["user".into(), "role".into()]));
                assert_eq!(op, CompareOp::Eq);
                assert_eq!(right, Operand::String("admin".into()));
            }
            _ => panic!("Expected Compare expression"),
        }
    }

    #[test]
    fn test_scan_order_matches_tokens() {
        let tokens: Vec<&str> = CompareOp::SCAN_ORDER.iter().map(|op| op.token()).collect();
        assert_eq!(
            tokens,
            vec![" in ", " contains ", ">=", "<=", "==", "!=", ">", "<"]
        );
    }

    #[test]
    fn test_nested_boolean_expression() {
        // a || (b && !c) shape
        let expr = ConditionExpr::or(
            ConditionExpr::Literal(true),
            ConditionExpr::and(
                ConditionExpr::Literal(false),
                ConditionExpr::not(ConditionExpr::Literal(true)),
            ),
        );

        match expr {
            ConditionExpr::Or(_, right) => match *right {
                ConditionExpr::And(_, inner) => {
                    assert!(matches!(*inner, ConditionExpr::Not(_)));
                }
                _ => panic!("Expected And on the right"),
            },
            _ => panic!("Expected Or at the top"),
        }
    }
}
