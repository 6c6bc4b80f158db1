//! The rule data model and the condition-expression AST

pub mod action;
pub mod condition;
pub mod expression;
pub mod rule;
pub mod ruleset;
pub mod template;

pub use action::{Action, ActionKind};
pub use condition::{BuiltinFunction, CompositeOp, Condition};
pub use expression::{CompareOp, ConditionExpr, Operand};
pub use rule::{Rule, RulePatch, RuleScope, RuleTrigger, RuleType, Severity};
pub use ruleset::RuleSet;
pub use template::{RuleTemplate, TemplateParameter};
