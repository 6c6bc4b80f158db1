//! Rule definitions
//!
//! A rule is the unit of policy: a named, prioritized (condition, action)
//! pair with scope/trigger/severity metadata and audit fields.

use super::action::Action;
use super::condition::Condition;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest admissible rule priority (inclusive)
pub const MAX_PRIORITY: u32 = 1000;

/// Rule definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule ID
    pub id: String,

    /// Human-readable name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Category tag
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Breadth at which the rule applies
    pub scope: RuleScope,

    /// When the rule participates; only `before-query` rules run during
    /// query evaluation
    pub trigger: RuleTrigger,

    /// Consequence class when the rule fails
    pub severity: Severity,

    /// 0–1000, higher evaluated first
    pub priority: u32,

    pub condition: Condition,

    pub action: Action,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Rule ids this rule must not coexist with. Carried and persisted;
    /// structural conflict detection does not consult it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts_with: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// Rule category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleType {
    AccessPolicy,
    MetricDefinition,
    JoinRule,
    DataValidation,
    Generic,
}

/// Rule applicability breadth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Global,
    Table,
    Column,
}

/// Evaluation trigger point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTrigger {
    BeforeQuery,
    AfterQuery,
    OnSchemaChange,
}

/// Consequence class of a failing rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Block,
    Error,
    Warning,
    Info,
}

impl Rule {
    /// Create an enabled rule with fresh audit timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rule_type: RuleType,
        scope: RuleScope,
        severity: Severity,
        priority: u32,
        condition: Condition,
        action: Action,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            rule_type,
            scope,
            trigger: RuleTrigger::BeforeQuery,
            severity,
            priority,
            condition,
            action,
            enabled: true,
            tags: Vec::new(),
            conflicts_with: None,
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_trigger(mut self, trigger: RuleTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Structural validation: mandatory identity fields, priority range,
    /// condition and action well-formedness.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation("rule id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("rule name is required".to_string()));
        }
        if self.priority > MAX_PRIORITY {
            return Err(CoreError::Validation(format!(
                "rule priority must be in [0, {}], got {}",
                MAX_PRIORITY, self.priority
            )));
        }
        self.condition.validate()?;
        self.action.validate()?;
        Ok(())
    }
}

/// Partial update to an existing rule. `None` fields are left untouched;
/// identity and audit fields cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RuleScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<RuleTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts_with: Option<Vec<String>>,
}

impl RulePatch {
    /// Apply the patch in place. The caller re-validates and stamps
    /// `updated_at`.
    pub fn apply(&self, rule: &mut Rule) {
        if let Some(name) = &self.name {
            rule.name = name.clone();
        }
        if let Some(description) = &self.description {
            rule.description = Some(description.clone());
        }
        if let Some(rule_type) = self.rule_type {
            rule.rule_type = rule_type;
        }
        if let Some(scope) = self.scope {
            rule.scope = scope;
        }
        if let Some(trigger) = self.trigger {
            rule.trigger = trigger;
        }
        if let Some(severity) = self.severity {
            rule.severity = severity;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        if let Some(condition) = &self.condition {
            rule.condition = condition.clone();
        }
        if let Some(action) = &self.action {
            rule.action = action.clone();
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(tags) = &self.tags {
            rule.tags = tags.clone();
        }
        if let Some(conflicts_with) = &self.conflicts_with {
            rule.conflicts_with = Some(conflicts_with.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule() -> Rule {
        Rule::new(
            "no_guest_users",
            "Guests cannot read users",
            RuleType::AccessPolicy,
            RuleScope::Table,
            Severity::Block,
            500,
            Condition::expression("'users' in {tables} && {user.role} == 'guest'"),
            Action::deny("guests may not query the users table"),
        )
    }

    #[test]
    fn test_rule_validation_ok() {
        assert!(sample_rule().validate().is_ok());
    }

    #[test]
    fn test_missing_id_rejected() {
        let mut rule = sample_rule();
        rule.id = "  ".to_string();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut rule = sample_rule();
        rule.name = String::new();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_priority_out_of_range_rejected() {
        let mut rule = sample_rule();
        rule.priority = 1001;
        let err = rule.validate().unwrap_err();
        assert!(err.to_string().contains("[0, 1000]"));

        rule.priority = 1000;
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_serde_field_names() {
        let rule = sample_rule();
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"type\":\"access-policy\""));
        assert!(json.contains("\"scope\":\"table\""));
        assert!(json.contains("\"trigger\":\"before-query\""));
        assert!(json.contains("\"severity\":\"block\""));
        assert!(json.contains("\"createdAt\""));

        let round: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(round, rule);
    }

    #[test]
    fn test_patch_leaves_unset_fields() {
        let mut rule = sample_rule();
        let original_condition = rule.condition.clone();

        let patch = RulePatch {
            priority: Some(900),
            enabled: Some(false),
            ..Default::default()
        };
        patch.apply(&mut rule);

        assert_eq!(rule.priority, 900);
        assert!(!rule.enabled);
        assert_eq!(rule.condition, original_condition);
        assert_eq!(rule.name, "Guests cannot read users");
    }
}
