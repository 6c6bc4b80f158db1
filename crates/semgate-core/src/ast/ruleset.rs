//! Rule set definitions
//!
//! A rule set is a named grouping of rule ids, persisted as its own
//! artifact. Membership is by id; the rules themselves live in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Member rule ids
    #[serde(default)]
    pub rules: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl RuleSet {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rules: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            rules,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.iter().any(|id| id == rule_id)
    }
}
