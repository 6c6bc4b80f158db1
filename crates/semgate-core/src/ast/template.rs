//! Rule templates
//!
//! A template is a parameterized rule skeleton. The skeleton stays a JSON
//! document until instantiation so parameter values can be bound at dotted
//! paths (a parameter named `condition.expression` writes there); the engine
//! then assigns identity fields and deserializes the result into a `Rule`.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A parameterized rule blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTemplate {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rule skeleton; parameter slots are bound into it on instantiation
    pub rule: JsonValue,

    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
}

/// A parameter spec. The name is the dotted path inside the skeleton that
/// the bound value is written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    pub name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleTemplate {
    /// Bind parameter values into a fresh copy of the skeleton.
    ///
    /// Fails if any required parameter is absent. Undeclared parameters are
    /// bound as given; the resulting document still has to pass full rule
    /// validation downstream.
    pub fn bind(&self, params: &HashMap<String, JsonValue>) -> Result<JsonValue, CoreError> {
        for spec in &self.parameters {
            if spec.required && !params.contains_key(&spec.name) {
                return Err(CoreError::Validation(format!(
                    "missing required template parameter '{}'",
                    spec.name
                )));
            }
        }

        let mut skeleton = self.rule.clone();
        for (path, value) in params {
            set_json_path(&mut skeleton, path, value.clone());
        }
        Ok(skeleton)
    }
}

/// Write `value` at a dotted path inside `root`, creating intermediate
/// objects as needed. Non-object intermediates are replaced.
pub fn set_json_path(root: &mut JsonValue, path: &str, value: JsonValue) {
    let mut current = root;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if !current.is_object() {
            *current = JsonValue::Object(serde_json::Map::new());
        }
        let JsonValue::Object(map) = current else {
            return;
        };
        if i == segments.len() - 1 {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_template() -> RuleTemplate {
        RuleTemplate {
            id: "deny_table_for_role".to_string(),
            name: "Deny table for role".to_string(),
            description: None,
            rule: json!({
                "name": "Deny table access",
                "type": "access-policy",
                "scope": "table",
                "trigger": "before-query",
                "severity": "block",
                "priority": 800,
                "condition": { "type": "expression", "expression": "" },
                "action": { "type": "deny", "message": "access denied" }
            }),
            parameters: vec![
                TemplateParameter {
                    name: "condition.expression".to_string(),
                    required: true,
                    description: None,
                },
                TemplateParameter {
                    name: "action.message".to_string(),
                    required: false,
                    description: None,
                },
            ],
        }
    }

    #[test]
    fn test_bind_writes_dotted_paths() {
        let template = sample_template();
        let mut params = HashMap::new();
        params.insert(
            "condition.expression".to_string(),
            json!("'orders' in {tables}"),
        );
        params.insert("action.message".to_string(), json!("orders are restricted"));

        let bound = template.bind(&params).unwrap();
        assert_eq!(
            bound["condition"]["expression"],
            json!("'orders' in {tables}")
        );
        assert_eq!(bound["action"]["message"], json!("orders are restricted"));
        // untouched skeleton fields survive
        assert_eq!(bound["severity"], json!("block"));
    }

    #[test]
    fn test_bind_missing_required_parameter() {
        let template = sample_template();
        let err = template.bind(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("condition.expression"));
    }

    #[test]
    fn test_set_json_path_creates_intermediates() {
        let mut root = json!({});
        set_json_path(&mut root, "a.b.c", json!(5));
        assert_eq!(root, json!({"a": {"b": {"c": 5}}}));

        set_json_path(&mut root, "a.b.d", json!("x"));
        assert_eq!(root["a"]["b"], json!({"c": 5, "d": "x"}));
    }
}
