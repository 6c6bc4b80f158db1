//! In-memory rule store
//!
//! The store is the single owner of rule lifetime for the process. Rules
//! enter through the engine's lifecycle methods; each stored rule keeps its
//! compiled condition expression so evaluation does not re-parse per query.
//! The structure is unsynchronized: mutation must be serialized by the
//! embedding system.

use semgate_core::ast::{
    Condition, ConditionExpr, Rule, RuleScope, RuleSet, RuleTemplate, RuleType, Severity,
};
use semgate_parser::ExpressionParser;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A rule plus its compiled condition expression
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub rule: Rule,
    /// Parsed AST for expression conditions; `None` when the condition has
    /// no expression form or the expression failed to parse (which
    /// evaluates to false)
    pub compiled: Option<Arc<ConditionExpr>>,
}

/// Filter for rule queries; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub rule_type: Option<RuleType>,
    pub scope: Option<RuleScope>,
    pub severity: Option<Severity>,
    pub enabled: Option<bool>,
    /// Rule must carry every requested tag
    pub tags: Option<Vec<String>>,
}

/// In-memory store for rules, rule sets, and templates
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: HashMap<String, StoredRule>,
    rule_sets: HashMap<String, RuleSet>,
    templates: HashMap<String, RuleTemplate>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a rule, compiling its condition expression.
    pub fn insert_rule(&mut self, rule: Rule) {
        let compiled = compile_condition(&rule.id, &rule.condition);
        self.rules.insert(rule.id.clone(), StoredRule { rule, compiled });
    }

    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        self.rules.remove(id).map(|stored| stored.rule)
    }

    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id).map(|stored| &stored.rule)
    }

    pub fn contains_rule(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// All stored rules with their compiled expressions.
    pub fn stored_rules(&self) -> impl Iterator<Item = &StoredRule> {
        self.rules.values()
    }

    /// All rules, id-ordered for deterministic iteration.
    pub fn rules_sorted(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.values().map(|s| &s.rule).collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    /// Rules matching a filter, id-ordered.
    pub fn filter_rules(&self, filter: &RuleFilter) -> Vec<&Rule> {
        self.rules_sorted()
            .into_iter()
            .filter(|rule| {
                filter.rule_type.map_or(true, |t| rule.rule_type == t)
                    && filter.scope.map_or(true, |s| rule.scope == s)
                    && filter.severity.map_or(true, |s| rule.severity == s)
                    && filter.enabled.map_or(true, |e| rule.enabled == e)
                    && filter.tags.as_ref().map_or(true, |tags| {
                        tags.iter().all(|tag| rule.tags.contains(tag))
                    })
            })
            .collect()
    }

    pub fn insert_rule_set(&mut self, rule_set: RuleSet) {
        self.rule_sets.insert(rule_set.id.clone(), rule_set);
    }

    pub fn remove_rule_set(&mut self, id: &str) -> Option<RuleSet> {
        self.rule_sets.remove(id)
    }

    pub fn get_rule_set(&self, id: &str) -> Option<&RuleSet> {
        self.rule_sets.get(id)
    }

    pub fn rule_set_count(&self) -> usize {
        self.rule_sets.len()
    }

    pub fn rule_sets_sorted(&self) -> Vec<&RuleSet> {
        let mut rule_sets: Vec<&RuleSet> = self.rule_sets.values().collect();
        rule_sets.sort_by(|a, b| a.id.cmp(&b.id));
        rule_sets
    }

    pub fn insert_template(&mut self, template: RuleTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn remove_template(&mut self, id: &str) -> Option<RuleTemplate> {
        self.templates.remove(id)
    }

    pub fn get_template(&self, id: &str) -> Option<&RuleTemplate> {
        self.templates.get(id)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn templates_sorted(&self) -> Vec<&RuleTemplate> {
        let mut templates: Vec<&RuleTemplate> = self.templates.values().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.rule_sets.clear();
        self.templates.clear();
    }
}

fn compile_condition(rule_id: &str, condition: &Condition) -> Option<Arc<ConditionExpr>> {
    match condition {
        Condition::Expression { expression } => match ExpressionParser::parse(expression) {
            Ok(ast) => Some(Arc::new(ast)),
            Err(e) => {
                warn!(rule = rule_id, error = %e, "condition expression failed to parse; it will evaluate to false");
                None
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgate_core::ast::Action;

    fn rule(id: &str, rule_type: RuleType, expression: &str) -> Rule {
        Rule::new(
            id,
            format!("Rule {}", id),
            rule_type,
            RuleScope::Global,
            Severity::Warning,
            50,
            Condition::expression(expression),
            Action::allow("ok"),
        )
    }

    #[test]
    fn test_insert_compiles_expression() {
        let mut store = RuleStore::new();
        store.insert_rule(rule("r1", RuleType::Generic, "{user.role} == 'admin'"));

        let stored = store.stored_rules().next().unwrap();
        assert!(stored.compiled.is_some());
    }

    #[test]
    fn test_unparseable_expression_compiles_to_none() {
        let mut store = RuleStore::new();
        store.insert_rule(rule("r1", RuleType::Generic, "a && "));
        let stored = store.stored_rules().next().unwrap();
        assert!(stored.compiled.is_none());
    }

    #[test]
    fn test_filter_by_type_and_enabled() {
        let mut store = RuleStore::new();
        store.insert_rule(rule("a", RuleType::AccessPolicy, "true"));
        store.insert_rule(rule("b", RuleType::MetricDefinition, "true"));
        let mut disabled = rule("c", RuleType::AccessPolicy, "true");
        disabled.enabled = false;
        store.insert_rule(disabled);

        let filter = RuleFilter {
            rule_type: Some(RuleType::AccessPolicy),
            ..Default::default()
        };
        let matched = store.filter_rules(&filter);
        assert_eq!(matched.len(), 2);

        let filter = RuleFilter {
            rule_type: Some(RuleType::AccessPolicy),
            enabled: Some(true),
            ..Default::default()
        };
        let matched = store.filter_rules(&filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "a");
    }

    #[test]
    fn test_filter_by_tags_requires_all() {
        let mut store = RuleStore::new();
        let mut tagged = rule("a", RuleType::Generic, "true");
        tagged.tags = vec!["pii".to_string(), "audit".to_string()];
        store.insert_rule(tagged);

        let filter = RuleFilter {
            tags: Some(vec!["pii".to_string()]),
            ..Default::default()
        };
        assert_eq!(store.filter_rules(&filter).len(), 1);

        let filter = RuleFilter {
            tags: Some(vec!["pii".to_string(), "finance".to_string()]),
            ..Default::default()
        };
        assert!(store.filter_rules(&filter).is_empty());
    }

    #[test]
    fn test_rules_sorted_deterministic() {
        let mut store = RuleStore::new();
        store.insert_rule(rule("b", RuleType::Generic, "true"));
        store.insert_rule(rule("a", RuleType::Generic, "true"));
        store.insert_rule(rule("c", RuleType::Generic, "true"));

        let ids: Vec<&str> = store.rules_sorted().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
