//! The governance rule engine
//!
//! `RuleEngine` owns the in-memory store, persists through an injected
//! repository, and exposes the two public surfaces: lifecycle management
//! (add/update/remove/validate rules, conflict detection, template
//! instantiation) and query evaluation (`evaluate_query`).
//!
//! Evaluation is strictly sequential so a `modify` rewrite is visible to
//! the lower-priority rules that run after it. Store mutation assumes a
//! single writer at a time; concurrent read-only evaluation is safe only
//! while no mutation is in flight.

use crate::actions::{self, MODIFIED_QUERY_KEY};
use crate::conditions;
use crate::environment::Environment;
use crate::error::{EngineError, Result};
use crate::store::{RuleFilter, RuleStore, StoredRule};
use chrono::Utc;
use rand::Rng;
use semgate_core::ast::{
    ActionKind, Condition, Rule, RulePatch, RuleScope, RuleSet, RuleTemplate, RuleType, Severity,
};
use semgate_core::types::{EngineResponse, ExecutionContext, ExecutionResult, ResponseStats};
use semgate_core::Value;
use semgate_repository::RuleRepository;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Counts of stored artifacts, cheap observability for operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub rules: usize,
    pub enabled_rules: usize,
    pub rule_sets: usize,
    pub templates: usize,
    pub rules_by_type: HashMap<RuleType, usize>,
}

/// Outcome of a candidate-rule batch import
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added: Vec<String>,
    pub rejected: Vec<(String, String)>,
}

/// The rule engine
pub struct RuleEngine {
    store: RuleStore,
    repository: Arc<dyn RuleRepository>,
}

impl RuleEngine {
    /// Create an engine with an empty store. Call [`load`](Self::load) to
    /// populate it from the repository; construction performs no I/O.
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self {
            store: RuleStore::new(),
            repository,
        }
    }

    /// Replace the store contents with everything the repository holds.
    pub async fn load(&mut self) -> Result<()> {
        self.store.clear();
        for rule in self.repository.load_rules().await? {
            self.store.insert_rule(rule);
        }
        for rule_set in self.repository.load_rule_sets().await? {
            self.store.insert_rule_set(rule_set);
        }
        for template in self.repository.load_templates().await? {
            self.store.insert_template(template);
        }
        info!(
            rules = self.store.rule_count(),
            rule_sets = self.store.rule_set_count(),
            templates = self.store.template_count(),
            "rule store loaded"
        );
        Ok(())
    }

    /// Persist the full store contents.
    pub async fn flush(&self) -> Result<()> {
        for rule in self.store.rules_sorted() {
            self.repository.save_rule(rule).await?;
        }
        for rule_set in self.store.rule_sets_sorted() {
            self.repository.save_rule_set(rule_set).await?;
        }
        for template in self.store.templates_sorted() {
            self.repository.save_template(template).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Validate, conflict-check, persist, and insert a rule.
    pub async fn add_rule(&mut self, rule: Rule) -> Result<()> {
        rule.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        if self.store.contains_rule(&rule.id) {
            return Err(EngineError::Validation(format!(
                "rule '{}' already exists",
                rule.id
            )));
        }
        self.check_rule_conflicts(&rule)?;

        self.repository.save_rule(&rule).await?;
        debug!(rule = %rule.id, "rule added");
        self.store.insert_rule(rule);
        Ok(())
    }

    /// Apply a partial update, re-validate, and re-persist.
    pub async fn update_rule(&mut self, id: &str, patch: RulePatch) -> Result<Rule> {
        let mut updated = self
            .store
            .get_rule(id)
            .ok_or_else(|| EngineError::RuleNotFound(id.to_string()))?
            .clone();
        patch.apply(&mut updated);
        updated.updated_at = Utc::now();
        updated
            .validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        self.repository.save_rule(&updated).await?;
        self.store.insert_rule(updated.clone());
        Ok(updated)
    }

    /// Remove a rule from the store and from persistent storage.
    pub async fn remove_rule(&mut self, id: &str) -> Result<()> {
        if !self.store.contains_rule(id) {
            return Err(EngineError::RuleNotFound(id.to_string()));
        }
        self.repository.delete_rule(id).await?;
        self.store.remove_rule(id);
        Ok(())
    }

    /// Add a batch of candidate rules (typically detector output),
    /// collecting per-rule failures instead of aborting the batch.
    pub async fn import_rules(&mut self, rules: Vec<Rule>) -> ImportReport {
        let mut report = ImportReport::default();
        for rule in rules {
            let id = rule.id.clone();
            match self.add_rule(rule).await {
                Ok(()) => report.added.push(id),
                Err(e) => report.rejected.push((id, e.to_string())),
            }
        }
        report
    }

    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.store.get_rule(id)
    }

    pub fn get_rules(&self, filter: &RuleFilter) -> Vec<&Rule> {
        self.store.filter_rules(filter)
    }

    pub fn access_policy_rules(&self) -> Vec<&Rule> {
        self.rules_of_type(RuleType::AccessPolicy)
    }

    pub fn metric_definition_rules(&self) -> Vec<&Rule> {
        self.rules_of_type(RuleType::MetricDefinition)
    }

    pub fn join_rules(&self) -> Vec<&Rule> {
        self.rules_of_type(RuleType::JoinRule)
    }

    fn rules_of_type(&self, rule_type: RuleType) -> Vec<&Rule> {
        self.store.filter_rules(&RuleFilter {
            rule_type: Some(rule_type),
            ..Default::default()
        })
    }

    pub async fn add_rule_set(&mut self, rule_set: RuleSet) -> Result<()> {
        if rule_set.id.trim().is_empty() {
            return Err(EngineError::Validation(
                "rule set id is required".to_string(),
            ));
        }
        self.repository.save_rule_set(&rule_set).await?;
        self.store.insert_rule_set(rule_set);
        Ok(())
    }

    pub async fn remove_rule_set(&mut self, id: &str) -> Result<()> {
        if self.store.get_rule_set(id).is_none() {
            return Err(EngineError::RuleSetNotFound(id.to_string()));
        }
        self.repository.delete_rule_set(id).await?;
        self.store.remove_rule_set(id);
        Ok(())
    }

    pub fn get_rule_set(&self, id: &str) -> Option<&RuleSet> {
        self.store.get_rule_set(id)
    }

    pub async fn add_template(&mut self, template: RuleTemplate) -> Result<()> {
        if template.id.trim().is_empty() {
            return Err(EngineError::Validation(
                "template id is required".to_string(),
            ));
        }
        self.repository.save_template(&template).await?;
        self.store.insert_template(template);
        Ok(())
    }

    pub fn get_template(&self, id: &str) -> Option<&RuleTemplate> {
        self.store.get_template(id)
    }

    pub fn templates(&self) -> Vec<&RuleTemplate> {
        self.store.templates_sorted()
    }

    /// Instantiate a rule from a template: bind parameters at their dotted
    /// paths, assign a fresh identity and audit fields, and validate. The
    /// rule is returned, not added; the caller decides.
    pub fn create_rule_from_template(
        &self,
        template_id: &str,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<Rule> {
        let template = self
            .store
            .get_template(template_id)
            .ok_or_else(|| EngineError::TemplateNotFound(template_id.to_string()))?;

        let mut bound = template
            .bind(params)
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        let now = serde_json::Value::String(Utc::now().to_rfc3339());
        if let Some(map) = bound.as_object_mut() {
            map.insert("id".to_string(), serde_json::Value::String(generate_rule_id()));
            map.insert("createdAt".to_string(), now.clone());
            map.insert("updatedAt".to_string(), now);
        }

        let rule: Rule = serde_json::from_value(bound).map_err(|e| {
            EngineError::Validation(format!(
                "template '{}' produced an invalid rule: {}",
                template_id, e
            ))
        })?;
        rule.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        Ok(rule)
    }

    /// Pairwise structural conflict check against every stored rule of the
    /// same scope and type. Two patterns are detected, both symmetric:
    /// a data-quality metric+column collision (ambiguous threshold), and an
    /// allow action facing a deny action.
    pub fn check_rule_conflicts(&self, candidate: &Rule) -> Result<()> {
        for existing in self.store.rules_sorted() {
            if existing.id == candidate.id
                || existing.scope != candidate.scope
                || existing.rule_type != candidate.rule_type
            {
                continue;
            }

            if let (
                Condition::DataQuality {
                    metric: candidate_metric,
                    column: candidate_column,
                    ..
                },
                Condition::DataQuality { metric, column, .. },
            ) = (&candidate.condition, &existing.condition)
            {
                if candidate_metric == metric && candidate_column == column {
                    return Err(EngineError::Conflict(format!(
                        "rule '{}' duplicates data-quality metric '{}' on column '{}' already covered by rule '{}'",
                        candidate.id, metric, column, existing.id
                    )));
                }
            }

            let pair = (candidate.action.kind, existing.action.kind);
            if pair == (ActionKind::Allow, ActionKind::Deny)
                || pair == (ActionKind::Deny, ActionKind::Allow)
            {
                return Err(EngineError::Conflict(format!(
                    "rule '{}' ({:?}) contradicts rule '{}' ({:?}) of the same scope and type",
                    candidate.id, candidate.action.kind, existing.id, existing.action.kind
                )));
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        let mut rules_by_type = HashMap::new();
        let mut enabled_rules = 0;
        for rule in self.store.rules_sorted() {
            *rules_by_type.entry(rule.rule_type).or_insert(0) += 1;
            if rule.enabled {
                enabled_rules += 1;
            }
        }
        EngineStats {
            rules: self.store.rule_count(),
            enabled_rules,
            rule_sets: self.store.rule_set_count(),
            templates: self.store.template_count(),
            rules_by_type,
        }
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Evaluate a query context against every applicable rule.
    ///
    /// Never errors: a failure of the pipeline itself comes back as a
    /// denied response with the error recorded and zero rules evaluated.
    pub fn evaluate_query(&self, ctx: &ExecutionContext) -> EngineResponse {
        let started = Instant::now();
        match self.run_pipeline(ctx, started) {
            Ok(response) => response,
            Err(e) => EngineResponse::denied(e.to_string(), elapsed_ms(started)),
        }
    }

    fn run_pipeline(&self, ctx: &ExecutionContext, started: Instant) -> Result<EngineResponse> {
        let mut applicable: Vec<&StoredRule> = self
            .store
            .stored_rules()
            .filter(|stored| is_applicable(&stored.rule, ctx))
            .collect();

        if applicable.is_empty() {
            return Ok(EngineResponse::pass_through(
                ctx.query.clone(),
                elapsed_ms(started),
            ));
        }

        // Priority descending; id breaks ties deterministically
        applicable.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then_with(|| a.rule.id.cmp(&b.rule.id))
        });

        let env = Environment::from_context(ctx);
        let mut current_query = ctx.query.clone();
        let mut results = Vec::with_capacity(applicable.len());
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut allowed = true;
        let mut blocked = 0;

        for stored in applicable {
            let rule = &stored.rule;
            let rule_started = Instant::now();
            let evaluated = evaluate_rule(stored, ctx, &env, &current_query);
            let rule_elapsed = elapsed_ms(rule_started);

            let result = match evaluated {
                // condition did not match: the rule passes trivially
                Ok(None) => ExecutionResult::not_matched(&rule.id, &rule.name, rule_elapsed),

                Ok(Some(outcome)) => {
                    if !outcome.success {
                        match rule.severity {
                            Severity::Block => {
                                allowed = false;
                                blocked += 1;
                                errors.push(outcome.message.clone());
                            }
                            Severity::Error => errors.push(outcome.message.clone()),
                            Severity::Warning => warnings.push(outcome.message.clone()),
                            Severity::Info => {}
                        }
                    }

                    if outcome.success && rule.action.kind == ActionKind::Modify {
                        if let Some(Value::String(rewritten)) = outcome
                            .metadata
                            .as_ref()
                            .and_then(|m| m.get(MODIFIED_QUERY_KEY))
                        {
                            current_query = rewritten.clone();
                        }
                    }

                    ExecutionResult {
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        passed: outcome.success,
                        severity: Some(rule.severity),
                        message: Some(outcome.message),
                        action: Some(rule.action.kind),
                        execution_time_ms: rule_elapsed,
                        metadata: outcome.metadata,
                    }
                }

                // per-rule failure: record and continue with the next rule
                Err(e) => {
                    errors.push(e.to_string());
                    ExecutionResult {
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        passed: false,
                        severity: Some(Severity::Error),
                        message: Some(e.to_string()),
                        action: None,
                        execution_time_ms: rule_elapsed,
                        metadata: None,
                    }
                }
            };
            results.push(result);
        }

        let stats = ResponseStats {
            rules_evaluated: results.len(),
            rules_passed: results.iter().filter(|r| r.passed).count(),
            rules_failed: results.iter().filter(|r| !r.passed).count(),
            rules_blocked: blocked,
        };

        Ok(EngineResponse {
            allowed,
            query: allowed.then_some(current_query),
            results,
            warnings,
            errors,
            execution_time_ms: elapsed_ms(started),
            stats,
        })
    }
}

/// Enabled, before-query, and scope-matched against the context. Table and
/// column scoped rules match through their condition text; a condition with
/// no textual form never matches those scopes.
fn is_applicable(rule: &Rule, ctx: &ExecutionContext) -> bool {
    use semgate_core::ast::RuleTrigger;

    if !rule.enabled || rule.trigger != RuleTrigger::BeforeQuery {
        return false;
    }
    match rule.scope {
        RuleScope::Global => true,
        RuleScope::Table => match rule.condition.text() {
            Some(text) => ctx.tables.iter().any(|table| text.contains(table.as_str())),
            None => false,
        },
        RuleScope::Column => match rule.condition.text() {
            Some(text) => ctx
                .columns
                .iter()
                .any(|column| text.contains(column.as_str())),
            None => false,
        },
    }
}

/// Run one rule: `Ok(None)` when the condition did not match, otherwise the
/// dispatched action outcome.
fn evaluate_rule(
    stored: &StoredRule,
    ctx: &ExecutionContext,
    env: &Environment,
    query: &str,
) -> Result<Option<actions::ActionOutcome>> {
    let matched = conditions::evaluate_condition(
        &stored.rule.condition,
        stored.compiled.as_deref(),
        ctx,
        env,
        query,
    )?;
    if !matched {
        return Ok(None);
    }
    actions::dispatch(&stored.rule.action, query).map(Some)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Unique rule id for template instantiation.
/// Format: rule_YYYYMMDDHHmmss_xxxxxx
fn generate_rule_id() -> String {
    let datetime = Utc::now().format("%Y%m%d%H%M%S");
    let random: u32 = rand::thread_rng().gen_range(0..0xFFFFFF);
    format!("rule_{}_{:06x}", datetime, random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgate_core::ast::{Action, RuleTrigger};
    use semgate_core::types::UserContext;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("SELECT email FROM users", "select", UserContext::new("guest"))
            .with_tables(vec!["users".to_string()])
            .with_columns(vec!["email".to_string()])
    }

    fn table_rule(expression: &str) -> Rule {
        Rule::new(
            "r1",
            "Table rule",
            RuleType::AccessPolicy,
            RuleScope::Table,
            Severity::Block,
            100,
            Condition::expression(expression),
            Action::deny("no"),
        )
    }

    #[test]
    fn test_scope_matching_by_condition_text() {
        let ctx = ctx();
        assert!(is_applicable(&table_rule("'users' in {tables}"), &ctx));
        assert!(!is_applicable(&table_rule("'orders' in {tables}"), &ctx));
    }

    #[test]
    fn test_disabled_and_wrong_trigger_not_applicable() {
        let ctx = ctx();
        let disabled = table_rule("'users' in {tables}").disabled();
        assert!(!is_applicable(&disabled, &ctx));

        let after = table_rule("'users' in {tables}").with_trigger(RuleTrigger::AfterQuery);
        assert!(!is_applicable(&after, &ctx));
    }

    #[test]
    fn test_non_textual_condition_never_matches_table_scope() {
        let ctx = ctx();
        let mut rule = table_rule("unused");
        rule.condition = Condition::function(
            semgate_core::ast::BuiltinFunction::HasTable,
            HashMap::new(),
        );
        assert!(!is_applicable(&rule, &ctx));

        rule.scope = RuleScope::Global;
        assert!(is_applicable(&rule, &ctx));
    }

    #[test]
    fn test_generated_rule_id_shape() {
        let id = generate_rule_id();
        assert!(id.starts_with("rule_"));
        // rule_ + 14 digit timestamp + _ + 6 hex chars
        assert_eq!(id.len(), 5 + 14 + 1 + 6);
    }
}
