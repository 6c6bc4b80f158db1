//! In-memory repository, for tests and embedding without a disk layout

use async_trait::async_trait;
use semgate_core::ast::{Rule, RuleSet, RuleTemplate};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::RepositoryError;
use crate::traits::RuleRepository;
use crate::RepositoryResult;

/// In-memory backend implementing [`RuleRepository`]
#[derive(Default)]
pub struct MemoryRepository {
    rules: RwLock<HashMap<String, Rule>>,
    rule_sets: RwLock<HashMap<String, RuleSet>>,
    templates: RwLock<HashMap<String, RuleTemplate>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted rules, for test assertions.
    pub async fn rule_count(&self) -> usize {
        self.rules.read().await.len()
    }
}

#[async_trait]
impl RuleRepository for MemoryRepository {
    async fn load_rules(&self) -> RepositoryResult<Vec<Rule>> {
        Ok(self.rules.read().await.values().cloned().collect())
    }

    async fn save_rule(&self, rule: &Rule) -> RepositoryResult<()> {
        self.rules
            .write()
            .await
            .insert(rule.id.clone(), rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, id: &str) -> RepositoryResult<()> {
        self.rules
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }

    async fn load_rule_sets(&self) -> RepositoryResult<Vec<RuleSet>> {
        Ok(self.rule_sets.read().await.values().cloned().collect())
    }

    async fn save_rule_set(&self, rule_set: &RuleSet) -> RepositoryResult<()> {
        self.rule_sets
            .write()
            .await
            .insert(rule_set.id.clone(), rule_set.clone());
        Ok(())
    }

    async fn delete_rule_set(&self, id: &str) -> RepositoryResult<()> {
        self.rule_sets
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }

    async fn load_templates(&self) -> RepositoryResult<Vec<RuleTemplate>> {
        Ok(self.templates.read().await.values().cloned().collect())
    }

    async fn save_template(&self, template: &RuleTemplate) -> RepositoryResult<()> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> RepositoryResult<()> {
        self.templates
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }
}
