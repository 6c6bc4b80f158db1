//! Core trait definition for the repository pattern
//!
//! [`RuleRepository`] is the seam between the engine's in-memory store and
//! durable storage. Loading returns whole collections (startup is a full
//! scan); saves and deletes are per artifact, keyed by id.
//!
//! # Example
//!
//! ```no_run
//! use semgate_repository::{FileSystemRepository, RuleRepository};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let repo = FileSystemRepository::open("governance").await?;
//! let rules = repo.load_rules().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use semgate_core::ast::{Rule, RuleSet, RuleTemplate};

use crate::RepositoryResult;

/// Storage boundary for rules, rule sets, and templates
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Load every persisted rule. Implementations skip and log artifacts
    /// that fail to parse rather than aborting the load.
    async fn load_rules(&self) -> RepositoryResult<Vec<Rule>>;

    async fn save_rule(&self, rule: &Rule) -> RepositoryResult<()>;

    async fn delete_rule(&self, id: &str) -> RepositoryResult<()>;

    async fn load_rule_sets(&self) -> RepositoryResult<Vec<RuleSet>>;

    async fn save_rule_set(&self, rule_set: &RuleSet) -> RepositoryResult<()>;

    async fn delete_rule_set(&self, id: &str) -> RepositoryResult<()>;

    async fn load_templates(&self) -> RepositoryResult<Vec<RuleTemplate>>;

    async fn save_template(&self, template: &RuleTemplate) -> RepositoryResult<()>;

    async fn delete_template(&self, id: &str) -> RepositoryResult<()>;
}
