//! File system based repository implementation

use async_trait::async_trait;
use semgate_core::ast::{Rule, RuleSet, RuleTemplate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

use crate::error::RepositoryError;
use crate::traits::RuleRepository;
use crate::RepositoryResult;

/// Subdirectory holding one file per rule
pub const RULES_DIR: &str = "rules";
/// Subdirectory holding one file per rule set
pub const RULE_SETS_DIR: &str = "rule-sets";
/// Subdirectory holding one file per template
pub const TEMPLATES_DIR: &str = "templates";

/// File system based repository
///
/// Persists each artifact as `<id>.json` inside its directory. Loading
/// scans a directory and deserializes every `.json` file independently;
/// unparseable files are logged and skipped so one bad artifact cannot
/// abort startup.
pub struct FileSystemRepository {
    root_path: PathBuf,
}

impl FileSystemRepository {
    /// Open a repository rooted at `root_path`, creating the root and the
    /// three artifact directories if absent.
    pub async fn open<P: AsRef<Path>>(root_path: P) -> RepositoryResult<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        for dir in [RULES_DIR, RULE_SETS_DIR, TEMPLATES_DIR] {
            fs::create_dir_all(root_path.join(dir)).await?;
        }
        Ok(Self { root_path })
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root_path
    }

    fn artifact_path(&self, dir: &str, id: &str) -> PathBuf {
        self.root_path.join(dir).join(format!("{}.json", id))
    }

    async fn load_dir<T: DeserializeOwned>(
        &self,
        dir: &str,
        what: &str,
    ) -> RepositoryResult<Vec<T>> {
        let path = self.root_path.join(dir);
        let mut artifacts = Vec::new();

        let mut entries = fs::read_dir(&path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_path = entry.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&file_path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "skipping unreadable {} file", what);
                    continue;
                }
            };
            match serde_json::from_str::<T>(&content) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "skipping unparseable {} file", what);
                }
            }
        }

        Ok(artifacts)
    }

    async fn save_artifact<T: Serialize>(
        &self,
        dir: &str,
        id: &str,
        artifact: &T,
    ) -> RepositoryResult<()> {
        let path = self.artifact_path(dir, id);
        let json = serde_json::to_string_pretty(artifact)?;
        fs::write(&path, json).await?;
        Ok(())
    }

    async fn delete_artifact(&self, dir: &str, id: &str) -> RepositoryResult<()> {
        let path = self.artifact_path(dir, id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::NotFound { id: id.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RuleRepository for FileSystemRepository {
    async fn load_rules(&self) -> RepositoryResult<Vec<Rule>> {
        self.load_dir(RULES_DIR, "rule").await
    }

    async fn save_rule(&self, rule: &Rule) -> RepositoryResult<()> {
        self.save_artifact(RULES_DIR, &rule.id, rule).await
    }

    async fn delete_rule(&self, id: &str) -> RepositoryResult<()> {
        self.delete_artifact(RULES_DIR, id).await
    }

    async fn load_rule_sets(&self) -> RepositoryResult<Vec<RuleSet>> {
        self.load_dir(RULE_SETS_DIR, "rule set").await
    }

    async fn save_rule_set(&self, rule_set: &RuleSet) -> RepositoryResult<()> {
        self.save_artifact(RULE_SETS_DIR, &rule_set.id, rule_set).await
    }

    async fn delete_rule_set(&self, id: &str) -> RepositoryResult<()> {
        self.delete_artifact(RULE_SETS_DIR, id).await
    }

    async fn load_templates(&self) -> RepositoryResult<Vec<RuleTemplate>> {
        self.load_dir(TEMPLATES_DIR, "template").await
    }

    async fn save_template(&self, template: &RuleTemplate) -> RepositoryResult<()> {
        self.save_artifact(TEMPLATES_DIR, &template.id, template)
            .await
    }

    async fn delete_template(&self, id: &str) -> RepositoryResult<()> {
        self.delete_artifact(TEMPLATES_DIR, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgate_core::ast::{Action, Condition, RuleScope, RuleType, Severity};
    use tempfile::TempDir;

    fn sample_rule(id: &str) -> Rule {
        Rule::new(
            id,
            "Sample rule",
            RuleType::AccessPolicy,
            RuleScope::Global,
            Severity::Warning,
            100,
            Condition::expression("{user.role} == 'guest'"),
            Action::deny("guests denied"),
        )
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("governance");
        let _repo = FileSystemRepository::open(&root).await.unwrap();

        assert!(root.join(RULES_DIR).is_dir());
        assert!(root.join(RULE_SETS_DIR).is_dir());
        assert!(root.join(TEMPLATES_DIR).is_dir());
    }

    #[tokio::test]
    async fn test_rule_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = FileSystemRepository::open(dir.path()).await.unwrap();

        let rule = sample_rule("r1");
        repo.save_rule(&rule).await.unwrap();

        assert!(dir.path().join(RULES_DIR).join("r1.json").is_file());

        let loaded = repo.load_rules().await.unwrap();
        assert_eq!(loaded, vec![rule]);
    }

    #[tokio::test]
    async fn test_unparseable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let repo = FileSystemRepository::open(dir.path()).await.unwrap();

        repo.save_rule(&sample_rule("good")).await.unwrap();
        tokio::fs::write(dir.path().join(RULES_DIR).join("bad.json"), "{ not json")
            .await
            .unwrap();

        let loaded = repo.load_rules().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "good");
    }

    #[tokio::test]
    async fn test_non_json_files_ignored() {
        let dir = TempDir::new().unwrap();
        let repo = FileSystemRepository::open(dir.path()).await.unwrap();

        tokio::fs::write(dir.path().join(RULES_DIR).join("README.md"), "notes")
            .await
            .unwrap();

        assert!(repo.load_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_rule() {
        let dir = TempDir::new().unwrap();
        let repo = FileSystemRepository::open(dir.path()).await.unwrap();

        repo.save_rule(&sample_rule("r1")).await.unwrap();
        repo.delete_rule("r1").await.unwrap();
        assert!(repo.load_rules().await.unwrap().is_empty());

        let err = repo.delete_rule("r1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rule_set_and_template_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = FileSystemRepository::open(dir.path()).await.unwrap();

        let set = RuleSet::new("s1", "Set One", vec!["r1".to_string()]);
        repo.save_rule_set(&set).await.unwrap();
        assert_eq!(repo.load_rule_sets().await.unwrap(), vec![set]);

        let template = RuleTemplate {
            id: "t1".to_string(),
            name: "Template One".to_string(),
            description: None,
            rule: serde_json::json!({"name": "stub"}),
            parameters: vec![],
        };
        repo.save_template(&template).await.unwrap();
        assert_eq!(repo.load_templates().await.unwrap(), vec![template]);
    }
}
