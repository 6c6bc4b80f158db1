//! Runtime error types

use semgate_repository::RepositoryError;
use thiserror::Error;

/// Engine error taxonomy: validation, conflict, evaluation, persistence
#[derive(Error, Debug)]
pub enum EngineError {
    /// Rule failed structural validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Candidate rule structurally conflicts with an existing rule
    #[error("Rule conflict: {0}")]
    Conflict(String),

    /// Failure while evaluating a single rule's condition or action
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Rule not present in the store
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// Template not present in the store
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Rule set not present in the store
    #[error("Rule set not found: {0}")]
    RuleSetNotFound(String),

    /// Persistence failure, surfaced to lifecycle callers
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, EngineError>;
