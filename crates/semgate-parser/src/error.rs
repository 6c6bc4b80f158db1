//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid expression syntax
    #[error("Invalid expression syntax: {0}")]
    InvalidExpression(String),

    /// Unterminated string literal
    #[error("Unterminated string literal in: {0}")]
    UnterminatedString(String),
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
