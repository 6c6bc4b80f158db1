//! Query execution context
//!
//! The context is the read-only input to rule evaluation: the query, its
//! referenced tables and columns, the acting user, and a timestamp. It is
//! never mutated by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The query and its metadata submitted for evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Raw query text
    pub query: String,

    /// Query kind (e.g. "select", "insert", "update", "delete")
    pub query_type: String,

    /// Tables referenced by the query
    #[serde(default)]
    pub tables: Vec<String>,

    /// Columns referenced by the query
    #[serde(default)]
    pub columns: Vec<String>,

    /// Acting user
    pub user: UserContext,

    /// Submission time, also the reference point for time-window conditions
    pub timestamp: DateTime<Utc>,
}

/// The acting user: role plus granted permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub role: String,

    #[serde(default)]
    pub permissions: Vec<String>,
}

impl ExecutionContext {
    /// Create a context for a query submitted now.
    pub fn new(
        query: impl Into<String>,
        query_type: impl Into<String>,
        user: UserContext,
    ) -> Self {
        Self {
            query: query.into(),
            query_type: query_type.into(),
            tables: Vec::new(),
            columns: Vec::new(),
            user,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl UserContext {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }
}
