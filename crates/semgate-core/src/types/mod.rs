//! Runtime types: values, execution context, results, and collaborator schemas

pub mod context;
pub mod result;
pub mod schema;
pub mod value;

pub use context::{ExecutionContext, UserContext};
pub use result::{EngineResponse, ExecutionResult, ResponseStats};
pub use schema::{ColumnSchema, ForeignKey, SchemaSnapshot, TableSchema};
pub use value::Value;
