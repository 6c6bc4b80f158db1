//! Semgate Repository - persistence adapters for rules, rule sets, and
//! templates
//!
//! The engine owns rules in memory; this crate is the boundary where they
//! are loaded from and saved to durable storage. Two implementations ship:
//!
//! - [`FileSystemRepository`]: one JSON file per artifact under `rules/`,
//!   `rule-sets/`, and `templates/` directories
//! - [`MemoryRepository`]: in-process storage for tests and embedding

pub mod error;
pub mod file_system;
pub mod memory;
pub mod traits;

pub use error::{RepositoryError, RepositoryResult};
pub use file_system::FileSystemRepository;
pub use memory::MemoryRepository;
pub use traits::RuleRepository;
