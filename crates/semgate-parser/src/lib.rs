//! Semgate Parser - condition-expression parsing
//!
//! Parses the condition mini-language (boolean algebra over comparisons,
//! environment paths, and literals) into the AST defined in `semgate-core`.
//! Parsing happens once per rule; evaluation runs over the AST.

pub mod error;
pub mod expression_parser;

pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
