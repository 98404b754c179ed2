//! Semantic analysis for minic programs
//!
//! Scope management, the diagnostic taxonomy, and the analyzer itself.
//! A program with any semantic diagnostic is never executed.

pub mod analyzer;
pub mod errors;
pub mod scope;

pub use analyzer::{NarrowingPolicy, SemanticAnalyzer};
pub use errors::SemanticError;
pub use scope::{ScopeStack, Symbol};
