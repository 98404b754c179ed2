//! Tree-walking evaluator
//!
//! The [`Interpreter`] owns the memory arena and the runtime scope stack and
//! walks an analyzed program. Its implementation is split by concern:
//! construction and the run loop in `engine.rs`, statement execution in
//! `statements.rs`, expression evaluation in `expressions.rs`.

pub mod engine;
pub mod errors;
mod expressions;
mod statements;

pub use engine::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
pub use errors::RuntimeError;
pub use statements::Signal;
