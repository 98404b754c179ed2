//! Semantic diagnostic types
//!
//! Unlike lexical and syntax errors, semantic errors accumulate: the analyzer
//! reports every diagnostic it finds in one pass instead of stopping at the
//! first.

use crate::parser::ast::SourceLocation;
use std::fmt;

/// All semantic diagnostic kinds
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    /// Use of a name with no visible declaration (includes use after the
    /// declaring scope has ended)
    UndeclaredIdentifier {
        name: String,
        location: SourceLocation,
    },
    /// Second declaration of a name in the same scope
    Redeclaration {
        name: String,
        location: SourceLocation,
    },
    /// Incompatible types in an expression, assignment, argument, or return
    TypeMismatch {
        expected: String,
        found: String,
        location: SourceLocation,
    },
    /// Call with the wrong number of arguments
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },
    /// A non-void function with a path that falls off the end
    MissingReturn {
        function: String,
        location: SourceLocation,
    },
    /// break/continue outside a loop, or return outside a function
    InvalidControlContext {
        construct: &'static str,
        location: SourceLocation,
    },
    /// Division or modulo where both operands fold to constants and the
    /// divisor is zero
    ConstantDivisionByZero { location: SourceLocation },
    /// Constant index into an array of constant size, out of range
    ConstantIndexOutOfRange {
        index: i64,
        size: usize,
        location: SourceLocation,
    },
}

impl SemanticError {
    /// Returns the source location of this diagnostic.
    pub fn location(&self) -> SourceLocation {
        match self {
            SemanticError::UndeclaredIdentifier { location, .. }
            | SemanticError::Redeclaration { location, .. }
            | SemanticError::TypeMismatch { location, .. }
            | SemanticError::ArityMismatch { location, .. }
            | SemanticError::MissingReturn { location, .. }
            | SemanticError::InvalidControlContext { location, .. }
            | SemanticError::ConstantDivisionByZero { location }
            | SemanticError::ConstantIndexOutOfRange { location, .. } => *location,
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::UndeclaredIdentifier { name, location } => {
                write!(f, "Undeclared identifier '{}' at {}", name, location)
            }
            SemanticError::Redeclaration { name, location } => {
                write!(
                    f,
                    "Redeclaration of '{}' in the same scope at {}",
                    name, location
                )
            }
            SemanticError::TypeMismatch {
                expected,
                found,
                location,
            } => {
                write!(
                    f,
                    "Type mismatch at {}: expected {}, found {}",
                    location, expected, found
                )
            }
            SemanticError::ArityMismatch {
                function,
                expected,
                found,
                location,
            } => {
                write!(
                    f,
                    "Function '{}' called with {} argument(s) but takes {} at {}",
                    function, found, expected, location
                )
            }
            SemanticError::MissingReturn { function, location } => {
                write!(
                    f,
                    "Function '{}' may reach the end without returning a value (declared at {})",
                    function, location
                )
            }
            SemanticError::InvalidControlContext {
                construct,
                location,
            } => {
                write!(f, "'{}' used outside a valid context at {}", construct, location)
            }
            SemanticError::ConstantDivisionByZero { location } => {
                write!(f, "Division by constant zero at {}", location)
            }
            SemanticError::ConstantIndexOutOfRange {
                index,
                size,
                location,
            } => {
                write!(
                    f,
                    "Index {} out of range for array of size {} at {}",
                    index, size, location
                )
            }
        }
    }
}

impl std::error::Error for SemanticError {}
