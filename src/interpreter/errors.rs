//! Runtime error types

use crate::parser::ast::SourceLocation;
use std::fmt;

/// Errors raised during evaluation. Execution stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Integer division or modulo by a runtime zero
    DivisionByZero { location: SourceLocation },
    /// Load or store through an address with no live slot (dangling pointer,
    /// out-of-scope storage, stray pointer arithmetic)
    InvalidMemoryAccess {
        address: u64,
        location: SourceLocation,
    },
    /// Array index outside the declared bounds
    IndexOutOfRange {
        index: i64,
        size: usize,
        location: SourceLocation,
    },
    /// Call depth exceeded the configured bound
    StackOverflow {
        depth: usize,
        location: SourceLocation,
    },
    /// An operation the analyzer should have rejected; reaching this means
    /// evaluation was attempted on an unanalyzed or inconsistent tree
    InvalidOperation {
        message: String,
        location: SourceLocation,
    },
}

impl RuntimeError {
    /// Returns the source location where the error occurred.
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::DivisionByZero { location }
            | RuntimeError::InvalidMemoryAccess { location, .. }
            | RuntimeError::IndexOutOfRange { location, .. }
            | RuntimeError::StackOverflow { location, .. }
            | RuntimeError::InvalidOperation { location, .. } => *location,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::DivisionByZero { location } => {
                write!(f, "Runtime error at {}: division by zero", location)
            }
            RuntimeError::InvalidMemoryAccess { address, location } => {
                write!(
                    f,
                    "Runtime error at {}: invalid memory access at 0x{:x}",
                    location, address
                )
            }
            RuntimeError::IndexOutOfRange {
                index,
                size,
                location,
            } => {
                write!(
                    f,
                    "Runtime error at {}: index {} out of range for array of size {}",
                    location, index, size
                )
            }
            RuntimeError::StackOverflow { depth, location } => {
                write!(
                    f,
                    "Runtime error at {}: call depth exceeded {} frames",
                    location, depth
                )
            }
            RuntimeError::InvalidOperation { message, location } => {
                write!(f, "Runtime error at {}: {}", location, message)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
