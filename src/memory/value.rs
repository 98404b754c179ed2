//! Runtime value representation

use crate::parser::ast::Type;
use std::fmt;

/// Opaque address into the memory arena
pub type Address = u64;

/// A runtime value produced by expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Double(f64),
    Char(i8),
    /// Typed address; `pointee` is the type dereferencing yields
    Pointer { addr: Address, pointee: Type },
    /// An array object: base address, element type, element count of the
    /// leading dimension
    Array {
        base: Address,
        elem: Type,
        len: usize,
    },
    Void,
}

impl Value {
    /// Truthiness for conditions: zero and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Double(x) => *x != 0.0,
            Value::Char(c) => *c != 0,
            Value::Pointer { addr, .. } => *addr != 0,
            Value::Array { .. } => true,
            Value::Void => false,
        }
    }

    /// Widen to i64 where the value is integral.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    /// Widen to f64 where the value is numeric.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x as f64),
            Value::Double(x) => Some(*x),
            Value::Char(c) => Some(*c as f64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::Pointer { .. } => "pointer",
            Value::Array { .. } => "array",
            Value::Void => "void",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::Char(c) => {
                let byte = *c as u8;
                if byte.is_ascii_graphic() || byte == b' ' {
                    write!(f, "'{}'", byte as char)
                } else {
                    write!(f, "{}", c)
                }
            }
            Value::Pointer { addr, .. } => write!(f, "0x{:x}", addr),
            Value::Array { base, len, .. } => write!(f, "[{} elements at 0x{:x}]", len, base),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Double(0.0).is_truthy());
        assert!(Value::Char(65).is_truthy());
        assert!(!Value::Char(0).is_truthy());
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Value::Char(65).as_int(), Some(65));
        assert_eq!(Value::Double(2.5).as_int(), None);
        assert_eq!(Value::Int(3).as_double(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_double(), Some(1.5));
    }
}
