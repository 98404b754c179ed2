//! Simulated memory model
//!
//! Storage is an arena of typed slots indexed by opaque 64-bit addresses.
//! Arrays occupy contiguous runs of slots laid out row-major, with element
//! addresses spaced by the element's size so pointer arithmetic lands on
//! real slot boundaries.

pub mod arena;
pub mod value;

pub use arena::{Memory, MemoryError};
pub use value::{Address, Value};

use crate::parser::ast::{BaseType, Type};

/// Size in bytes of a scalar of the given type. Pointers are 8 bytes.
pub fn sizeof_scalar(ty: &Type) -> u64 {
    if ty.pointer_depth > 0 {
        return 8;
    }
    match ty.base {
        BaseType::Char => 1,
        BaseType::Int => 4,
        BaseType::Float => 4,
        BaseType::Double => 8,
        BaseType::Void => 0,
    }
}

/// Total size in bytes of an object of the given type; arrays multiply the
/// scalar size by every dimension.
pub fn sizeof_type(ty: &Type) -> u64 {
    let count: u64 = ty.array_dims.iter().map(|&d| d as u64).product();
    sizeof_scalar(ty) * count.max(1)
}

/// Byte distance between consecutive elements when indexing this type once.
/// For `int m[2][3]`, stepping the first index moves one 3-int row (12);
/// for `int a[3]` or `int *p` it moves one int (4).
pub fn element_stride(ty: &Type) -> u64 {
    if ty.is_array() {
        sizeof_type(&ty.element_type())
    } else {
        sizeof_scalar(&ty.pointee_type())
    }
}
