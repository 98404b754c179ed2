//! Slot arena with tombstone invalidation
//!
//! Every scalar the program can address lives in one [`Slot`]. Slots are
//! never removed once allocated; scope exit flips them dead so a later
//! access through a stale pointer is detectable rather than silently
//! reading recycled storage.

use super::value::{Address, Value};
use super::{sizeof_scalar, sizeof_type};
use crate::parser::ast::{BaseType, Type};
use rustc_hash::FxHashMap;
use std::fmt;

/// First address handed out; 0 stays reserved as the null pointer.
const ARENA_BASE: Address = 0x1000;

/// Memory access failures, mapped to runtime errors at the interpreter
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// Address was never allocated
    Unallocated { address: Address },
    /// Address belonged to an object whose scope has ended
    Invalidated { address: Address },
    /// Value shape does not fit the slot (pointer into numeric storage or
    /// the reverse); unreachable after successful analysis
    IncompatibleStore { address: Address },
}

impl MemoryError {
    pub fn address(&self) -> Address {
        match self {
            MemoryError::Unallocated { address }
            | MemoryError::Invalidated { address }
            | MemoryError::IncompatibleStore { address } => *address,
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::Unallocated { address } => {
                write!(f, "Access to unallocated address 0x{:x}", address)
            }
            MemoryError::Invalidated { address } => {
                write!(f, "Access to out-of-scope storage at 0x{:x}", address)
            }
            MemoryError::IncompatibleStore { address } => {
                write!(f, "Incompatible store at 0x{:x}", address)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// One scalar storage cell
#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    ty: Type,
    live: bool,
}

/// The arena: a map from address to slot plus a bump allocator
#[derive(Debug, Default)]
pub struct Memory {
    slots: FxHashMap<Address, Slot>,
    next_address: Address,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            slots: FxHashMap::default(),
            next_address: ARENA_BASE,
        }
    }

    /// Allocate zero-initialized storage for an object of the given type and
    /// return its base address. Arrays get one slot per scalar element at
    /// consecutive stride-spaced addresses, row-major.
    pub fn allocate(&mut self, ty: &Type) -> Address {
        let scalar = ty.scalar_type();
        let stride = sizeof_scalar(&scalar).max(1);
        let count: u64 = ty.array_dims.iter().map(|&d| d as u64).product::<u64>().max(1);

        let base = self.next_address;
        self.next_address += sizeof_type(ty).max(stride);

        for i in 0..count {
            self.slots.insert(
                base + i * stride,
                Slot {
                    value: Self::zero_value(&scalar),
                    ty: scalar.clone(),
                    live: true,
                },
            );
        }

        base
    }

    fn zero_value(scalar: &Type) -> Value {
        if scalar.pointer_depth > 0 {
            return Value::Pointer {
                addr: 0,
                pointee: scalar.pointee_type(),
            };
        }
        match scalar.base {
            BaseType::Int => Value::Int(0),
            BaseType::Float => Value::Float(0.0),
            BaseType::Double => Value::Double(0.0),
            BaseType::Char => Value::Char(0),
            BaseType::Void => Value::Void,
        }
    }

    /// Read the value at an address, checking that the slot exists and its
    /// scope is still alive.
    pub fn load(&self, address: Address) -> Result<Value, MemoryError> {
        match self.slots.get(&address) {
            Some(slot) if slot.live => Ok(slot.value.clone()),
            Some(_) => Err(MemoryError::Invalidated { address }),
            None => Err(MemoryError::Unallocated { address }),
        }
    }

    /// Write a value to an address, coercing it to the slot's declared type.
    /// Numeric stores convert (a `char` slot truncates to its narrow range);
    /// arrays decay to pointers when stored into pointer slots.
    pub fn store(&mut self, address: Address, value: Value) -> Result<(), MemoryError> {
        let slot = match self.slots.get_mut(&address) {
            Some(slot) if slot.live => slot,
            Some(_) => return Err(MemoryError::Invalidated { address }),
            None => return Err(MemoryError::Unallocated { address }),
        };

        let coerced = Self::coerce(&slot.ty, value)
            .ok_or(MemoryError::IncompatibleStore { address })?;
        slot.value = coerced;
        Ok(())
    }

    fn coerce(ty: &Type, value: Value) -> Option<Value> {
        if ty.pointer_depth > 0 {
            return match value {
                Value::Pointer { addr, .. } => Some(Value::Pointer {
                    addr,
                    pointee: ty.pointee_type(),
                }),
                Value::Array { base, .. } => Some(Value::Pointer {
                    addr: base,
                    pointee: ty.pointee_type(),
                }),
                _ => None,
            };
        }
        match ty.base {
            BaseType::Int => value.as_double().map(|x| Value::Int(x as i64)),
            BaseType::Float => value.as_double().map(|x| Value::Float(x as f32)),
            BaseType::Double => value.as_double().map(Value::Double),
            BaseType::Char => value.as_double().map(|x| Value::Char(x as i64 as i8)),
            BaseType::Void => None,
        }
    }

    /// Tombstone every slot of an object so later access through a dangling
    /// pointer reports an invalidated address.
    pub fn invalidate_object(&mut self, base: Address, ty: &Type) {
        let scalar = ty.scalar_type();
        let stride = sizeof_scalar(&scalar).max(1);
        let count: u64 = ty.array_dims.iter().map(|&d| d as u64).product::<u64>().max(1);

        for i in 0..count {
            if let Some(slot) = self.slots.get_mut(&(base + i * stride)) {
                slot.live = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_allocate_load_store() {
        let mut memory = Memory::new();
        let addr = memory.allocate(&Type::new(BaseType::Int));
        assert_eq!(memory.load(addr).unwrap(), Value::Int(0));
        memory.store(addr, Value::Int(42)).unwrap();
        assert_eq!(memory.load(addr).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_unallocated_access() {
        let memory = Memory::new();
        assert!(matches!(
            memory.load(0xdead),
            Err(MemoryError::Unallocated { .. })
        ));
    }

    #[test]
    fn test_tombstone_after_invalidation() {
        let mut memory = Memory::new();
        let ty = Type::new(BaseType::Int);
        let addr = memory.allocate(&ty);
        memory.store(addr, Value::Int(7)).unwrap();
        memory.invalidate_object(addr, &ty);
        assert!(matches!(
            memory.load(addr),
            Err(MemoryError::Invalidated { .. })
        ));
        assert!(matches!(
            memory.store(addr, Value::Int(1)),
            Err(MemoryError::Invalidated { .. })
        ));
    }

    #[test]
    fn test_array_row_major_layout() {
        let mut memory = Memory::new();
        let ty = Type::new(BaseType::Int).with_array(2).with_array(3);
        let base = memory.allocate(&ty);

        // m[i][j] lives at base + (i*3 + j) * 4
        for i in 0..2u64 {
            for j in 0..3u64 {
                let addr = base + (i * 3 + j) * 4;
                memory.store(addr, Value::Int((i * 10 + j) as i64)).unwrap();
            }
        }
        assert_eq!(memory.load(base + (1 * 3 + 2) * 4).unwrap(), Value::Int(12));
        assert_eq!(memory.load(base).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_char_slot_truncates() {
        let mut memory = Memory::new();
        let addr = memory.allocate(&Type::new(BaseType::Char));
        memory.store(addr, Value::Int(321)).unwrap();
        assert_eq!(memory.load(addr).unwrap(), Value::Char(321i64 as i8));
    }

    #[test]
    fn test_double_to_int_store_truncates() {
        let mut memory = Memory::new();
        let addr = memory.allocate(&Type::new(BaseType::Int));
        memory.store(addr, Value::Double(3.9)).unwrap();
        assert_eq!(memory.load(addr).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_pointer_slot_rejects_numeric_shape_change() {
        let mut memory = Memory::new();
        let addr = memory.allocate(&Type::new(BaseType::Int).with_pointer());
        assert!(matches!(
            memory.store(addr, Value::Double(1.0)),
            Err(MemoryError::IncompatibleStore { .. })
        ));
    }

    #[test]
    fn test_array_decays_into_pointer_slot() {
        let mut memory = Memory::new();
        let array_ty = Type::new(BaseType::Int).with_array(3);
        let array_base = memory.allocate(&array_ty);
        let ptr_addr = memory.allocate(&Type::new(BaseType::Int).with_pointer());

        memory
            .store(
                ptr_addr,
                Value::Array {
                    base: array_base,
                    elem: Type::new(BaseType::Int),
                    len: 3,
                },
            )
            .unwrap();
        assert!(matches!(
            memory.load(ptr_addr).unwrap(),
            Value::Pointer { addr, .. } if addr == array_base
        ));
    }
}
