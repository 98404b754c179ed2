//! Expression evaluation
//!
//! Arithmetic follows C's usual conversions: `char` promotes to `int`, and
//! mixed operands widen to the wider floating type. `&&`, `||`, and the
//! ternary evaluate lazily. Pointer arithmetic scales by the pointee size
//! and is unchecked until the resulting address is loaded or stored.

use super::engine::Interpreter;
use super::errors::RuntimeError;
use super::statements::Signal;
use crate::memory::{sizeof_type, Address, Value};
use crate::parser::ast::{AstNode, BinOp, FunctionDef, SourceLocation, Type, UnOp};
use crate::semantics::Symbol;

impl Interpreter {
    pub(super) fn evaluate_expression(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        match expr {
            AstNode::IntLiteral(n, _) => Ok(Value::Int(*n)),
            AstNode::FloatLiteral(x, _) => Ok(Value::Double(*x)),
            AstNode::CharLiteral(c, _) => Ok(Value::Char(*c)),
            AstNode::StringLiteral(_, location) => Err(RuntimeError::InvalidOperation {
                message: "string literal has no runtime value".to_string(),
                location: *location,
            }),
            AstNode::Variable(name, location) => {
                let (address, ty) = self.resolve_symbol(name, *location)?;
                if ty.is_array() {
                    Ok(Value::Array {
                        base: address,
                        elem: ty.element_type(),
                        len: ty.array_dims[0],
                    })
                } else {
                    self.memory
                        .load(address)
                        .map_err(|e| Self::memory_error(e, *location))
                }
            }
            AstNode::Assignment { lhs, rhs, location } => {
                let (address, _) = self.lvalue_address(lhs)?;
                let value = self.evaluate_expression(rhs)?;
                self.memory
                    .store(address, value)
                    .map_err(|e| Self::memory_error(e, *location))?;
                // The assignment's value is the stored (coerced) value
                self.memory
                    .load(address)
                    .map_err(|e| Self::memory_error(e, *location))
            }
            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => match op {
                BinOp::And => {
                    if !self.evaluate_expression(left)?.is_truthy() {
                        return Ok(Value::Int(0));
                    }
                    let right = self.evaluate_expression(right)?;
                    Ok(Value::Int(right.is_truthy() as i64))
                }
                BinOp::Or => {
                    if self.evaluate_expression(left)?.is_truthy() {
                        return Ok(Value::Int(1));
                    }
                    let right = self.evaluate_expression(right)?;
                    Ok(Value::Int(right.is_truthy() as i64))
                }
                _ => {
                    let left = self.evaluate_expression(left)?;
                    let right = self.evaluate_expression(right)?;
                    Self::apply_binary(*op, left, right, *location)
                }
            },
            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.evaluate_unary(*op, operand, *location),
            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.evaluate_expression(true_expr)
                } else {
                    self.evaluate_expression(false_expr)
                }
            }
            AstNode::SequenceExpr { first, second, .. } => {
                self.evaluate_expression(first)?;
                self.evaluate_expression(second)
            }
            AstNode::FunctionCall {
                name,
                args,
                location,
            } => {
                let def = self.functions.get(name).cloned().ok_or_else(|| {
                    RuntimeError::InvalidOperation {
                        message: format!("call to undefined function '{}'", name),
                        location: *location,
                    }
                })?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate_expression(arg)?);
                }
                self.call_function(&def, values, *location)
            }
            AstNode::ArrayAccess {
                array,
                index,
                location,
            } => {
                let (address, element_type) = self.element_address(array, index, *location)?;
                if element_type.is_array() {
                    Ok(Value::Array {
                        base: address,
                        elem: element_type.element_type(),
                        len: element_type.array_dims[0],
                    })
                } else {
                    self.memory
                        .load(address)
                        .map_err(|e| Self::memory_error(e, *location))
                }
            }
            other => Err(RuntimeError::InvalidOperation {
                message: "statement in expression position".to_string(),
                location: other.location(),
            }),
        }
    }

    fn evaluate_unary(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            UnOp::Neg => match self.evaluate_expression(operand)? {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Char(c) => Ok(Value::Int(-(c as i64))),
                Value::Float(x) => Ok(Value::Float(-x)),
                Value::Double(x) => Ok(Value::Double(-x)),
                other => Err(RuntimeError::InvalidOperation {
                    message: format!("cannot negate {}", other.type_name()),
                    location,
                }),
            },
            UnOp::Not => {
                let value = self.evaluate_expression(operand)?;
                Ok(Value::Int(!value.is_truthy() as i64))
            }
            UnOp::Deref => match self.evaluate_expression(operand)? {
                Value::Pointer { addr, .. } => self
                    .memory
                    .load(addr)
                    .map_err(|e| Self::memory_error(e, location)),
                Value::Array { base, elem, .. } => {
                    if elem.is_array() {
                        Ok(Value::Array {
                            base,
                            elem: elem.element_type(),
                            len: elem.array_dims[0],
                        })
                    } else {
                        self.memory
                            .load(base)
                            .map_err(|e| Self::memory_error(e, location))
                    }
                }
                other => Err(RuntimeError::InvalidOperation {
                    message: format!("cannot dereference {}", other.type_name()),
                    location,
                }),
            },
            UnOp::AddrOf => {
                let (address, ty) = self.lvalue_address(operand)?;
                Ok(Value::Pointer {
                    addr: address,
                    pointee: ty.scalar_type(),
                })
            }
        }
    }

    /// Resolve an assignable expression to its storage address and declared
    /// type: a variable, an array element, or a dereference.
    pub(super) fn lvalue_address(
        &mut self,
        expr: &AstNode,
    ) -> Result<(Address, Type), RuntimeError> {
        match expr {
            AstNode::Variable(name, location) => self.resolve_symbol(name, *location),
            AstNode::ArrayAccess {
                array,
                index,
                location,
            } => self.element_address(array, index, *location),
            AstNode::UnaryOp {
                op: UnOp::Deref,
                operand,
                location,
            } => match self.evaluate_expression(operand)? {
                Value::Pointer { addr, pointee } => Ok((addr, pointee)),
                Value::Array { base, elem, .. } => Ok((base, elem)),
                other => Err(RuntimeError::InvalidOperation {
                    message: format!("cannot dereference {}", other.type_name()),
                    location: *location,
                }),
            },
            other => Err(RuntimeError::InvalidOperation {
                message: "not an assignable location".to_string(),
                location: other.location(),
            }),
        }
    }

    fn resolve_symbol(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<(Address, Type), RuntimeError> {
        let symbol: &Symbol =
            self.scopes
                .resolve(name)
                .ok_or_else(|| RuntimeError::InvalidOperation {
                    message: format!("unresolved name '{}'", name),
                    location,
                })?;
        let address = symbol
            .address
            .ok_or_else(|| RuntimeError::InvalidOperation {
                message: format!("'{}' has no storage", name),
                location,
            })?;
        Ok((address, symbol.ty.clone()))
    }

    /// Address of `array[index]`. Array objects are bounds-checked against
    /// their declared length; raw pointers are not, and a stray address
    /// surfaces as an invalid access when it is used.
    fn element_address(
        &mut self,
        array: &AstNode,
        index: &AstNode,
        location: SourceLocation,
    ) -> Result<(Address, Type), RuntimeError> {
        let base_value = self.evaluate_expression(array)?;
        let index_value = self.evaluate_expression(index)?;
        let i = index_value
            .as_int()
            .ok_or_else(|| RuntimeError::InvalidOperation {
                message: format!("{} used as array index", index_value.type_name()),
                location,
            })?;

        match base_value {
            Value::Array { base, elem, len } => {
                if i < 0 || i as usize >= len {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        size: len,
                        location,
                    });
                }
                let stride = sizeof_type(&elem);
                Ok((base + i as u64 * stride, elem))
            }
            Value::Pointer { addr, pointee } => {
                let stride = sizeof_type(&pointee) as i64;
                Ok((addr.wrapping_add((i * stride) as u64), pointee))
            }
            other => Err(RuntimeError::InvalidOperation {
                message: format!("cannot index {}", other.type_name()),
                location,
            }),
        }
    }

    /// Invoke a function: bounds-check the call depth, push a frame, bind
    /// parameters, run the body, and absorb the `Return` signal.
    pub(super) fn call_function(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                depth: self.max_call_depth,
                location,
            });
        }
        self.call_depth += 1;
        self.scopes.enter_frame();

        let result = self.run_function_body(def, args, location);

        self.leave_frame();
        self.call_depth -= 1;
        result
    }

    fn run_function_body(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if args.len() != def.params.len() {
            return Err(RuntimeError::InvalidOperation {
                message: format!(
                    "'{}' called with {} argument(s), takes {}",
                    def.name,
                    args.len(),
                    def.params.len()
                ),
                location,
            });
        }

        for (param, value) in def.params.iter().zip(args) {
            let address = self.memory.allocate(&param.param_type);
            let symbol = Symbol {
                name: param.name.clone(),
                ty: param.param_type.clone(),
                depth: self.scopes.depth(),
                address: Some(address),
            };
            if self.scopes.declare(symbol).is_err() {
                return Err(RuntimeError::InvalidOperation {
                    message: format!("duplicate parameter '{}'", param.name),
                    location: def.location,
                });
            }
            self.memory
                .store(address, value)
                .map_err(|e| Self::memory_error(e, def.location))?;
        }

        for stmt in &def.body {
            match self.execute_statement(stmt)? {
                Signal::Normal => {}
                Signal::Return(value) => return Ok(value),
                Signal::Break | Signal::Continue => {
                    return Err(RuntimeError::InvalidOperation {
                        message: "loop control escaped the function body".to_string(),
                        location: def.location,
                    });
                }
            }
        }

        // Falling off the end of a non-void function is a MissingReturn
        // diagnostic; a void function just yields nothing
        Ok(Value::Void)
    }

    fn apply_binary(
        op: BinOp,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // Arrays decay to pointers in any operator context
        let left = Self::decay(left);
        let right = Self::decay(right);

        // Pointer ± integer, scaled by the pointee size
        if let Value::Pointer { addr, pointee } = &left {
            if matches!(op, BinOp::Add | BinOp::Sub) {
                if let Some(n) = right.as_int() {
                    let offset = n.wrapping_mul(sizeof_type(pointee) as i64);
                    let moved = if op == BinOp::Add {
                        addr.wrapping_add(offset as u64)
                    } else {
                        addr.wrapping_sub(offset as u64)
                    };
                    return Ok(Value::Pointer {
                        addr: moved,
                        pointee: pointee.clone(),
                    });
                }
            }
        }
        if let (Value::Pointer { addr: l, .. }, Value::Pointer { addr: r, .. }) = (&left, &right) {
            let result = match op {
                BinOp::Eq => l == r,
                BinOp::Ne => l != r,
                BinOp::Lt => l < r,
                BinOp::Le => l <= r,
                BinOp::Gt => l > r,
                BinOp::Ge => l >= r,
                _ => {
                    return Err(RuntimeError::InvalidOperation {
                        message: format!("'{}' on two pointers", op.symbol()),
                        location,
                    });
                }
            };
            return Ok(Value::Int(result as i64));
        }
        if let Value::Pointer { addr, pointee } = &right {
            if op == BinOp::Add {
                if let Some(n) = left.as_int() {
                    let offset = n.wrapping_mul(sizeof_type(pointee) as i64);
                    return Ok(Value::Pointer {
                        addr: addr.wrapping_add(offset as u64),
                        pointee: pointee.clone(),
                    });
                }
            }
        }

        match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                Self::compare(op, &left, &right, location)
            }
            BinOp::Mod | BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
                let (l, r) = match (left.as_int(), right.as_int()) {
                    (Some(l), Some(r)) => (l, r),
                    _ => {
                        return Err(RuntimeError::InvalidOperation {
                            message: format!(
                                "'{}' needs integer operands, got {} and {}",
                                op.symbol(),
                                left.type_name(),
                                right.type_name()
                            ),
                            location,
                        });
                    }
                };
                match op {
                    BinOp::Mod => {
                        if r == 0 {
                            Err(RuntimeError::DivisionByZero { location })
                        } else {
                            // Truncating remainder, sign follows the dividend
                            Ok(Value::Int(l.wrapping_rem(r)))
                        }
                    }
                    BinOp::BitAnd => Ok(Value::Int(l & r)),
                    BinOp::BitOr => Ok(Value::Int(l | r)),
                    BinOp::BitXor => Ok(Value::Int(l ^ r)),
                    _ => unreachable!(),
                }
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                Self::arithmetic(op, &left, &right, location)
            }
            BinOp::And | BinOp::Or => unreachable!("short-circuit ops handled by the caller"),
        }
    }

    fn arithmetic(
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // Integer path: char promotes to int, division truncates toward zero
        if let (Some(l), Some(r)) = (left.as_int(), right.as_int()) {
            return match op {
                BinOp::Add => Ok(Value::Int(l.wrapping_add(r))),
                BinOp::Sub => Ok(Value::Int(l.wrapping_sub(r))),
                BinOp::Mul => Ok(Value::Int(l.wrapping_mul(r))),
                BinOp::Div => {
                    if r == 0 {
                        Err(RuntimeError::DivisionByZero { location })
                    } else {
                        Ok(Value::Int(l.wrapping_div(r)))
                    }
                }
                _ => unreachable!(),
            };
        }

        let (l, r) = match (left.as_double(), right.as_double()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(RuntimeError::InvalidOperation {
                    message: format!(
                        "'{}' needs numeric operands, got {} and {}",
                        op.symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                    location,
                });
            }
        };
        // Floating division by zero yields infinity, not an error
        let result = match op {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            _ => unreachable!(),
        };

        // Result stays float only when neither operand was double
        let single = matches!(left, Value::Float(_)) && !matches!(right, Value::Double(_))
            || matches!(right, Value::Float(_)) && !matches!(left, Value::Double(_));
        if single {
            Ok(Value::Float(result as f32))
        } else {
            Ok(Value::Double(result))
        }
    }

    fn compare(
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // Exact integer comparison when both sides are integral
        if let (Some(l), Some(r)) = (left.as_int(), right.as_int()) {
            let result = match op {
                BinOp::Eq => l == r,
                BinOp::Ne => l != r,
                BinOp::Lt => l < r,
                BinOp::Le => l <= r,
                BinOp::Gt => l > r,
                BinOp::Ge => l >= r,
                _ => unreachable!(),
            };
            return Ok(Value::Int(result as i64));
        }

        let (l, r) = match (left.as_double(), right.as_double()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(RuntimeError::InvalidOperation {
                    message: format!(
                        "'{}' cannot compare {} and {}",
                        op.symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                    location,
                });
            }
        };
        let result = match op {
            BinOp::Eq => l == r,
            BinOp::Ne => l != r,
            BinOp::Lt => l < r,
            BinOp::Le => l <= r,
            BinOp::Gt => l > r,
            BinOp::Ge => l >= r,
            _ => unreachable!(),
        };
        Ok(Value::Int(result as i64))
    }

    fn decay(value: Value) -> Value {
        match value {
            Value::Array { base, elem, .. } => Value::Pointer {
                addr: base,
                pointee: elem,
            },
            other => other,
        }
    }
}
