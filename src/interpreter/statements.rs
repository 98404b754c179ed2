//! Statement execution
//!
//! Every statement reports how control leaves it through a [`Signal`].
//! Blocks stop at the first non-normal signal and pass it up; loops absorb
//! `Break` and `Continue` and re-propagate `Return`; function calls absorb
//! `Return`.

use super::engine::Interpreter;
use super::errors::RuntimeError;
use crate::memory::{element_stride, Value};
use crate::parser::ast::{AstNode, SourceLocation, Type};
use crate::semantics::Symbol;

/// How control left a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Fell through; continue with the next statement
    Normal,
    Break,
    Continue,
    /// Unwind to the nearest function call with this value
    Return(Value),
}

impl Interpreter {
    pub(super) fn execute_statement(&mut self, stmt: &AstNode) -> Result<Signal, RuntimeError> {
        match stmt {
            AstNode::VarDecl {
                name,
                var_type,
                init,
                location,
            } => {
                self.execute_declaration(name, var_type, init.as_deref(), *location)?;
                Ok(Signal::Normal)
            }
            AstNode::Block { statements, .. } => {
                self.scopes.enter_scope();
                let mut signal = Signal::Normal;
                for stmt in statements {
                    match self.execute_statement(stmt) {
                        Ok(Signal::Normal) => {}
                        Ok(other) => {
                            signal = other;
                            break;
                        }
                        Err(err) => {
                            self.leave_scope();
                            return Err(err);
                        }
                    }
                }
                self.leave_scope();
                Ok(signal)
            }
            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }
            AstNode::While {
                condition, body, ..
            } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    match self.execute_statement(body)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                    }
                }
                Ok(Signal::Normal)
            }
            AstNode::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                // Declarations in the init clause scope to the loop
                self.scopes.enter_scope();
                let result = self.execute_for(init, condition.as_deref(), update.as_deref(), body);
                self.leave_scope();
                result
            }
            AstNode::Return { expr, .. } => {
                let value = match expr {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Void,
                };
                Ok(Signal::Return(value))
            }
            AstNode::Break { .. } => Ok(Signal::Break),
            AstNode::Continue { .. } => Ok(Signal::Continue),
            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(Signal::Normal)
            }
            other => Err(RuntimeError::InvalidOperation {
                message: "expression in statement position".to_string(),
                location: other.location(),
            }),
        }
    }

    fn execute_for(
        &mut self,
        init: &[AstNode],
        condition: Option<&AstNode>,
        update: Option<&AstNode>,
        body: &AstNode,
    ) -> Result<Signal, RuntimeError> {
        for stmt in init {
            self.execute_statement(stmt)?;
        }

        loop {
            if let Some(condition) = condition {
                if !self.evaluate_expression(condition)?.is_truthy() {
                    break;
                }
            }

            match self.execute_statement(body)? {
                Signal::Normal | Signal::Continue => {}
                Signal::Break => break,
                Signal::Return(value) => return Ok(Signal::Return(value)),
            }

            if let Some(update) = update {
                self.evaluate_expression(update)?;
            }
        }

        Ok(Signal::Normal)
    }

    /// Allocate storage, bind the name, and run the initializer if present.
    fn execute_declaration(
        &mut self,
        name: &str,
        var_type: &Type,
        init: Option<&AstNode>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        // Initializer runs before the name becomes visible
        let init_value = match init {
            Some(AstNode::InitList { .. }) | None => None,
            Some(expr) => Some(self.evaluate_expression(expr)?),
        };

        let address = self.memory.allocate(var_type);
        let symbol = Symbol {
            name: name.to_string(),
            ty: var_type.clone(),
            depth: self.scopes.depth(),
            address: Some(address),
        };
        if self.scopes.declare(symbol).is_err() {
            // The analyzer reports redeclarations; running anyway means the
            // tree was never analyzed
            return Err(RuntimeError::InvalidOperation {
                message: format!("redeclaration of '{}'", name),
                location,
            });
        }

        match init {
            Some(AstNode::InitList { elements, .. }) => {
                self.store_init_list(address, var_type, elements, location)?;
            }
            _ => {
                if let Some(value) = init_value {
                    self.memory
                        .store(address, value)
                        .map_err(|e| Self::memory_error(e, location))?;
                }
            }
        }
        Ok(())
    }

    /// Fill array storage from a brace list. Elements beyond the list keep
    /// their zero initialization.
    fn store_init_list(
        &mut self,
        base: u64,
        ty: &Type,
        elements: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        // Brace lists only initialize arrays; the analyzer rejects the rest,
        // so an unanalyzed tree degrades to an error instead of a panic
        if !ty.is_array() {
            return Err(RuntimeError::InvalidOperation {
                message: "brace initializer on a non-array object".to_string(),
                location,
            });
        }
        let stride = element_stride(ty);
        let element_type = ty.element_type();

        for (i, element) in elements.iter().enumerate() {
            let addr = base + i as u64 * stride;
            match element {
                AstNode::InitList {
                    elements: nested, ..
                } => {
                    self.store_init_list(addr, &element_type, nested, location)?;
                }
                expr => {
                    let value = self.evaluate_expression(expr)?;
                    self.memory
                        .store(addr, value)
                        .map_err(|e| Self::memory_error(e, location))?;
                }
            }
        }
        Ok(())
    }

    /// Pop the innermost scope and tombstone its storage.
    pub(super) fn leave_scope(&mut self) {
        for symbol in self.scopes.exit_scope() {
            if let Some(address) = symbol.address {
                self.memory.invalidate_object(address, &symbol.ty);
            }
        }
    }

    /// Pop the current frame and tombstone all of its storage.
    pub(super) fn leave_frame(&mut self) {
        for symbol in self.scopes.exit_frame() {
            if let Some(address) = symbol.address {
                self.memory.invalidate_object(address, &symbol.ty);
            }
        }
    }
}
