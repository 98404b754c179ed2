//! Semantic analyzer
//!
//! Walks the AST once, collecting every diagnostic instead of aborting at the
//! first. Function signatures are gathered in a pre-pass so calls may precede
//! definitions (mutual recursion works); variables are declare-before-use.
//! The analyzer only validates and reports; it attaches nothing to the tree.

use super::errors::SemanticError;
use super::scope::{ScopeStack, Symbol};
use crate::parser::ast::*;
use rustc_hash::FxHashMap;

/// What to do with implicit conversions that can lose information
/// (double → float, float → int, int → char).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrowingPolicy {
    /// Allow, truncating at run time (C behavior)
    #[default]
    Truncate,
    /// Report a type mismatch
    Reject,
}

/// A function's callable shape, collected in the pre-pass
#[derive(Debug, Clone)]
struct FunctionSig {
    params: Vec<Type>,
    return_type: Type,
}

/// The static type of an expression, as far as analysis can tell.
///
/// `Unknown` marks subexpressions that already produced a diagnostic so a
/// single mistake does not cascade into a wall of follow-on errors.
#[derive(Debug, Clone, PartialEq)]
enum ExprType {
    Value(Type),
    /// String literals have no place in the type system; any typed use of
    /// one is a mismatch
    StringLit,
    Unknown,
}

/// Semantic analyzer over a parsed program
pub struct SemanticAnalyzer {
    scopes: ScopeStack,
    functions: FxHashMap<String, FunctionSig>,
    errors: Vec<SemanticError>,
    loop_depth: usize,
    /// Return type of the function being checked; `None` at file scope
    current_return: Option<Type>,
    narrowing: NarrowingPolicy,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::with_narrowing(NarrowingPolicy::default())
    }

    pub fn with_narrowing(narrowing: NarrowingPolicy) -> Self {
        Self {
            scopes: ScopeStack::new(),
            functions: FxHashMap::default(),
            errors: Vec::new(),
            loop_depth: 0,
            current_return: None,
            narrowing,
        }
    }

    /// Check the whole program, returning every diagnostic found.
    pub fn analyze(mut self, program: &Program) -> Result<(), Vec<SemanticError>> {
        // Pre-pass: collect every function signature so calls can precede
        // definitions in the file.
        for node in &program.nodes {
            if let AstNode::FunctionDef(def) = node {
                let sig = FunctionSig {
                    params: def.params.iter().map(|p| p.param_type.clone()).collect(),
                    return_type: def.return_type.clone(),
                };
                if self.functions.insert(def.name.clone(), sig).is_some() {
                    self.errors.push(SemanticError::Redeclaration {
                        name: def.name.clone(),
                        location: def.location,
                    });
                }
            }
        }

        for node in &program.nodes {
            match node {
                AstNode::FunctionDef(def) => self.check_function(def),
                other => self.check_statement(other),
            }
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn check_function(&mut self, def: &FunctionDef) {
        self.current_return = Some(def.return_type.clone());
        self.scopes.enter_frame();

        for param in &def.params {
            let symbol = Symbol {
                name: param.name.clone(),
                ty: param.param_type.clone(),
                depth: self.scopes.depth(),
                address: None,
            };
            if self.scopes.declare(symbol).is_err() {
                self.errors.push(SemanticError::Redeclaration {
                    name: param.name.clone(),
                    location: def.location,
                });
            }
        }

        for stmt in &def.body {
            self.check_statement(stmt);
        }

        self.scopes.exit_frame();
        self.current_return = None;

        if !def.return_type.is_void() && !Self::always_returns(&def.body) {
            self.errors.push(SemanticError::MissingReturn {
                function: def.name.clone(),
                location: def.location,
            });
        }
    }

    /// Conservative structural check: does every path through these
    /// statements hit a `return`? Loops never count even when their
    /// condition is constant.
    fn always_returns(statements: &[AstNode]) -> bool {
        statements.iter().any(Self::statement_always_returns)
    }

    fn statement_always_returns(stmt: &AstNode) -> bool {
        match stmt {
            AstNode::Return { .. } => true,
            AstNode::Block { statements, .. } => Self::always_returns(statements),
            AstNode::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                Self::statement_always_returns(then_branch)
                    && Self::statement_always_returns(else_branch)
            }
            _ => false,
        }
    }

    fn check_statement(&mut self, stmt: &AstNode) {
        match stmt {
            AstNode::VarDecl {
                name,
                var_type,
                init,
                location,
            } => {
                // Initializer is checked before the name is declared, so
                // `int x = x;` reports the use on the right-hand side.
                if let Some(init) = init {
                    self.check_initializer(var_type, init);
                }
                let symbol = Symbol {
                    name: name.clone(),
                    ty: var_type.clone(),
                    depth: self.scopes.depth(),
                    address: None,
                };
                if self.scopes.declare(symbol).is_err() {
                    self.errors.push(SemanticError::Redeclaration {
                        name: name.clone(),
                        location: *location,
                    });
                }
            }
            AstNode::Block { statements, .. } => {
                self.scopes.enter_scope();
                for stmt in statements {
                    self.check_statement(stmt);
                }
                self.scopes.exit_scope();
            }
            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition);
                self.check_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch);
                }
            }
            AstNode::While {
                condition, body, ..
            } => {
                self.check_condition(condition);
                self.loop_depth += 1;
                self.check_statement(body);
                self.loop_depth -= 1;
            }
            AstNode::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                // Loop-clause declarations scope to the loop
                self.scopes.enter_scope();
                for stmt in init {
                    self.check_statement(stmt);
                }
                if let Some(condition) = condition {
                    self.check_condition(condition);
                }
                if let Some(update) = update {
                    self.check_expression(update);
                }
                self.loop_depth += 1;
                self.check_statement(body);
                self.loop_depth -= 1;
                self.scopes.exit_scope();
            }
            AstNode::Return { expr, location } => {
                let return_type = match self.current_return.clone() {
                    Some(ty) => ty,
                    None => {
                        self.errors.push(SemanticError::InvalidControlContext {
                            construct: "return",
                            location: *location,
                        });
                        if let Some(expr) = expr {
                            self.check_expression(expr);
                        }
                        return;
                    }
                };
                match (expr, return_type.is_void()) {
                    (Some(expr), false) => {
                        let found = self.check_expression(expr);
                        self.require_assignable(&return_type, &found, expr.location());
                    }
                    (Some(expr), true) => {
                        let found = self.check_expression(expr);
                        if let ExprType::Value(ty) = found {
                            self.errors.push(SemanticError::TypeMismatch {
                                expected: "void".to_string(),
                                found: ty.to_string(),
                                location: *location,
                            });
                        }
                    }
                    (None, false) => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: return_type.to_string(),
                            found: "void".to_string(),
                            location: *location,
                        });
                    }
                    (None, true) => {}
                }
            }
            AstNode::Break { location } => {
                if self.loop_depth == 0 {
                    self.errors.push(SemanticError::InvalidControlContext {
                        construct: "break",
                        location: *location,
                    });
                }
            }
            AstNode::Continue { location } => {
                if self.loop_depth == 0 {
                    self.errors.push(SemanticError::InvalidControlContext {
                        construct: "continue",
                        location: *location,
                    });
                }
            }
            AstNode::ExpressionStatement { expr, .. } => {
                self.check_expression(expr);
            }
            other => {
                // Expressions in statement position (shouldn't come from our
                // parser, but the walk is total)
                self.check_expression(other);
            }
        }
    }

    /// Conditions must be scalar (numeric or pointer)
    fn check_condition(&mut self, condition: &AstNode) {
        let ty = self.check_expression(condition);
        match ty {
            ExprType::Value(ref t) if t.is_numeric() || t.is_pointer() => {}
            ExprType::Value(t) => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "scalar condition".to_string(),
                    found: t.to_string(),
                    location: condition.location(),
                });
            }
            ExprType::StringLit => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "scalar condition".to_string(),
                    found: "string literal".to_string(),
                    location: condition.location(),
                });
            }
            ExprType::Unknown => {}
        }
    }

    /// Check a declaration initializer, including brace lists for arrays.
    fn check_initializer(&mut self, target: &Type, init: &AstNode) {
        if let AstNode::InitList { elements, location } = init {
            if !target.is_array() {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: target.to_string(),
                    found: "initializer list".to_string(),
                    location: *location,
                });
                return;
            }
            let size = target.array_dims[0];
            if elements.len() > size {
                self.errors.push(SemanticError::ConstantIndexOutOfRange {
                    index: elements.len() as i64 - 1,
                    size,
                    location: *location,
                });
            }
            let element_type = target.element_type();
            for element in elements {
                self.check_initializer(&element_type, element);
            }
            return;
        }

        let found = self.check_expression(init);
        self.require_assignable(target, &found, init.location());
    }

    fn check_expression(&mut self, expr: &AstNode) -> ExprType {
        match expr {
            AstNode::IntLiteral(_, _) => ExprType::Value(Type::new(BaseType::Int)),
            AstNode::FloatLiteral(_, _) => ExprType::Value(Type::new(BaseType::Double)),
            AstNode::CharLiteral(_, _) => ExprType::Value(Type::new(BaseType::Char)),
            AstNode::StringLiteral(_, _) => ExprType::StringLit,
            AstNode::InitList { location, .. } => {
                // Brace lists are only valid as declaration initializers
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "expression".to_string(),
                    found: "initializer list".to_string(),
                    location: *location,
                });
                ExprType::Unknown
            }
            AstNode::Variable(name, location) => match self.scopes.resolve(name) {
                Some(symbol) => ExprType::Value(symbol.ty.clone()),
                None => {
                    self.errors.push(SemanticError::UndeclaredIdentifier {
                        name: name.clone(),
                        location: *location,
                    });
                    ExprType::Unknown
                }
            },
            AstNode::Assignment { lhs, rhs, location } => {
                let target = self.check_lvalue(lhs);
                let found = self.check_expression(rhs);
                if let ExprType::Value(ref target_ty) = target {
                    self.require_assignable(target_ty, &found, *location);
                }
                target
            }
            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => self.check_binary(*op, left, right, *location),
            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.check_unary(*op, operand, *location),
            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                self.check_condition(condition);
                let then_ty = self.check_expression(true_expr);
                let else_ty = self.check_expression(false_expr);
                self.unify_branches(then_ty, else_ty, false_expr.location())
            }
            AstNode::SequenceExpr { first, second, .. } => {
                self.check_expression(first);
                self.check_expression(second)
            }
            AstNode::FunctionCall {
                name,
                args,
                location,
            } => self.check_call(name, args, *location),
            AstNode::ArrayAccess {
                array,
                index,
                location,
            } => self.check_index(array, index, *location),
            other => {
                // Statement nodes can't appear in expression position with
                // this parser; report at their location if they somehow do.
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "expression".to_string(),
                    found: "statement".to_string(),
                    location: other.location(),
                });
                ExprType::Unknown
            }
        }
    }

    /// An assignment target: variable, array element, or dereference.
    fn check_lvalue(&mut self, lhs: &AstNode) -> ExprType {
        match lhs {
            AstNode::Variable(_, _) | AstNode::ArrayAccess { .. } => self.check_expression(lhs),
            AstNode::UnaryOp {
                op: UnOp::Deref, ..
            } => self.check_expression(lhs),
            other => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "assignable location".to_string(),
                    found: "expression".to_string(),
                    location: other.location(),
                });
                self.check_expression(other);
                ExprType::Unknown
            }
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        location: SourceLocation,
    ) -> ExprType {
        let left_ty = self.check_expression(left);
        let right_ty = self.check_expression(right);

        // Constant-foldable zero divisor is a compile-time diagnostic
        if matches!(op, BinOp::Div | BinOp::Mod) {
            if let (Some(_), Some(0)) = (Self::fold_const(left), Self::fold_const(right)) {
                self.errors
                    .push(SemanticError::ConstantDivisionByZero { location });
            }
        }

        let (lt, rt) = match (&left_ty, &right_ty) {
            (ExprType::Value(l), ExprType::Value(r)) => (l, r),
            (ExprType::StringLit, _) | (_, ExprType::StringLit) => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "numeric operand".to_string(),
                    found: "string literal".to_string(),
                    location,
                });
                return ExprType::Unknown;
            }
            _ => return ExprType::Unknown,
        };

        match op {
            BinOp::Mod | BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
                if lt.is_integral() && rt.is_integral() {
                    ExprType::Value(Type::new(BaseType::Int))
                } else {
                    self.errors.push(SemanticError::TypeMismatch {
                        expected: "integer operands".to_string(),
                        found: format!("{} {} {}", lt, op.symbol(), rt),
                        location,
                    });
                    ExprType::Unknown
                }
            }
            BinOp::Add | BinOp::Sub => {
                // Pointer arithmetic: pointer ± integer (and array decay)
                if (lt.is_pointer() || lt.is_array()) && rt.is_integral() {
                    return ExprType::Value(Self::decayed(lt));
                }
                if op == BinOp::Add && lt.is_integral() && (rt.is_pointer() || rt.is_array()) {
                    return ExprType::Value(Self::decayed(rt));
                }
                self.numeric_result(lt, rt, op, location)
            }
            BinOp::Mul | BinOp::Div => self.numeric_result(lt, rt, op, location),
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let pointers = (lt.is_pointer() || lt.is_array()) && (rt.is_pointer() || rt.is_array());
                if pointers || (lt.is_numeric() && rt.is_numeric()) {
                    ExprType::Value(Type::new(BaseType::Int))
                } else {
                    self.errors.push(SemanticError::TypeMismatch {
                        expected: "comparable operands".to_string(),
                        found: format!("{} {} {}", lt, op.symbol(), rt),
                        location,
                    });
                    ExprType::Unknown
                }
            }
            BinOp::And | BinOp::Or => {
                let scalar = |t: &Type| t.is_numeric() || t.is_pointer();
                if scalar(lt) && scalar(rt) {
                    ExprType::Value(Type::new(BaseType::Int))
                } else {
                    self.errors.push(SemanticError::TypeMismatch {
                        expected: "scalar operands".to_string(),
                        found: format!("{} {} {}", lt, op.symbol(), rt),
                        location,
                    });
                    ExprType::Unknown
                }
            }
        }
    }

    /// Usual arithmetic result: the wider of the two numeric operand types
    fn numeric_result(
        &mut self,
        lt: &Type,
        rt: &Type,
        op: BinOp,
        location: SourceLocation,
    ) -> ExprType {
        if lt.is_numeric() && rt.is_numeric() {
            ExprType::Value(Type::new(Self::wider(lt.base, rt.base)))
        } else {
            self.errors.push(SemanticError::TypeMismatch {
                expected: "numeric operands".to_string(),
                found: format!("{} {} {}", lt, op.symbol(), rt),
                location,
            });
            ExprType::Unknown
        }
    }

    fn check_unary(&mut self, op: UnOp, operand: &AstNode, location: SourceLocation) -> ExprType {
        match op {
            UnOp::Neg => {
                let ty = self.check_expression(operand);
                match ty {
                    ExprType::Value(ref t) if t.is_numeric() => ty,
                    ExprType::Value(t) => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "numeric operand".to_string(),
                            found: t.to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::StringLit => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "numeric operand".to_string(),
                            found: "string literal".to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::Unknown => ExprType::Unknown,
                }
            }
            UnOp::Not => {
                let ty = self.check_expression(operand);
                match ty {
                    ExprType::Value(ref t) if t.is_numeric() || t.is_pointer() => {
                        ExprType::Value(Type::new(BaseType::Int))
                    }
                    ExprType::Value(t) => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "scalar operand".to_string(),
                            found: t.to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::StringLit => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "scalar operand".to_string(),
                            found: "string literal".to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::Unknown => ExprType::Unknown,
                }
            }
            UnOp::Deref => {
                let ty = self.check_expression(operand);
                match ty {
                    ExprType::Value(ref t) if t.is_pointer() => {
                        ExprType::Value(t.pointee_type())
                    }
                    ExprType::Value(ref t) if t.is_array() => {
                        ExprType::Value(t.element_type())
                    }
                    ExprType::Value(t) => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "pointer operand".to_string(),
                            found: t.to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::StringLit => {
                        self.errors.push(SemanticError::TypeMismatch {
                            expected: "pointer operand".to_string(),
                            found: "string literal".to_string(),
                            location,
                        });
                        ExprType::Unknown
                    }
                    ExprType::Unknown => ExprType::Unknown,
                }
            }
            UnOp::AddrOf => {
                let ty = self.check_lvalue(operand);
                match ty {
                    ExprType::Value(t) => ExprType::Value(t.scalar_type().with_pointer()),
                    _ => ExprType::Unknown,
                }
            }
        }
    }

    fn check_call(&mut self, name: &str, args: &[AstNode], location: SourceLocation) -> ExprType {
        let sig = match self.functions.get(name) {
            Some(sig) => sig.clone(),
            None => {
                self.errors.push(SemanticError::UndeclaredIdentifier {
                    name: name.to_string(),
                    location,
                });
                for arg in args {
                    self.check_expression(arg);
                }
                return ExprType::Unknown;
            }
        };

        if args.len() != sig.params.len() {
            self.errors.push(SemanticError::ArityMismatch {
                function: name.to_string(),
                expected: sig.params.len(),
                found: args.len(),
                location,
            });
            for arg in args {
                self.check_expression(arg);
            }
            return ExprType::Value(sig.return_type);
        }

        for (arg, param_ty) in args.iter().zip(&sig.params) {
            let found = self.check_expression(arg);
            self.require_assignable(param_ty, &found, arg.location());
        }

        ExprType::Value(sig.return_type)
    }

    fn check_index(
        &mut self,
        array: &AstNode,
        index: &AstNode,
        location: SourceLocation,
    ) -> ExprType {
        let array_ty = self.check_expression(array);
        let index_ty = self.check_expression(index);

        if let ExprType::Value(ref t) = index_ty {
            if !t.is_integral() {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "integer index".to_string(),
                    found: t.to_string(),
                    location: index.location(),
                });
            }
        }
        if index_ty == ExprType::StringLit {
            self.errors.push(SemanticError::TypeMismatch {
                expected: "integer index".to_string(),
                found: "string literal".to_string(),
                location: index.location(),
            });
        }

        match array_ty {
            ExprType::Value(ref t) if t.is_array() => {
                // Both size and index constant: bounds are checkable now
                if let Some(i) = Self::fold_const(index) {
                    let size = t.array_dims[0];
                    if i < 0 || i as usize >= size {
                        self.errors.push(SemanticError::ConstantIndexOutOfRange {
                            index: i,
                            size,
                            location,
                        });
                    }
                }
                ExprType::Value(t.element_type())
            }
            ExprType::Value(ref t) if t.is_pointer() => ExprType::Value(t.pointee_type()),
            ExprType::Value(t) => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "array or pointer".to_string(),
                    found: t.to_string(),
                    location,
                });
                ExprType::Unknown
            }
            ExprType::StringLit => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "array or pointer".to_string(),
                    found: "string literal".to_string(),
                    location,
                });
                ExprType::Unknown
            }
            ExprType::Unknown => ExprType::Unknown,
        }
    }

    /// Fold an expression to a constant integer where possible. Used for the
    /// compile-time division-by-zero and bounds diagnostics.
    fn fold_const(expr: &AstNode) -> Option<i64> {
        match expr {
            AstNode::IntLiteral(n, _) => Some(*n),
            AstNode::CharLiteral(c, _) => Some(*c as i64),
            AstNode::UnaryOp {
                op: UnOp::Neg,
                operand,
                ..
            } => Self::fold_const(operand).map(|n| n.wrapping_neg()),
            AstNode::BinaryOp {
                op, left, right, ..
            } => {
                let l = Self::fold_const(left)?;
                let r = Self::fold_const(right)?;
                match op {
                    BinOp::Add => Some(l.wrapping_add(r)),
                    BinOp::Sub => Some(l.wrapping_sub(r)),
                    BinOp::Mul => Some(l.wrapping_mul(r)),
                    BinOp::Div => {
                        if r == 0 {
                            None
                        } else {
                            Some(l.wrapping_div(r))
                        }
                    }
                    BinOp::Mod => {
                        if r == 0 {
                            None
                        } else {
                            Some(l.wrapping_rem(r))
                        }
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Report a TypeMismatch unless `found` can be stored into `target`.
    fn require_assignable(&mut self, target: &Type, found: &ExprType, location: SourceLocation) {
        let found_ty = match found {
            ExprType::Value(t) => t,
            ExprType::StringLit => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: target.to_string(),
                    found: "string literal".to_string(),
                    location,
                });
                return;
            }
            ExprType::Unknown => return,
        };

        if self.assignable(target, found_ty) {
            return;
        }
        self.errors.push(SemanticError::TypeMismatch {
            expected: target.to_string(),
            found: found_ty.to_string(),
            location,
        });
    }

    fn assignable(&self, target: &Type, found: &Type) -> bool {
        // Pointer targets: matching pointer, or an array decaying to a
        // pointer to its element type
        if target.is_pointer() {
            if found.is_pointer() {
                return target.base == found.base
                    && target.pointer_depth == found.pointer_depth;
            }
            if found.is_array() {
                let decayed = Self::decayed(found);
                return target.base == decayed.base
                    && target.pointer_depth == decayed.pointer_depth;
            }
            return false;
        }
        if target.is_array() {
            // Whole-array assignment is not a thing; initializer lists are
            // handled separately
            return false;
        }

        if !target.is_numeric() || !found.is_numeric() {
            return false;
        }
        match self.narrowing {
            NarrowingPolicy::Truncate => true,
            NarrowingPolicy::Reject => Self::rank(found.base) <= Self::rank(target.base),
        }
    }

    /// Conversion rank for the narrowing check: char < int < float < double
    fn rank(base: BaseType) -> u8 {
        match base {
            BaseType::Char => 0,
            BaseType::Int => 1,
            BaseType::Float => 2,
            BaseType::Double => 3,
            BaseType::Void => 4,
        }
    }

    fn wider(a: BaseType, b: BaseType) -> BaseType {
        let promoted = |t: BaseType| {
            // char promotes to int in arithmetic
            if t == BaseType::Char {
                BaseType::Int
            } else {
                t
            }
        };
        let (a, b) = (promoted(a), promoted(b));
        if Self::rank(a) >= Self::rank(b) {
            a
        } else {
            b
        }
    }

    /// Array-to-pointer decay: `int[2][3]` becomes `int (*)` on its rows'
    /// element type; scalar pointers pass through unchanged.
    fn decayed(ty: &Type) -> Type {
        if ty.is_array() {
            ty.element_type().scalar_type().with_pointer()
        } else {
            ty.clone()
        }
    }

    fn unify_branches(
        &mut self,
        then_ty: ExprType,
        else_ty: ExprType,
        location: SourceLocation,
    ) -> ExprType {
        match (then_ty, else_ty) {
            (ExprType::Value(a), ExprType::Value(b)) => {
                if a.is_numeric() && b.is_numeric() {
                    ExprType::Value(Type::new(Self::wider(a.base, b.base)))
                } else if a == b {
                    ExprType::Value(a)
                } else {
                    self.errors.push(SemanticError::TypeMismatch {
                        expected: a.to_string(),
                        found: b.to_string(),
                        location,
                    });
                    ExprType::Unknown
                }
            }
            (ExprType::StringLit, _) | (_, ExprType::StringLit) => {
                self.errors.push(SemanticError::TypeMismatch {
                    expected: "typed branch".to_string(),
                    found: "string literal".to_string(),
                    location,
                });
                ExprType::Unknown
            }
            _ => ExprType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(source: &str) -> Result<(), Vec<SemanticError>> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        SemanticAnalyzer::new().analyze(&program)
    }

    fn analyze_rejecting(source: &str) -> Result<(), Vec<SemanticError>> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        SemanticAnalyzer::with_narrowing(NarrowingPolicy::Reject).analyze(&program)
    }

    #[test]
    fn test_valid_program_passes() {
        assert!(analyze("int main() { int x = 5; return x + 1; }").is_ok());
    }

    #[test]
    fn test_undeclared_identifier() {
        let errors = analyze("int main() { return y; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::UndeclaredIdentifier { ref name, .. } if name == "y"
        ));
    }

    #[test]
    fn test_redeclaration_same_scope() {
        let errors = analyze("int main() { int x = 1; int x = 2; return x; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::Redeclaration { ref name, .. } if name == "x"
        ));
    }

    #[test]
    fn test_shadowing_is_legal() {
        assert!(analyze("int main() { int x = 1; { int x = 2; } return x; }").is_ok());
    }

    #[test]
    fn test_use_after_scope_exit() {
        let errors = analyze("int main() { { int inner = 1; } return inner; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::UndeclaredIdentifier { ref name, .. } if name == "inner"
        ));
    }

    #[test]
    fn test_string_literal_mismatch() {
        let errors = analyze("int main() { int x = \"hello\"; return x; }").unwrap_err();
        assert!(matches!(errors[0], SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let errors = analyze(
            "int add(int a, int b) { return a + b; } int main() { return add(1); }",
        )
        .unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_forward_reference_allowed() {
        assert!(analyze("int main() { return helper(); } int helper() { return 7; }").is_ok());
    }

    #[test]
    fn test_break_outside_loop() {
        let errors = analyze("int main() { break; return 0; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::InvalidControlContext {
                construct: "break",
                ..
            }
        ));
    }

    #[test]
    fn test_continue_outside_loop() {
        let errors = analyze("int main() { continue; return 0; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::InvalidControlContext {
                construct: "continue",
                ..
            }
        ));
    }

    #[test]
    fn test_return_at_file_scope() {
        let errors = analyze("return 1;").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::InvalidControlContext {
                construct: "return",
                ..
            }
        ));
    }

    #[test]
    fn test_constant_division_by_zero() {
        let errors = analyze("int main() { return 10 / 0; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::ConstantDivisionByZero { .. }
        ));
    }

    #[test]
    fn test_constant_index_out_of_range() {
        let errors = analyze("int main() { int a[3]; return a[5]; }").unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::ConstantIndexOutOfRange { index: 5, size: 3, .. }
        ));
    }

    #[test]
    fn test_missing_return() {
        let errors = analyze("int f(int x) { if (x) return 1; } int main() { return f(1); }")
            .unwrap_err();
        assert!(matches!(
            errors[0],
            SemanticError::MissingReturn { ref function, .. } if function == "f"
        ));
    }

    #[test]
    fn test_if_else_both_return_is_complete() {
        assert!(
            analyze("int f(int x) { if (x) return 1; else return 2; } int main() { return f(0); }")
                .is_ok()
        );
    }

    #[test]
    fn test_all_errors_collected() {
        let errors = analyze("int main() { int x = y; int x = z; return x; }").unwrap_err();
        // y undeclared, x redeclared, z undeclared
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_modulo_on_float_rejected() {
        let errors = analyze("int main() { double d = 1.5; return d % 2; }").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, SemanticError::TypeMismatch { .. })));
    }

    #[test]
    fn test_narrowing_rejected_under_strict_policy() {
        let errors = analyze_rejecting("int main() { double pi = 3.14; char c = pi; return c; }")
            .unwrap_err();
        assert!(matches!(errors[0], SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_narrowing_allowed_by_default() {
        assert!(analyze("int main() { double pi = 3.14; char c = pi; return c; }").is_ok());
    }

    #[test]
    fn test_pointer_assignment_checked() {
        assert!(analyze("int main() { int x = 1; int *p = &x; return *p; }").is_ok());
        let errors =
            analyze("int main() { double d = 1.0; int *p = &d; return *p; }").unwrap_err();
        assert!(matches!(errors[0], SemanticError::TypeMismatch { .. }));
    }
}
