//! Interpreter construction and the top-level run loop

use super::errors::RuntimeError;
use super::statements::Signal;
use crate::memory::{Memory, MemoryError, Value};
use crate::parser::ast::{AstNode, FunctionDef, Program, SourceLocation};
use crate::semantics::ScopeStack;
use rustc_hash::FxHashMap;

/// Default bound on nested calls before a [`RuntimeError::StackOverflow`].
///
/// Each guest call costs many host frames (expression walk, call setup,
/// statement walk), so the ceiling must leave the counter room to trip
/// before the host stack runs out — 64 fits a 2 MiB stack in unoptimized
/// builds with margin to spare. Callers needing deeper recursion can raise
/// it with [`Interpreter::with_max_depth`] on a suitably sized thread.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Tree-walking interpreter over an analyzed program
pub struct Interpreter {
    pub(super) memory: Memory,
    pub(super) scopes: ScopeStack,
    pub(super) functions: FxHashMap<String, FunctionDef>,
    /// Non-function top-level nodes, executed in source order before `main`
    globals: Vec<AstNode>,
    pub(super) call_depth: usize,
    pub(super) max_call_depth: usize,
}

impl Interpreter {
    /// Build an interpreter for the program with the default call-depth
    /// bound.
    pub fn new(program: &Program) -> Self {
        Self::with_max_depth(program, DEFAULT_MAX_CALL_DEPTH)
    }

    /// Build an interpreter with an explicit call-depth bound.
    pub fn with_max_depth(program: &Program, max_call_depth: usize) -> Self {
        let mut functions = FxHashMap::default();
        let mut globals = Vec::new();

        for node in &program.nodes {
            match node {
                AstNode::FunctionDef(def) => {
                    functions.insert(def.name.clone(), def.clone());
                }
                other => globals.push(other.clone()),
            }
        }

        Self {
            memory: Memory::new(),
            scopes: ScopeStack::new(),
            functions,
            globals,
            call_depth: 0,
            max_call_depth,
        }
    }

    /// Execute the program: global declarations in source order, then `main`
    /// with no arguments. The returned value is the program's result.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        let globals = std::mem::take(&mut self.globals);
        for node in &globals {
            match self.execute_statement(node)? {
                Signal::Normal => {}
                // The analyzer rejects control flow at file scope; an
                // unanalyzed tree can still reach here
                _ => {
                    return Err(RuntimeError::InvalidOperation {
                        message: "control flow outside a function".to_string(),
                        location: node.location(),
                    });
                }
            }
        }
        self.globals = globals;

        let main = self.functions.get("main").cloned().ok_or_else(|| {
            RuntimeError::InvalidOperation {
                message: "no 'main' function defined".to_string(),
                location: SourceLocation::new(1, 1),
            }
        })?;

        self.call_function(&main, Vec::new(), main.location)
    }

    /// Map a memory failure to a runtime error at the given source position.
    pub(super) fn memory_error(err: MemoryError, location: SourceLocation) -> RuntimeError {
        RuntimeError::InvalidMemoryAccess {
            address: err.address(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn run(source: &str) -> Result<Value, RuntimeError> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        Interpreter::new(&program).run()
    }

    #[test]
    fn test_trivial_main() {
        assert_eq!(run("int main() { return 42; }").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_globals_initialized_before_main() {
        let source = "int base = 40; int offset = base + 2; \
                      int main() { return offset; }";
        assert_eq!(run(source).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_global_initializer_may_call_functions() {
        let source = "int seven() { return 7; } int x = seven(); \
                      int main() { return x * 2; }";
        assert_eq!(run(source).unwrap(), Value::Int(14));
    }

    #[test]
    fn test_scalar_brace_initializer_on_unanalyzed_tree() {
        // The analyzer rejects this shape; running it anyway must error, not
        // panic
        assert!(matches!(
            run("int main() { int x = {1}; return x; }"),
            Err(RuntimeError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_missing_main_is_runtime_error() {
        assert!(matches!(
            run("int helper() { return 1; }"),
            Err(RuntimeError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_default_depth_bound_trips_before_the_host_stack() {
        // Must produce an error, not abort the process, in debug builds too
        let result = run("int spin(int n) { return spin(n + 1); } int main() { return spin(0); }");
        assert!(matches!(
            result,
            Err(RuntimeError::StackOverflow {
                depth: DEFAULT_MAX_CALL_DEPTH,
                ..
            })
        ));
    }

    #[test]
    fn test_stack_overflow_with_small_bound() {
        let program = Parser::new("int loop_forever() { return loop_forever(); } int main() { return loop_forever(); }")
            .unwrap()
            .parse_program()
            .unwrap();
        let result = Interpreter::with_max_depth(&program, 16).run();
        assert!(matches!(
            result,
            Err(RuntimeError::StackOverflow { depth: 16, .. })
        ));
    }
}
