//! minic: front-end and tree-walking evaluator for a small C-like language
//!
//! The pipeline has four phases. The lexer and parser turn source text into
//! an AST, the semantic analyzer collects every diagnostic before execution
//! is allowed, and the interpreter walks the tree over a simulated memory
//! arena of typed slots. The program's result is the value returned by
//! `main`.
//!
//! ```
//! use minic::interpreter::Interpreter;
//! use minic::memory::Value;
//! use minic::parser::Parser;
//! use minic::semantics::SemanticAnalyzer;
//!
//! let source = "int main() { int x = 40; return x + 2; }";
//! let program = Parser::new(source).unwrap().parse_program().unwrap();
//! SemanticAnalyzer::new().analyze(&program).unwrap();
//! let result = Interpreter::new(&program).run().unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod semantics;
