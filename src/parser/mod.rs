//! Parsing module for minic source code
//!
//! Contains the lexer, AST definitions, and the recursive-descent parser.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{AstNode, BaseType, BinOp, FunctionDef, Param, Program, SourceLocation, Type, UnOp};
pub use lexer::{LexError, Lexer, Token};
pub use parser::{ParseError, Parser};
