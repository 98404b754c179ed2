//! Recursive-descent parser for minic
//!
//! Consumes the token stream from the lexer and produces a [`Program`] of
//! [`AstNode`]s. Operator precedence follows C: assignment and the ternary
//! are right-associative, everything else is left-associative, and the comma
//! operator is only recognized inside parentheses.

use super::ast::*;
use super::lexer::{LexError, Lexer, Token};
use std::fmt;

/// Parser error type
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Parser for minic source code
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a parser over the given source, lexing it up front.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a complete program. The first error aborts the parse.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.check_eof() {
            if self.at_type_keyword() {
                if self.looks_like_function() {
                    program.nodes.push(self.parse_function()?);
                } else {
                    program.nodes.extend(self.parse_declaration()?);
                }
            } else {
                // Stray statements at file scope are accepted here; the
                // analyzer reports them as control-context violations.
                program.nodes.push(self.parse_statement()?);
            }
        }

        Ok(program)
    }

    /// Distinguish `int f(...) {...}` from `int x = ...;` by scanning ahead
    /// past the type tokens: an identifier followed by `(` is a function.
    fn looks_like_function(&self) -> bool {
        let mut pos = self.position + 1; // past the type keyword
        while matches!(self.tokens.get(pos), Some(Token::Star(_))) {
            pos += 1;
        }
        matches!(self.tokens.get(pos), Some(Token::Ident(_, _)))
            && matches!(self.tokens.get(pos + 1), Some(Token::LParen(_)))
    }

    /// Parse a function definition
    fn parse_function(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        let return_type = self.parse_type()?;
        let name = self.expect_identifier()?;

        self.expect_lparen()?;
        let mut params = Vec::new();
        if !self.check_rparen() {
            loop {
                let param_type = self.parse_type()?;
                let param_name = self.expect_identifier()?;
                params.push(Param {
                    name: param_name,
                    param_type,
                });
                if !self.match_comma() {
                    break;
                }
            }
        }
        self.expect_rparen()?;

        let body = self.parse_brace_block()?;

        Ok(AstNode::FunctionDef(FunctionDef {
            name,
            params,
            return_type,
            body,
            location,
        }))
    }

    /// Parse a base type with leading pointer stars: `int`, `double **`, ...
    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let base = match self.advance() {
            Token::Int(_) => BaseType::Int,
            Token::Float(_) => BaseType::Float,
            Token::Double(_) => BaseType::Double,
            Token::Char(_) => BaseType::Char,
            Token::Void(_) => BaseType::Void,
            other => {
                return Err(ParseError {
                    message: format!("Expected type, found {}", other),
                    location: other.location(),
                });
            }
        };

        let mut ty = Type::new(base);
        while self.match_star() {
            ty = ty.with_pointer();
        }
        Ok(ty)
    }

    /// Parse a declaration statement: `int x = 1, *p, m[2][3];`
    ///
    /// Each declarator carries its own stars and array dimensions, so a
    /// single statement expands into one `VarDecl` per declarator.
    fn parse_declaration(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let base = match self.advance() {
            Token::Int(_) => BaseType::Int,
            Token::Float(_) => BaseType::Float,
            Token::Double(_) => BaseType::Double,
            Token::Char(_) => BaseType::Char,
            Token::Void(_) => BaseType::Void,
            other => {
                return Err(ParseError {
                    message: format!("Expected type, found {}", other),
                    location: other.location(),
                });
            }
        };

        let mut decls = Vec::new();
        loop {
            let mut ty = Type::new(base);
            while self.match_star() {
                ty = ty.with_pointer();
            }

            let location = self.current_location();
            let name = self.expect_identifier()?;

            while self.match_lbracket() {
                let size = self.expect_array_size()?;
                ty = ty.with_array(size);
                self.expect_rbracket()?;
            }

            let init = if self.match_eq() {
                if self.check_lbrace() {
                    Some(Box::new(self.parse_init_list()?))
                } else {
                    Some(Box::new(self.parse_assignment_expr()?))
                }
            } else {
                None
            };

            decls.push(AstNode::VarDecl {
                name,
                var_type: ty,
                init,
                location,
            });

            if !self.match_comma() {
                break;
            }
        }

        self.expect_semicolon()?;
        Ok(decls)
    }

    /// Array sizes must be integer literals
    fn expect_array_size(&mut self) -> Result<usize, ParseError> {
        match self.advance() {
            Token::IntLiteral(n, loc) => {
                if n <= 0 {
                    Err(ParseError {
                        message: format!("Array size must be positive, found {}", n),
                        location: loc,
                    })
                } else {
                    Ok(n as usize)
                }
            }
            other => Err(ParseError {
                message: format!("Expected integer array size, found {}", other),
                location: other.location(),
            }),
        }
    }

    /// Parse a brace initializer list: `{1, 2, 3}`
    fn parse_init_list(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        self.expect_lbrace()?;

        let mut elements = Vec::new();
        if !self.check_rbrace() {
            loop {
                if self.check_lbrace() {
                    elements.push(self.parse_init_list()?);
                } else {
                    elements.push(self.parse_assignment_expr()?);
                }
                if !self.match_comma() {
                    break;
                }
            }
        }

        self.expect_rbrace()?;
        Ok(AstNode::InitList { elements, location })
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        match self.peek() {
            Token::LBrace(_) => self.parse_block_statement(),
            Token::If(_) => self.parse_if(),
            Token::While(_) => self.parse_while(),
            Token::For(_) => self.parse_for(),
            Token::Return(_) => self.parse_return(),
            Token::Break(loc) => {
                let location = *loc;
                self.advance();
                self.expect_semicolon()?;
                Ok(AstNode::Break { location })
            }
            Token::Continue(loc) => {
                let location = *loc;
                self.advance();
                self.expect_semicolon()?;
                Ok(AstNode::Continue { location })
            }
            Token::Int(_) | Token::Float(_) | Token::Double(_) | Token::Char(_)
            | Token::Void(_) => {
                // Single-statement position (e.g. a loop body): a declaration
                // here scopes to itself, so a block wrapper is harmless.
                // Multi-declarator statements inside braces are spliced by
                // parse_brace_block instead and never reach this arm.
                let location = self.current_location();
                let mut decls = self.parse_declaration()?;
                if decls.len() == 1 {
                    Ok(decls.remove(0))
                } else {
                    Ok(AstNode::Block {
                        statements: decls,
                        location,
                    })
                }
            }
            _ => {
                let location = self.current_location();
                let expr = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(AstNode::ExpressionStatement {
                    expr: Box::new(expr),
                    location,
                })
            }
        }
    }

    /// Parse `{ ... }` as a block statement node
    fn parse_block_statement(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        let statements = self.parse_brace_block()?;
        Ok(AstNode::Block {
            statements,
            location,
        })
    }

    /// Parse the statements between `{` and `}`
    fn parse_brace_block(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.expect_lbrace()?;
        let mut statements = Vec::new();
        while !self.check_rbrace() && !self.check_eof() {
            if self.at_type_keyword() {
                // Declarations splice directly into the enclosing statement
                // list so `int x, y;` declares both in the current scope.
                statements.extend(self.parse_declaration()?);
            } else {
                statements.push(self.parse_statement()?);
            }
        }
        self.expect_rbrace()?;
        Ok(statements)
    }

    /// Parse if/else; a dangling else binds to the nearest if
    fn parse_if(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'if'
        self.expect_lparen()?;
        let condition = self.parse_expression()?;
        self.expect_rparen()?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.match_else() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(AstNode::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
            location,
        })
    }

    fn parse_while(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'while'
        self.expect_lparen()?;
        let condition = self.parse_expression()?;
        self.expect_rparen()?;
        let body = self.parse_statement()?;

        Ok(AstNode::While {
            condition: Box::new(condition),
            body: Box::new(body),
            location,
        })
    }

    /// Parse a for loop; all three clauses are optional
    fn parse_for(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'for'
        self.expect_lparen()?;

        let init = if self.check_semicolon() {
            self.advance();
            Vec::new()
        } else if self.at_type_keyword() {
            self.parse_declaration()?
        } else {
            let expr = self.parse_expression()?;
            self.expect_semicolon()?;
            let loc = expr.location();
            vec![AstNode::ExpressionStatement {
                expr: Box::new(expr),
                location: loc,
            }]
        };

        let condition = if self.check_semicolon() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon()?;

        let update = if self.check_rparen() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_rparen()?;

        let body = self.parse_statement()?;

        Ok(AstNode::For {
            init,
            condition,
            update,
            body: Box::new(body),
            location,
        })
    }

    fn parse_return(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        self.advance(); // consume 'return'

        let expr = if self.check_semicolon() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon()?;

        Ok(AstNode::Return { expr, location })
    }

    // --- Expression precedence ladder ---

    /// Full expression, without the comma operator
    fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment_expr()
    }

    /// Assignment, right-associative
    fn parse_assignment_expr(&mut self) -> Result<AstNode, ParseError> {
        let lhs = self.parse_ternary()?;

        if self.check_assign() {
            let location = self.current_location();
            self.advance(); // consume '='
            let rhs = self.parse_assignment_expr()?;
            return Ok(AstNode::Assignment {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                location,
            });
        }

        Ok(lhs)
    }

    /// Ternary conditional, right-associative
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let condition = self.parse_logical_or()?;

        if matches!(self.peek(), Token::Question(_)) {
            let location = self.current_location();
            self.advance(); // consume '?'
            let true_expr = self.parse_assignment_expr()?;
            self.expect_colon()?;
            let false_expr = self.parse_assignment_expr()?;
            return Ok(AstNode::TernaryOp {
                condition: Box::new(condition),
                true_expr: Box::new(true_expr),
                false_expr: Box::new(false_expr),
                location,
            });
        }

        Ok(condition)
    }

    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_logical_and()?;

        while matches!(self.peek(), Token::OrOr(_)) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_logical_and()?;
            left = AstNode::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_bitwise_or()?;

        while matches!(self.peek(), Token::AndAnd(_)) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_bitwise_or()?;
            left = AstNode::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_bitwise_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_bitwise_xor()?;

        while matches!(self.peek(), Token::Pipe(_)) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_bitwise_xor()?;
            left = AstNode::BinaryOp {
                op: BinOp::BitOr,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_bitwise_and()?;

        while matches!(self.peek(), Token::Caret(_)) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_bitwise_and()?;
            left = AstNode::BinaryOp {
                op: BinOp::BitXor,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_equality()?;

        while matches!(self.peek(), Token::Amp(_)) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_equality()?;
            left = AstNode::BinaryOp {
                op: BinOp::BitAnd,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.peek() {
                Token::EqEq(_) => BinOp::Eq,
                Token::NotEq(_) => BinOp::Ne,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_relational()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek() {
                Token::Lt(_) => BinOp::Lt,
                Token::Le(_) => BinOp::Le,
                Token::Gt(_) => BinOp::Gt,
                Token::Ge(_) => BinOp::Ge,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_additive()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Token::Plus(_) => BinOp::Add,
                Token::Minus(_) => BinOp::Sub,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Token::Star(_) => BinOp::Mul,
                Token::Slash(_) => BinOp::Div,
                Token::Percent(_) => BinOp::Mod,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_unary()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        match self.peek() {
            Token::Minus(_) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(AstNode::UnaryOp {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                    location,
                })
            }
            // Unary plus is identity
            Token::Plus(_) => {
                self.advance();
                self.parse_unary()
            }
            Token::Bang(_) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(AstNode::UnaryOp {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                    location,
                })
            }
            Token::Star(_) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(AstNode::UnaryOp {
                    op: UnOp::Deref,
                    operand: Box::new(operand),
                    location,
                })
            }
            Token::Amp(_) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(AstNode::UnaryOp {
                    op: UnOp::AddrOf,
                    operand: Box::new(operand),
                    location,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Postfix: call and array indexing
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Token::LParen(_) => {
                    let location = self.current_location();
                    let name = match &expr {
                        AstNode::Variable(name, _) => name.clone(),
                        _ => {
                            return Err(ParseError {
                                message: "Only named functions can be called".to_string(),
                                location,
                            });
                        }
                    };
                    self.advance(); // consume '('
                    let mut args = Vec::new();
                    if !self.check_rparen() {
                        loop {
                            args.push(self.parse_assignment_expr()?);
                            if !self.match_comma() {
                                break;
                            }
                        }
                    }
                    self.expect_rparen()?;
                    expr = AstNode::FunctionCall {
                        name,
                        args,
                        location,
                    };
                }
                Token::LBracket(_) => {
                    let location = self.current_location();
                    self.advance(); // consume '['
                    let index = self.parse_expression()?;
                    self.expect_rbracket()?;
                    expr = AstNode::ArrayAccess {
                        array: Box::new(expr),
                        index: Box::new(index),
                        location,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        match self.advance() {
            Token::IntLiteral(n, loc) => Ok(AstNode::IntLiteral(n, loc)),
            Token::FloatLiteral(x, loc) => Ok(AstNode::FloatLiteral(x, loc)),
            Token::CharLiteral(c, loc) => Ok(AstNode::CharLiteral(c, loc)),
            Token::StringLiteral(s, loc) => Ok(AstNode::StringLiteral(s, loc)),
            Token::Ident(name, loc) => Ok(AstNode::Variable(name, loc)),
            Token::LParen(_) => {
                let mut expr = self.parse_assignment_expr()?;
                // Comma operator lives only inside parentheses
                while matches!(self.peek(), Token::Comma(_)) {
                    let location = self.current_location();
                    self.advance();
                    let second = self.parse_assignment_expr()?;
                    expr = AstNode::SequenceExpr {
                        first: Box::new(expr),
                        second: Box::new(second),
                        location,
                    };
                }
                self.expect_rparen()?;
                Ok(expr)
            }
            other => Err(ParseError {
                message: format!("Unexpected token {} in expression", other),
                location: other.location(),
            }),
        }
    }

    // --- Token stream helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position.min(self.tokens.len() - 1)].clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    fn at_type_keyword(&self) -> bool {
        matches!(
            self.peek(),
            Token::Int(_) | Token::Float(_) | Token::Double(_) | Token::Char(_) | Token::Void(_)
        )
    }

    fn check_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    fn check_semicolon(&self) -> bool {
        matches!(self.peek(), Token::Semicolon(_))
    }

    fn check_rparen(&self) -> bool {
        matches!(self.peek(), Token::RParen(_))
    }

    fn check_lbrace(&self) -> bool {
        matches!(self.peek(), Token::LBrace(_))
    }

    fn check_rbrace(&self) -> bool {
        matches!(self.peek(), Token::RBrace(_))
    }

    fn check_assign(&self) -> bool {
        matches!(self.peek(), Token::Eq(_))
    }

    fn match_star(&mut self) -> bool {
        if matches!(self.peek(), Token::Star(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_comma(&mut self) -> bool {
        if matches!(self.peek(), Token::Comma(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_eq(&mut self) -> bool {
        if matches!(self.peek(), Token::Eq(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_else(&mut self) -> bool {
        if matches!(self.peek(), Token::Else(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_lbracket(&mut self) -> bool {
        if matches!(self.peek(), Token::LBracket(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Token::Ident(name, _) => Ok(name),
            other => Err(ParseError {
                message: format!("Expected identifier, found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::LParen(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected '(', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::RParen(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected ')', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_lbrace(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::LBrace(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected '{{', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_rbrace(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::RBrace(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected '}}', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_rbracket(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::RBracket(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected ']', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::Semicolon(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected ';', found {}", other),
                location: other.location(),
            }),
        }
    }

    fn expect_colon(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Token::Colon(_) => Ok(()),
            other => Err(ParseError {
                message: format!("Expected ':', found {}", other),
                location: other.location(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_function() {
        let program = parse("int main() { return 42; }");
        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => {
                assert_eq!(def.name, "main");
                assert!(def.params.is_empty());
                assert_eq!(def.return_type, Type::new(BaseType::Int));
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_multi_declarator() {
        let program = parse("int main() { int x = 1, y, z = 3; return x; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => {
                assert_eq!(def.body.len(), 4);
                assert!(matches!(&def.body[0], AstNode::VarDecl { name, init: Some(_), .. } if name == "x"));
                assert!(matches!(&def.body[1], AstNode::VarDecl { name, init: None, .. } if name == "y"));
                assert!(matches!(&def.body[2], AstNode::VarDecl { name, init: Some(_), .. } if name == "z"));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_declaration() {
        let program = parse("int main() { int m[2][3]; return 0; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => match &def.body[0] {
                AstNode::VarDecl { var_type, .. } => {
                    assert_eq!(var_type.array_dims, vec![2, 3]);
                }
                other => panic!("Expected array declaration, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 2 + 3 * 4 must parse as 2 + (3 * 4)
        let program = parse("int main() { return 2 + 3 * 4; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => match &def.body[0] {
                AstNode::Return {
                    expr: Some(expr), ..
                } => match expr.as_ref() {
                    AstNode::BinaryOp {
                        op: BinOp::Add,
                        right,
                        ..
                    } => {
                        assert!(matches!(
                            right.as_ref(),
                            AstNode::BinaryOp { op: BinOp::Mul, .. }
                        ));
                    }
                    other => panic!("Expected addition at the top, got {:?}", other),
                },
                other => panic!("Expected return, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_else_binds_nearest_if() {
        let program = parse("int main() { if (1) if (0) return 1; else return 2; return 3; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => match &def.body[0] {
                AstNode::If {
                    else_branch: None,
                    then_branch,
                    ..
                } => {
                    assert!(matches!(
                        then_branch.as_ref(),
                        AstNode::If {
                            else_branch: Some(_),
                            ..
                        }
                    ));
                }
                other => panic!("Expected outer if with no else, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_comma_operator_inside_parens() {
        let program = parse("int main() { int x = (1, 2); return x; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => match &def.body[0] {
                AstNode::VarDecl {
                    init: Some(init), ..
                } => {
                    assert!(matches!(init.as_ref(), AstNode::SequenceExpr { .. }));
                }
                other => panic!("Expected declaration, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_declaration_and_deref() {
        let program = parse("int main() { int x = 5; int *p = &x; return *p; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => {
                match &def.body[1] {
                    AstNode::VarDecl { var_type, .. } => {
                        assert_eq!(var_type.pointer_depth, 1);
                    }
                    other => panic!("Expected pointer declaration, got {:?}", other),
                }
                match &def.body[2] {
                    AstNode::Return {
                        expr: Some(expr), ..
                    } => {
                        assert!(matches!(
                            expr.as_ref(),
                            AstNode::UnaryOp {
                                op: UnOp::Deref,
                                ..
                            }
                        ));
                    }
                    other => panic!("Expected return of a dereference, got {:?}", other),
                }
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_top_level_statement_accepted() {
        // Grammar accepts it; the analyzer is what rejects it.
        let program = parse("break;");
        assert!(matches!(program.nodes[0], AstNode::Break { .. }));
    }

    #[test]
    fn test_missing_semicolon_is_error() {
        let mut parser = Parser::new("int main() { return 1 }").unwrap();
        assert!(parser.parse_program().is_err());
    }

    #[test]
    fn test_ternary_right_associative() {
        let program = parse("int main() { return 1 ? 2 : 0 ? 3 : 4; }");
        match &program.nodes[0] {
            AstNode::FunctionDef(def) => match &def.body[0] {
                AstNode::Return {
                    expr: Some(expr), ..
                } => match expr.as_ref() {
                    AstNode::TernaryOp { false_expr, .. } => {
                        assert!(matches!(false_expr.as_ref(), AstNode::TernaryOp { .. }));
                    }
                    other => panic!("Expected ternary, got {:?}", other),
                },
                other => panic!("Expected return, got {:?}", other),
            },
            other => panic!("Expected function definition, got {:?}", other),
        }
    }
}
