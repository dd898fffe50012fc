//! Expression parsing implementation
//!
//! One method per precedence level, lowest first. Every binary level is
//! left-associative.
//!
//! ```text
//! expr     ::= and_expr ('or' and_expr)*
//! and_expr ::= not_expr ('and' not_expr)*
//! not_expr ::= 'not' not_expr | eq_expr
//! eq_expr  ::= rel_expr (('==' | '!=') rel_expr)*
//! rel_expr ::= add_expr (('<' | '<=' | '>' | '>=') add_expr)*
//! add_expr ::= mul_expr (('+' | '-') mul_expr)*
//! mul_expr ::= unary (('*' | '/' | '%') unary)*
//! unary    ::= '-'? primary
//! primary  ::= NUMBER | STRING | 'true' | 'false' | IDENT '(' args ')'
//!            | IDENT ('.' IDENT)* | '(' expr ')'
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Symbol, Token};
use crate::parser::parse::{Parser, SyntaxError};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, SyntaxError> {
        self.nested(Self::parse_logical_or)
    }

    /// Parse logical OR (or)
    fn parse_logical_or(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_logical_and()?;

        while self.match_keyword(Keyword::Or) {
            let loc = self.previous_location();
            let right = Box::new(self.parse_logical_and()?);
            left = AstNode::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (and)
    fn parse_logical_and(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_logical_not()?;

        while self.match_keyword(Keyword::And) {
            let loc = self.previous_location();
            let right = Box::new(self.parse_logical_not()?);
            left = AstNode::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse logical NOT (not), binding looser than comparisons
    fn parse_logical_not(&mut self) -> Result<AstNode, SyntaxError> {
        if self.match_keyword(Keyword::Not) {
            let loc = self.previous_location();
            let operand = Box::new(self.nested(Self::parse_logical_not)?);
            return Ok(AstNode::UnaryOp {
                op: UnOp::Not,
                operand,
                location: loc,
            });
        }

        self.parse_equality()
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_relational()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_symbol(Symbol::EqEq) {
                BinOp::Eq
            } else if self.match_symbol(Symbol::NotEq) {
                BinOp::Ne
            } else {
                break;
            };

            let right = Box::new(self.parse_relational()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_additive()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_symbol(Symbol::Lt) {
                BinOp::Lt
            } else if self.match_symbol(Symbol::Le) {
                BinOp::Le
            } else if self.match_symbol(Symbol::Gt) {
                BinOp::Gt
            } else if self.match_symbol(Symbol::Ge) {
                BinOp::Ge
            } else {
                break;
            };

            let right = Box::new(self.parse_additive()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_symbol(Symbol::Plus) {
                BinOp::Add
            } else if self.match_symbol(Symbol::Minus) {
                BinOp::Sub
            } else {
                break;
            };

            let right = Box::new(self.parse_multiplicative()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_unary()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_symbol(Symbol::Star) {
                BinOp::Mul
            } else if self.match_symbol(Symbol::Slash) {
                BinOp::Div
            } else if self.match_symbol(Symbol::Percent) {
                BinOp::Mod
            } else {
                break;
            };

            let right = Box::new(self.parse_unary()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse unary minus: at most one `-` before a primary
    fn parse_unary(&mut self) -> Result<AstNode, SyntaxError> {
        if self.match_symbol(Symbol::Minus) {
            let loc = self.previous_location();
            let operand = Box::new(self.parse_primary()?);
            return Ok(AstNode::UnaryOp {
                op: UnOp::Neg,
                operand,
                location: loc,
            });
        }

        self.parse_primary()
    }

    /// Parse primary expressions (literals, variables, calls, parentheses)
    fn parse_primary(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.current_location();

        match self.peek().clone() {
            Token::Number(n, _) => {
                self.advance();
                Ok(AstNode::NumberLiteral(n, loc))
            }
            Token::String(s, _) => {
                self.advance();
                Ok(AstNode::StringLiteral(s, loc))
            }
            Token::Ident(name, _) => {
                self.advance();
                match name.as_str() {
                    "true" => Ok(AstNode::BooleanLiteral(true, loc)),
                    "false" => Ok(AstNode::BooleanLiteral(false, loc)),
                    _ if self.check_symbol(Symbol::LParen) => self.parse_call(name, loc),
                    _ => {
                        let path = self.parse_path_tail(name)?;
                        Ok(AstNode::Variable {
                            path,
                            location: loc,
                        })
                    }
                }
            }
            Token::Symbol(Symbol::LParen, _) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_symbol(Symbol::RParen, "after parenthesized expression")?;
                Ok(expr)
            }
            _ => Err(self.error_here("Expected expression")),
        }
    }

    /// Parse `.name` segments following the first name of a dotted path
    pub(crate) fn parse_path_tail(&mut self, first: String) -> Result<Vec<String>, SyntaxError> {
        let mut path = vec![first];
        while self.match_symbol(Symbol::Dot) {
            path.push(self.expect_identifier("after '.'")?);
        }
        Ok(path)
    }

    /// Parse the argument list of a call whose name was already consumed
    pub(crate) fn parse_call(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> Result<AstNode, SyntaxError> {
        self.expect_symbol(Symbol::LParen, "after function name")?;

        let mut args = Vec::new();
        if !self.check_symbol(Symbol::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_symbol(Symbol::Comma) {
                    break;
                }
            }
        }

        self.expect_symbol(Symbol::RParen, "after function arguments")?;

        Ok(AstNode::FunctionCall {
            name,
            args,
            location,
        })
    }
}
