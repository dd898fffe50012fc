//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the [`compile`] entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with one token of lookahead:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: template nodes, tags and block statements (`if`, `list`, ...)
//! - `expressions`: expressions, one method per precedence level
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, Lexer, Symbol, Token};

/// Maximum nesting of blocks and parenthesized or negated expressions
pub const MAX_NESTING_DEPTH: usize = 64;

/// Syntax error raised while building the AST
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct SyntaxError {
    pub message: String,
    pub location: SourceLocation,
}

/// Any failure of the compile phase. No partial AST is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl CompileError {
    pub fn location(&self) -> SourceLocation {
        match self {
            CompileError::Lex(err) => err.location,
            CompileError::Syntax(err) => err.location,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Lex(err) => &err.message,
            CompileError::Syntax(err) => &err.message,
        }
    }
}

/// Options applied while compiling template text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Drop a single line break directly after `%}` and `#}`
    pub trim_blocks: bool,
}

impl CompileOptions {
    pub fn with_trim_blocks(mut self, trim_blocks: bool) -> Self {
        self.trim_blocks = trim_blocks;
        self
    }
}

/// Compile template text with default options
pub fn compile(source: &str) -> Result<Template, CompileError> {
    compile_with(source, &CompileOptions::default())
}

/// Compile template text into an immutable [`Template`]
pub fn compile_with(source: &str, options: &CompileOptions) -> Result<Template, CompileError> {
    let mut parser = Parser::with_options(source, options)?;
    let token_count = parser.tokens.len();
    let template = parser.parse_template()?;
    tracing::debug!(
        tokens = token_count,
        nodes = block_node_count(&template.nodes),
        "compiled template"
    );
    Ok(template)
}

/// Recursive descent parser for template token streams
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Number of enclosing `function` bodies; `return` needs at least one
    pub(crate) function_depth: usize,
    /// Current nesting of blocks and sub-expressions
    pub(crate) depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        Self::with_options(source, &CompileOptions::default())
    }

    pub fn with_options(source: &str, options: &CompileOptions) -> Result<Self, CompileError> {
        let tokens = Lexer::new(source)
            .with_trim_blocks(options.trim_blocks)
            .tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Build a parser over an already lexed stream ending in [`Token::Eof`]
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token::Eof(_))) {
            let loc = tokens.last().map(Token::location).unwrap_or_default();
            tokens.push(Token::Eof(loc));
        }
        Self {
            tokens,
            position: 0,
            function_depth: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream into a template
    pub fn parse_template(&mut self) -> Result<Template, SyntaxError> {
        let (nodes, _) = self.parse_nodes(None)?;
        Ok(Template::new(nodes))
    }

    // ===== Helper methods =====

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SyntaxError {
                message: format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
                location: self.current_location(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn check_symbol(&self, symbol: Symbol) -> bool {
        matches!(self.peek(), Token::Symbol(s, _) if *s == symbol)
    }

    pub(crate) fn match_symbol(&mut self, symbol: Symbol) -> bool {
        if self.check_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k, _) if *k == keyword)
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Error at the current token, naming what was found instead
    pub(crate) fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError {
            message: format!("{}, found {}", message, self.peek()),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_symbol(
        &mut self,
        symbol: Symbol,
        ctx: &str,
    ) -> Result<SourceLocation, SyntaxError> {
        if self.check_symbol(symbol) {
            Ok(self.advance().location())
        } else {
            Err(self.error_here(&format!("Expected '{}' {}", symbol.as_str(), ctx)))
        }
    }

    pub(crate) fn expect_keyword(
        &mut self,
        keyword: Keyword,
        ctx: &str,
    ) -> Result<SourceLocation, SyntaxError> {
        if self.check_keyword(keyword) {
            Ok(self.advance().location())
        } else {
            Err(self.error_here(&format!("Expected '{}' {}", keyword.as_str(), ctx)))
        }
    }

    /// Expect the `%}` that closes a command tag
    pub(crate) fn expect_tag_close(&mut self, ctx: &str) -> Result<(), SyntaxError> {
        self.expect_symbol(Symbol::CommandClose, ctx).map(|_| ())
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, SyntaxError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(&format!("Expected identifier {}", ctx)))
        }
    }
}
