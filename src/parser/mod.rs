//! Template compiler
//!
//! This module transforms template text into an Abstract Syntax Tree (AST):
//! - [`scanner`]: Character cursor with line/column tracking
//! - [`lexer`]: Tokenization (template text → tokens), split into an outer
//!   layer that finds tags and an inner layer for tag contents
//! - [`parse`]: Parser state, helpers, error types and the [`compile`] entry point
//! - [`ast`]: AST node definitions
//!
//! # Template Syntax
//!
//! - `{{ expr }}` prints an expression
//! - `{% stmt ... %}` runs statements; `if`, `while`, `list`, `rlist` and
//!   `function` open a block that is closed by `{% end %}`
//! - `{# ... #}` is a comment and is dropped by the lexer
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;
pub mod scanner;

mod expressions;
mod statements;

pub use ast::{AstNode, Block, SourceLocation, Template};
pub use lexer::LexError;
pub use parse::{compile, compile_with, CompileError, CompileOptions, Parser, SyntaxError};
