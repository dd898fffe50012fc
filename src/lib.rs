//! # Introduction
//!
//! Vellum compiles text templates into an immutable AST and renders them
//! against a caller-supplied context.  It is meant for static site
//! generators and similar tools that turn page metadata into text.
//!
//! ## Pipeline
//!
//! ```text
//! Template text → Lexer → Parser → Template (AST) → Renderer → String
//! ```
//!
//! 1. [`parser`] — scans the template, tokenises tag contents and builds the
//!    AST.  Errors here are [`CompileError`]s and no partial AST is produced.
//! 2. [`render`] — walks the AST against a [`Context`], reading other
//!    templates through a [`Loader`] for `include` and `parse`.  Errors here
//!    are [`RenderError`]s and no partial output is returned.
//! 3. [`context`] — the tagged [`Value`] model and the scoping rules for
//!    loops and function calls.
//! 4. [`environment`] — an [`Environment`] bundling a loader with options.
//!
//! ## Template syntax
//!
//! ```text
//! {{ page.title }}                      print an expression
//! {% if draft %}...{% else %}...{% end %}
//! {% list p as pages %}{{ p.title }}{% end %}   also `rlist`, plus first/last/index
//! {% while i < 3 %}...{% end %}
//! {% function link(p) %}{% return '<a>' + p.title + '</a>' %}{% end %}
//! {% x = 1 %} {% print x %} {% link(p) %}
//! {% include 'raw.txt' %} {% parse 'partial.html' %}
//! {# comment #}
//! ```
//!
//! ## Example
//!
//! ```
//! use vellum::{compile, render, Context};
//!
//! let template = compile("{% if age < 18 %}minor{% else %}adult{% end %}").unwrap();
//! let mut context: Context = [("age", 15)].into_iter().collect();
//! assert_eq!(render(&template, &mut context).unwrap(), "minor");
//! ```

pub mod context;
pub mod environment;
pub mod loader;
pub mod parser;
pub mod render;

pub use context::{Callable, Context, Value};
pub use environment::{Environment, Error};
pub use loader::{FileSystemLoader, LoadError, Loader, MemoryLoader};
pub use parser::{compile, compile_with, CompileError, CompileOptions, Template};
pub use render::{ErrorKind, RenderError, RenderOptions, Renderer};

/// Render a compiled template against `context`.
///
/// `include` and `parse` paths resolve against the current directory; use an
/// [`Environment`] to pick another [`Loader`] or change the limits.
pub fn render(template: &Template, context: &mut Context) -> Result<String, RenderError> {
    let loader = FileSystemLoader::new(".");
    Renderer::new(context, &loader).render(template)
}
