//! Template rendering
//!
//! This module walks a compiled [`Template`](crate::Template) and produces
//! its output text:
//! - [`engine`]: The [`Renderer`], its options and node dispatch
//! - [`errors`]: Render error types
//!
//! # Rendering Model
//!
//! The renderer walks the AST depth-first, appending text to one output
//! buffer. A `return` is passed back up as a `ControlFlow` value that
//! each block checks after every node. Any error aborts the render and
//! the partial output is dropped.
//!
//! Statement handling is split across `impl Renderer` blocks in
//! `statements`, `loops`, `jumps`, `expressions` and `ops`.

pub mod constants;
pub mod engine;
pub mod errors;

mod expressions;
mod jumps;
mod loops;
mod ops;
mod statements;

pub use engine::{RenderOptions, Renderer};
pub use errors::{ErrorKind, RenderError};
