//! Data model for rendering
//!
//! - [`value`]: Tagged runtime values and template-defined functions
//! - [`scope`]: The caller's [`Context`] and the derived scopes layered over
//!   it during a render

pub mod scope;
pub mod value;

pub use scope::{Context, ScopeStack};
pub use value::{Callable, Value};
