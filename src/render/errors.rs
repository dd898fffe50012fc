//! Render error types
//!
//! This module defines [`RenderError`], which represents all errors that can
//! occur while rendering a compiled template (as opposed to compile errors).
//!
//! All render errors are fatal: the render stops and no partial output is
//! returned. [`RenderError::kind`] groups the variants into broad categories.

use crate::loader::LoadError;
use crate::parser::ast::SourceLocation;
use crate::parser::parse::CompileError;

/// Broad category of a [`RenderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Undefined or uncallable function, or too few call arguments
    Name,
    /// Operator or statement applied to the wrong kind of value
    Type,
    /// Division or modulo by zero, integer overflow
    Arithmetic,
    /// Missing or unreadable `include`/`parse` target
    Io,
    /// Self-inclusion, include depth or call depth exceeded
    Recursion,
    /// Loop iteration cap reached
    Limit,
    /// A `parse` target failed to compile
    Syntax,
}

/// Errors that can occur during rendering
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Call of a name that is not bound
    #[error("Undefined function '{name}' at {location}")]
    UndefinedFunction {
        name: String,
        location: SourceLocation,
    },

    /// Call of a name bound to something other than a function
    #[error("'{name}' is a {found}, not a function, at {location}")]
    NotCallable {
        name: String,
        found: &'static str,
        location: SourceLocation,
    },

    /// Fewer arguments than declared parameters
    #[error(
        "Function '{function}' expects {expected} argument{}, got {got} at {location}",
        plural(.expected)
    )]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    #[error("Type error at {location}: {message}")]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    /// Division by zero or modulo by zero
    #[error("Division by zero in {operation} at {location}")]
    DivisionByZero {
        operation: String,
        location: SourceLocation,
    },

    #[error("Integer overflow in operation: {operation} at {location}")]
    IntegerOverflow {
        operation: String,
        location: SourceLocation,
    },

    #[error("{source} at {location}")]
    TemplateNotFound {
        source: LoadError,
        location: SourceLocation,
    },

    /// A template parsing itself, directly or through other templates
    #[error("Template '{path}' parses itself at {location}")]
    SelfInclusion {
        path: String,
        location: SourceLocation,
    },

    #[error("Parsing '{path}' exceeds the maximum include depth of {limit} at {location}")]
    IncludeDepthExceeded {
        path: String,
        limit: usize,
        location: SourceLocation,
    },

    #[error("Calling '{function}' exceeds the maximum call depth of {limit} at {location}")]
    CallDepthExceeded {
        function: String,
        limit: usize,
        location: SourceLocation,
    },

    #[error("Loop exceeded {limit} iterations at {location}")]
    LoopLimitExceeded {
        limit: usize,
        location: SourceLocation,
    },

    /// A `parse` target that is not a valid template
    #[error("Failed to compile '{path}' parsed at {location}: {source}")]
    Compile {
        path: String,
        source: CompileError,
        location: SourceLocation,
    },
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

impl RenderError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RenderError::UndefinedFunction { location, .. } => *location,
            RenderError::NotCallable { location, .. } => *location,
            RenderError::ArgumentCountMismatch { location, .. } => *location,
            RenderError::TypeError { location, .. } => *location,
            RenderError::DivisionByZero { location, .. } => *location,
            RenderError::IntegerOverflow { location, .. } => *location,
            RenderError::TemplateNotFound { location, .. } => *location,
            RenderError::SelfInclusion { location, .. } => *location,
            RenderError::IncludeDepthExceeded { location, .. } => *location,
            RenderError::CallDepthExceeded { location, .. } => *location,
            RenderError::LoopLimitExceeded { location, .. } => *location,
            RenderError::Compile { location, .. } => *location,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::UndefinedFunction { .. }
            | RenderError::NotCallable { .. }
            | RenderError::ArgumentCountMismatch { .. } => ErrorKind::Name,
            RenderError::TypeError { .. } => ErrorKind::Type,
            RenderError::DivisionByZero { .. } | RenderError::IntegerOverflow { .. } => {
                ErrorKind::Arithmetic
            }
            RenderError::TemplateNotFound { .. } => ErrorKind::Io,
            RenderError::SelfInclusion { .. }
            | RenderError::IncludeDepthExceeded { .. }
            | RenderError::CallDepthExceeded { .. } => ErrorKind::Recursion,
            RenderError::LoopLimitExceeded { .. } => ErrorKind::Limit,
            RenderError::Compile { .. } => ErrorKind::Syntax,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RenderError::TypeError {
            message: message.into(),
            location,
        }
    }
}
