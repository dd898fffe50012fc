//! Expression evaluation implementation
//!
//! This module handles evaluation of all expression forms:
//!
//! - Literals (integers, strings, booleans)
//! - Dotted variable paths, which never fail: unresolved paths are absent
//! - Unary and binary operators, delegated to [`ops`](crate::render::ops)
//! - `and` / `or`, which short-circuit and yield the deciding operand
//! - Function calls
//!
//! # Safety
//!
//! All arithmetic uses checked math, so overflow is reported as a render
//! error rather than panicking or wrapping.

use crate::context::value::Value;
use crate::parser::ast::*;
use crate::render::engine::Renderer;
use crate::render::errors::RenderError;

impl Renderer<'_> {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, RenderError> {
        match expr {
            AstNode::NumberLiteral(n, _) => Ok(Value::Integer(*n)),

            AstNode::StringLiteral(s, _) | AstNode::Text(s, _) => Ok(Value::String(s.clone())),

            AstNode::BooleanLiteral(b, _) => Ok(Value::Boolean(*b)),

            AstNode::Variable { path, .. } => {
                let value = self.scopes.lookup(path);
                if value.is_absent() {
                    tracing::trace!(path = %path.join("."), "unresolved variable");
                }
                Ok(value)
            }

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => {
                let value = self.evaluate_expr(operand)?;
                self.evaluate_unary_op(*op, value, *location)
            }

            AstNode::BinaryOp {
                op: BinOp::And,
                left,
                right,
                ..
            } => {
                let left_val = self.evaluate_expr(left)?;
                if !left_val.is_truthy() {
                    return Ok(left_val);
                }
                self.evaluate_expr(right)
            }

            AstNode::BinaryOp {
                op: BinOp::Or,
                left,
                right,
                ..
            } => {
                let left_val = self.evaluate_expr(left)?;
                if left_val.is_truthy() {
                    return Ok(left_val);
                }
                self.evaluate_expr(right)
            }

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let left_val = self.evaluate_expr(left)?;
                let right_val = self.evaluate_expr(right)?;
                self.evaluate_binary_op(*op, left_val, right_val, *location)
            }

            AstNode::FunctionCall {
                name,
                args,
                location,
            } => self.call_function(name, args, *location),

            AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::List { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::FunctionDef { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::Print { location, .. }
            | AstNode::Include { location, .. }
            | AstNode::Parse { location, .. } => Err(RenderError::type_error(
                "a statement cannot be used as a value",
                *location,
            )),
        }
    }
}
