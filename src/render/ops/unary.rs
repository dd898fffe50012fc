//! Unary operator evaluation

use crate::context::value::Value;
use crate::parser::ast::*;
use crate::render::engine::Renderer;
use crate::render::errors::RenderError;

impl Renderer<'_> {
    pub(crate) fn evaluate_unary_op(
        &self,
        op: UnOp,
        value: Value,
        location: SourceLocation,
    ) -> Result<Value, RenderError> {
        match op {
            UnOp::Neg => Self::evaluate_neg_op(value, location),
            UnOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        }
    }

    fn evaluate_neg_op(value: Value, location: SourceLocation) -> Result<Value, RenderError> {
        let Some(n) = value.as_int() else {
            return Err(RenderError::type_error(
                format!("cannot negate a {}", value.type_name()),
                location,
            ));
        };
        n.checked_neg()
            .ok_or(RenderError::IntegerOverflow {
                operation: format!("-({})", n),
                location,
            })
            .map(Value::Integer)
    }
}
