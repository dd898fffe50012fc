//! Binary operator evaluation
//!
//! `/` and `%` use floor semantics: the quotient rounds toward negative
//! infinity and the remainder takes the sign of the divisor.

use crate::context::value::Value;
use crate::parser::ast::{BinOp, SourceLocation};
use crate::render::engine::Renderer;
use crate::render::errors::RenderError;
use std::cmp::Ordering;

/// Quotient rounded toward negative infinity; `None` on overflow or zero divisor
pub(crate) fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder matching [`floor_div`]; `None` on zero divisor
pub(crate) fn floor_mod(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    // i64::MIN % -1 is 0, not an overflow
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

impl Renderer<'_> {
    /// Apply `op` to two already evaluated operands
    pub(crate) fn evaluate_binary_op(
        &self,
        op: BinOp,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RenderError> {
        match op {
            BinOp::Add => self.checked_add_values(left, right, location),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                self.checked_int_op(op, &left, &right, location)
            }

            BinOp::Eq => Ok(Value::Boolean(left == right)),
            BinOp::Ne => Ok(Value::Boolean(left != right)),
            BinOp::Lt => self.compare_values(op, &left, &right, Ordering::is_lt, location),
            BinOp::Le => self.compare_values(op, &left, &right, Ordering::is_le, location),
            BinOp::Gt => self.compare_values(op, &left, &right, Ordering::is_gt, location),
            BinOp::Ge => self.compare_values(op, &left, &right, Ordering::is_ge, location),

            // Normally short-circuited by the caller
            BinOp::And => Ok(if left.is_truthy() { right } else { left }),
            BinOp::Or => Ok(if left.is_truthy() { left } else { right }),
        }
    }

    /// `+` adds integers and concatenates strings or lists
    #[inline]
    pub(crate) fn checked_add_values(
        &self,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RenderError> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a
                .checked_add(b)
                .ok_or(RenderError::IntegerOverflow {
                    operation: format!("{} + {}", a, b),
                    location,
                })
                .map(Value::Integer),
            (Value::String(mut a), Value::String(b)) => {
                a.push_str(&b);
                Ok(Value::String(a))
            }
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (left, right) => Err(Self::operand_error(BinOp::Add, &left, &right, location)),
        }
    }

    #[inline]
    pub(crate) fn checked_int_op(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RenderError> {
        let (a, b) = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => (*a, *b),
            _ => return Err(Self::operand_error(op, left, right, location)),
        };
        let operation = || format!("{} {} {}", a, op.symbol(), b);

        if matches!(op, BinOp::Div | BinOp::Mod) && b == 0 {
            return Err(RenderError::DivisionByZero {
                operation: operation(),
                location,
            });
        }

        let result = match op {
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => floor_div(a, b),
            BinOp::Mod => floor_mod(a, b),
            _ => return Err(Self::operand_error(op, left, right, location)),
        };

        result
            .map(Value::Integer)
            .ok_or_else(|| RenderError::IntegerOverflow {
                operation: operation(),
                location,
            })
    }

    /// Ordering comparison between two integers or two strings
    #[inline]
    pub(crate) fn compare_values<F>(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        cmp: F,
        location: SourceLocation,
    ) -> Result<Value, RenderError>
    where
        F: Fn(Ordering) -> bool,
    {
        let ordering = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => return Err(Self::operand_error(op, left, right, location)),
        };
        Ok(Value::Boolean(cmp(ordering)))
    }

    fn operand_error(op: BinOp, left: &Value, right: &Value, location: SourceLocation) -> RenderError {
        RenderError::type_error(
            format!(
                "unsupported operand types for '{}': {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            location,
        )
    }
}
