//! Operator semantics over UDM values.
//!
//! Failures come back as plain messages; the evaluator turns them into
//! `TypeMismatch` diagnostics at the operator's location.

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::ast::{BinOp, UnaryOp};
use crate::udm::Udm;

/// Eagerly evaluated binary operators: everything except `&&`, `||` and `??`.
pub(super) fn apply_binop(op: BinOp, left: &Udm, right: &Udm) -> Result<Udm, String> {
    match op {
        BinOp::Add if matches!(left, Udm::String(_)) || matches!(right, Udm::String(_)) => {
            let l = left.as_string().map_err(|e| format!("cannot concatenate: {}", e))?;
            let r = right.as_string().map_err(|e| format!("cannot concatenate: {}", e))?;
            Ok(Udm::String(l + &r))
        }
        BinOp::Add
        | BinOp::Subtract
        | BinOp::Multiply
        | BinOp::Divide
        | BinOp::Modulo
        | BinOp::Power => arithmetic(op, left, right),
        BinOp::Equal => Ok(Udm::Boolean(left == right)),
        BinOp::NotEqual => Ok(Udm::Boolean(left != right)),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            let ordering = compare(left, right).ok_or_else(|| {
                format!(
                    "cannot compare {} {} {}",
                    left.type_name(),
                    op,
                    right.type_name()
                )
            })?;
            let result = match op {
                BinOp::LessThan => ordering == Some(Ordering::Less),
                BinOp::GreaterThan => ordering == Some(Ordering::Greater),
                BinOp::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Udm::Boolean(result))
        }
        BinOp::And | BinOp::Or | BinOp::NullCoalesce => {
            Err(format!("'{}' is evaluated lazily", op))
        }
    }
}

pub(super) fn apply_unary(op: UnaryOp, operand: &Udm) -> Result<Udm, String> {
    match op {
        UnaryOp::Not => operand
            .as_boolean()
            .map(|b| Udm::Boolean(!b))
            .map_err(|e| format!("'!' {}", e)),
        UnaryOp::Negate => match operand {
            Udm::Integer(n) => Ok(n
                .checked_neg()
                .map(Udm::Integer)
                .unwrap_or(Udm::Float(-(*n as f64)))),
            Udm::Float(n) => Ok(Udm::Float(-n)),
            other => Err(format!("cannot negate {}", other.type_name())),
        },
    }
}

/// Ordering of two values of the same comparable kind. The outer `None`
/// means the kinds cannot be compared; the inner one is an unordered NaN.
fn compare(left: &Udm, right: &Udm) -> Option<Option<Ordering>> {
    let ordering = match (left, right) {
        (Udm::Integer(a), Udm::Integer(b)) => Some(a.cmp(b)),
        (a, b) if a.is_number() && b.is_number() => {
            a.as_number().ok()?.partial_cmp(&b.as_number().ok()?)
        }
        (Udm::String(a), Udm::String(b)) => Some(a.cmp(b)),
        (Udm::DateTime(a), Udm::DateTime(b)) => Some(a.cmp(b)),
        (Udm::Date(a), Udm::Date(b)) => Some(a.cmp(b)),
        (Udm::Time(a), Udm::Time(b)) => Some(a.cmp(b)),
        _ => return None,
    };
    Some(ordering)
}

fn arithmetic(op: BinOp, left: &Udm, right: &Udm) -> Result<Udm, String> {
    if !left.is_number() || !right.is_number() {
        return Err(format!(
            "cannot apply '{}' to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ));
    }
    if matches!(op, BinOp::Divide | BinOp::Modulo) && right.as_number() == Ok(0.0) {
        return Err("division by zero".to_string());
    }

    match (left, right) {
        (Udm::Integer(a), Udm::Integer(b)) => Ok(integer_op(op, *a, *b)),
        (Udm::Float(a), Udm::Float(b)) => Ok(float_op(op, *a, *b)),
        (Udm::Integer(a), Udm::Float(b)) => Ok(Decimal::from_i64(*a)
            .zip(Decimal::from_f64(*b))
            .and_then(|(a, b)| decimal_op(op, a, b))
            .unwrap_or_else(|| float_op(op, *a as f64, *b))),
        (Udm::Float(a), Udm::Integer(b)) => Ok(Decimal::from_f64(*a)
            .zip(Decimal::from_i64(*b))
            .and_then(|(a, b)| decimal_op(op, a, b))
            .unwrap_or_else(|| float_op(op, *a, *b as f64))),
        _ => Err(format!("cannot apply '{}' to non-numbers", op)),
    }
}

/// Integer arithmetic; overflow and inexact division fall back to floats.
fn integer_op(op: BinOp, a: i64, b: i64) -> Udm {
    let exact = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => a
            .checked_rem(b)
            .filter(|r| *r == 0)
            .and_then(|_| a.checked_div(b)),
        BinOp::Modulo => Some(a.checked_rem(b).unwrap_or(0)),
        BinOp::Power => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        _ => None,
    };
    match exact {
        Some(n) => Udm::Integer(n),
        None => float_op(op, a as f64, b as f64),
    }
}

fn float_op(op: BinOp, a: f64, b: f64) -> Udm {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        BinOp::Modulo => a % b,
        BinOp::Power => a.powf(b),
        _ => f64::NAN,
    };
    Udm::Float(result)
}

/// Mixed integer/float arithmetic in decimal, so `0.1 + 2` is `2.1`.
/// Whole results collapse back to integers.
fn decimal_op(op: BinOp, a: Decimal, b: Decimal) -> Option<Udm> {
    let result = match op {
        BinOp::Add => a.checked_add(b)?,
        BinOp::Subtract => a.checked_sub(b)?,
        BinOp::Multiply => a.checked_mul(b)?,
        BinOp::Divide => a.checked_div(b)?,
        BinOp::Modulo => a.checked_rem(b)?,
        _ => return None,
    };
    if result.is_integer()
        && let Some(n) = result.to_i64()
    {
        return Some(Udm::Integer(n));
    }
    result.to_f64().map(Udm::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binop(op: BinOp, a: Udm, b: Udm) -> Udm {
        apply_binop(op, &a, &b).unwrap()
    }

    #[test]
    fn test_integer_division_stays_exact() {
        assert_eq!(binop(BinOp::Divide, Udm::Integer(200), Udm::Integer(5)), Udm::Integer(40));
        assert!(matches!(
            binop(BinOp::Divide, Udm::Integer(7), Udm::Integer(2)),
            Udm::Float(f) if f == 3.5
        ));
    }

    #[test]
    fn test_mixed_arithmetic_uses_decimal() {
        assert!(matches!(
            binop(BinOp::Add, Udm::Float(0.1), Udm::Integer(2)),
            Udm::Float(f) if f == 2.1
        ));
        assert!(matches!(
            binop(BinOp::Multiply, Udm::Float(2.5), Udm::Integer(2)),
            Udm::Integer(5)
        ));
    }

    #[test]
    fn test_power() {
        assert!(matches!(binop(BinOp::Power, Udm::Integer(2), Udm::Integer(9)), Udm::Integer(512)));
        assert!(matches!(
            binop(BinOp::Power, Udm::Integer(2), Udm::Integer(-1)),
            Udm::Float(f) if f == 0.5
        ));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        assert!(matches!(
            binop(BinOp::Add, Udm::Integer(i64::MAX), Udm::Integer(1)),
            Udm::Float(_)
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let err = apply_binop(BinOp::Modulo, &Udm::Integer(1), &Udm::Float(0.0)).unwrap_err();
        assert_eq!(err, "division by zero");
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            binop(BinOp::Add, Udm::from("n="), Udm::Integer(3)),
            Udm::from("n=3")
        );
        assert!(apply_binop(BinOp::Add, &Udm::from("x"), &Udm::Null).is_err());
    }

    #[test]
    fn test_cross_kind_comparison_fails() {
        assert!(apply_binop(BinOp::LessThan, &Udm::Integer(1), &Udm::from("2")).is_err());
        assert_eq!(
            binop(BinOp::GreaterEqual, Udm::from("b"), Udm::from("a")),
            Udm::Boolean(true)
        );
    }
}
