// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Runtime values operated on by expression evaluation
//!
//! Logic and comparison operators follow SQL three-valued logic: a null
//! operand yields NULL unless the other operand already decides the result
//! (`false AND NULL` is false, `true OR NULL` is true). Arithmetic on a null
//! operand yields NULL.

use crate::eval::{EvalError, EvalResult, EvalType};
use crate::types::{DataType, PromotionPolicy, TypePromotion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
}

impl Datum {
    pub fn data_type(&self) -> DataType {
        match self {
            Datum::Null => DataType::Null,
            Datum::Boolean(_) => DataType::Boolean,
            Datum::Int2(_) => DataType::Int2,
            Datum::Int4(_) => DataType::Int4,
            Datum::Int8(_) => DataType::Int8,
            Datum::Float4(_) => DataType::Float4,
            Datum::Float8(_) => DataType::Float8,
            Datum::Text(_) => DataType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of an integer datum
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int2(v) => Some(i64::from(*v)),
            Datum::Int4(v) => Some(i64::from(*v)),
            Datum::Int8(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of any numeric datum
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Int2(v) => Some(f64::from(*v)),
            Datum::Int4(v) => Some(f64::from(*v)),
            Datum::Int8(v) => Some(*v as f64),
            Datum::Float4(v) => Some(f64::from(*v)),
            Datum::Float8(v) => Some(*v),
            _ => None,
        }
    }

    /// Character representation, used by concatenation
    pub fn as_chars(&self) -> String {
        match self {
            Datum::Null => String::new(),
            Datum::Boolean(b) => b.to_string(),
            Datum::Int2(v) => v.to_string(),
            Datum::Int4(v) => v.to_string(),
            Datum::Int8(v) => v.to_string(),
            Datum::Float4(v) => v.to_string(),
            Datum::Float8(v) => v.to_string(),
            Datum::Text(s) => s.clone(),
        }
    }

    pub fn and(&self, other: &Datum) -> EvalResult<Datum> {
        let (l, r) = self.logic_operands(EvalType::And, other)?;
        Ok(match (l, r) {
            (Some(false), _) | (_, Some(false)) => Datum::Boolean(false),
            (Some(true), Some(true)) => Datum::Boolean(true),
            _ => Datum::Null,
        })
    }

    pub fn or(&self, other: &Datum) -> EvalResult<Datum> {
        let (l, r) = self.logic_operands(EvalType::Or, other)?;
        Ok(match (l, r) {
            (Some(true), _) | (_, Some(true)) => Datum::Boolean(true),
            (Some(false), Some(false)) => Datum::Boolean(false),
            _ => Datum::Null,
        })
    }

    pub fn equals_to(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::Equal, other, |o| o == Ordering::Equal)
    }

    pub fn not_equals_to(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::NotEqual, other, |o| o != Ordering::Equal)
    }

    pub fn less_than(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::Lth, other, |o| o == Ordering::Less)
    }

    pub fn less_than_equal(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::Leq, other, |o| o != Ordering::Greater)
    }

    pub fn greater_than(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::Gth, other, |o| o == Ordering::Greater)
    }

    pub fn greater_than_equal(&self, other: &Datum) -> EvalResult<Datum> {
        self.compare_with(EvalType::Geq, other, |o| o != Ordering::Less)
    }

    pub fn plus(&self, other: &Datum) -> EvalResult<Datum> {
        self.arithmetic(EvalType::Plus, other)
    }

    pub fn minus(&self, other: &Datum) -> EvalResult<Datum> {
        self.arithmetic(EvalType::Minus, other)
    }

    pub fn multiply(&self, other: &Datum) -> EvalResult<Datum> {
        self.arithmetic(EvalType::Multiply, other)
    }

    pub fn divide(&self, other: &Datum) -> EvalResult<Datum> {
        self.arithmetic(EvalType::Divide, other)
    }

    pub fn modular(&self, other: &Datum) -> EvalResult<Datum> {
        self.arithmetic(EvalType::Modular, other)
    }

    fn logic_operands(
        &self,
        op: EvalType,
        other: &Datum,
    ) -> EvalResult<(Option<bool>, Option<bool>)> {
        let operand = |d: &Datum| match d {
            Datum::Null => Ok(None),
            Datum::Boolean(b) => Ok(Some(*b)),
            _ => Err(self.mismatch(op, other)),
        };
        Ok((operand(self)?, operand(other)?))
    }

    fn compare_with(
        &self,
        op: EvalType,
        other: &Datum,
        accept: impl Fn(Ordering) -> bool,
    ) -> EvalResult<Datum> {
        if self.is_null() || other.is_null() {
            return Ok(Datum::Null);
        }

        let ordering = match (self, other) {
            (Datum::Text(l), Datum::Text(r)) => Some(l.cmp(r)),
            (Datum::Boolean(l), Datum::Boolean(r)) => Some(l.cmp(r)),
            (l, r) if l.data_type().is_integer() && r.data_type().is_integer() => {
                match (l.as_i64(), r.as_i64()) {
                    (Some(l), Some(r)) => Some(l.cmp(&r)),
                    _ => None,
                }
            }
            (l, r) if l.data_type().is_numeric() && r.data_type().is_numeric() => {
                match (l.as_f64(), r.as_f64()) {
                    (Some(l), Some(r)) => l.partial_cmp(&r),
                    _ => None,
                }
            }
            _ => return Err(self.mismatch(op, other)),
        };

        // NaN compares as unknown
        Ok(ordering.map_or(Datum::Null, |o| Datum::Boolean(accept(o))))
    }

    fn arithmetic(&self, op: EvalType, other: &Datum) -> EvalResult<Datum> {
        if self.is_null() || other.is_null() {
            return Ok(Datum::Null);
        }

        let (left_type, right_type) = (self.data_type(), other.data_type());
        if !left_type.is_numeric() || !right_type.is_numeric() {
            return Err(self.mismatch(op, other));
        }

        let result_type = TypePromotion::numeric(op, left_type, right_type, PromotionPolicy::Strict)?;

        if result_type.is_integer() {
            let (l, r) = match (self.as_i64(), other.as_i64()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(self.mismatch(op, other)),
            };
            let value = match op {
                EvalType::Plus => l.checked_add(r),
                EvalType::Minus => l.checked_sub(r),
                EvalType::Multiply => l.checked_mul(r),
                EvalType::Divide | EvalType::Modular if r == 0 => {
                    return Err(EvalError::DivisionByZero)
                }
                EvalType::Divide => l.checked_div(r),
                EvalType::Modular => l.checked_rem(r),
                _ => return Err(EvalError::UnsupportedOperator(op)),
            }
            .ok_or_else(|| EvalError::NumericOverflow(format!("{} {} {}", l, op, r)))?;

            Datum::from_i64(value, result_type)
        } else {
            let (l, r) = match (self.as_f64(), other.as_f64()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(self.mismatch(op, other)),
            };
            let value = match op {
                EvalType::Plus => l + r,
                EvalType::Minus => l - r,
                EvalType::Multiply => l * r,
                EvalType::Divide | EvalType::Modular if r == 0.0 => {
                    return Err(EvalError::DivisionByZero)
                }
                EvalType::Divide => l / r,
                EvalType::Modular => l % r,
                _ => return Err(EvalError::UnsupportedOperator(op)),
            };

            Ok(match result_type {
                DataType::Float4 => Datum::Float4(value as f32),
                _ => Datum::Float8(value),
            })
        }
    }

    /// Narrow an integer result into the datum of the promoted type
    fn from_i64(value: i64, data_type: DataType) -> EvalResult<Datum> {
        let overflow = || EvalError::NumericOverflow(format!("{} out of range for {}", value, data_type));
        match data_type {
            DataType::Int2 => i16::try_from(value).map(Datum::Int2).map_err(|_| overflow()),
            DataType::Int4 => i32::try_from(value).map(Datum::Int4).map_err(|_| overflow()),
            _ => Ok(Datum::Int8(value)),
        }
    }

    fn mismatch(&self, op: EvalType, other: &Datum) -> EvalError {
        EvalError::IncompatibleTypes {
            op,
            left: self.data_type(),
            right: other.data_type(),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Text(s) => write!(f, "'{}'", s),
            other => write!(f, "{}", other.as_chars()),
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<i16> for Datum {
    fn from(v: i16) -> Self {
        Datum::Int2(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int4(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int8(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Datum::Float4(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float8(v)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_keeps_promoted_width() {
        assert_eq!(Datum::Int4(7).plus(&Datum::Int4(8)).unwrap(), Datum::Int4(15));
        assert_eq!(Datum::Int4(7).plus(&Datum::Int8(8)).unwrap(), Datum::Int8(15));
        assert_eq!(Datum::Int2(3).multiply(&Datum::Int2(4)).unwrap(), Datum::Int2(12));
        assert_eq!(Datum::Int8(17).modular(&Datum::Int4(5)).unwrap(), Datum::Int8(2));
        assert_eq!(Datum::Int4(9).divide(&Datum::Int4(2)).unwrap(), Datum::Int4(4));
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(
            Datum::Int4(1).divide(&Datum::Float4(4.0)).unwrap(),
            Datum::Float4(0.25)
        );
        assert_eq!(
            Datum::Float8(1.5).multiply(&Datum::Int2(2)).unwrap(),
            Datum::Float8(3.0)
        );
    }

    #[test]
    fn test_arithmetic_errors() {
        assert!(matches!(
            Datum::Int4(1).divide(&Datum::Int4(0)),
            Err(EvalError::DivisionByZero)
        ));
        assert!(matches!(
            Datum::Float8(1.0).modular(&Datum::Float8(0.0)),
            Err(EvalError::DivisionByZero)
        ));
        assert!(matches!(
            Datum::Int4(i32::MAX).plus(&Datum::Int4(1)),
            Err(EvalError::NumericOverflow(_))
        ));
        assert!(matches!(
            Datum::Text("a".into()).plus(&Datum::Int4(1)),
            Err(EvalError::IncompatibleTypes { .. })
        ));
    }

    #[test]
    fn test_null_propagation() {
        assert_eq!(Datum::Null.plus(&Datum::Int4(1)).unwrap(), Datum::Null);
        assert_eq!(Datum::Int4(1).less_than(&Datum::Null).unwrap(), Datum::Null);
    }

    #[test]
    fn test_three_valued_logic() {
        let t = Datum::Boolean(true);
        let f = Datum::Boolean(false);

        assert_eq!(f.and(&Datum::Null).unwrap(), f);
        assert_eq!(t.and(&Datum::Null).unwrap(), Datum::Null);
        assert_eq!(t.or(&Datum::Null).unwrap(), t);
        assert_eq!(f.or(&Datum::Null).unwrap(), Datum::Null);
        assert_eq!(t.and(&t).unwrap(), t);
        assert!(Datum::Int4(1).and(&t).is_err());
    }

    #[test]
    fn test_comparisons_across_numeric_types() {
        assert_eq!(
            Datum::Int4(3).equals_to(&Datum::Int8(3)).unwrap(),
            Datum::Boolean(true)
        );
        assert_eq!(
            Datum::Int2(3).less_than(&Datum::Float8(3.5)).unwrap(),
            Datum::Boolean(true)
        );
        assert_eq!(
            Datum::from("abc").greater_than_equal(&Datum::from("abd")).unwrap(),
            Datum::Boolean(false)
        );
        assert!(Datum::from("1").equals_to(&Datum::Int4(1)).is_err());
    }
}
