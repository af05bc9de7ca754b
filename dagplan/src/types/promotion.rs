// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result type derivation for binary expressions
//!
//! Logical and comparison operators always yield BOOLEAN, concatenation
//! yields TEXT, and arithmetic operators pick a common type from the
//! numeric promotion lattice.

use crate::eval::{EvalError, EvalResult, EvalType};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// What to do with operand pairs the numeric lattice does not cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromotionPolicy {
    /// Reject the expression with `EvalError::IncompatibleTypes`
    #[default]
    Strict,
    /// Inherit the left operand's type
    Permissive,
}

/// Type promotion engine
#[derive(Debug)]
pub struct TypePromotion;

impl TypePromotion {
    /// Result type of `left <op> right`
    pub fn result_type(
        op: EvalType,
        left: DataType,
        right: DataType,
        policy: PromotionPolicy,
    ) -> EvalResult<DataType> {
        if op.is_logical() || op.is_comparison() {
            Ok(DataType::Boolean)
        } else if op.is_arithmetic() {
            Self::numeric(op, left, right, policy)
        } else if op == EvalType::Concatenate {
            Ok(DataType::Text)
        } else {
            Err(EvalError::UnsupportedOperator(op))
        }
    }

    /// Walk the numeric promotion lattice.
    ///
    /// Note the lattice is not symmetric for FLOAT4: `INT4 op FLOAT4` stays
    /// FLOAT4 while `FLOAT4 op INT4` widens to FLOAT8.
    pub fn numeric(
        op: EvalType,
        left: DataType,
        right: DataType,
        policy: PromotionPolicy,
    ) -> EvalResult<DataType> {
        use DataType::*;

        let promoted = match (left, right) {
            (Int4, Int2 | Int4) => Some(Int4),
            (Int4, Int8) => Some(Int8),
            (Int4, Float4) => Some(Float4),
            (Int4, Float8) => Some(Float8),

            (Int8, Int2 | Int4 | Int8) => Some(Int8),
            (Int8, Float4 | Float8) => Some(Float8),

            (Float4 | Float8, Int2 | Int4 | Int8 | Float4 | Float8) => Some(Float8),

            _ => None,
        };

        if let Some(result) = promoted {
            return Ok(result);
        }

        match policy {
            PromotionPolicy::Permissive => {
                log::warn!(
                    "No promotion rule for {} {} {}, falling back to {}",
                    left,
                    op,
                    right,
                    left
                );
                Ok(left)
            }
            PromotionPolicy::Strict => match (left, right) {
                // INT2 on the left mirrors the rules that already hold with
                // INT2 on the right
                (Int2, Int2) => Ok(Int2),
                (Int2, other) if other.is_numeric() => Self::numeric(op, other, Int2, policy),

                // An untyped null takes the type of the other side
                (Null, other) | (other, Null) if other.is_numeric() || other == Null => Ok(other),

                _ => Err(EvalError::IncompatibleTypes { op, left, right }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataType::*;

    fn strict(op: EvalType, left: DataType, right: DataType) -> EvalResult<DataType> {
        TypePromotion::result_type(op, left, right, PromotionPolicy::Strict)
    }

    #[test]
    fn test_integer_promotion() {
        assert_eq!(strict(EvalType::Plus, Int4, Int4).unwrap(), Int4);
        assert_eq!(strict(EvalType::Plus, Int4, Int2).unwrap(), Int4);
        assert_eq!(strict(EvalType::Plus, Int4, Int8).unwrap(), Int8);
        assert_eq!(strict(EvalType::Minus, Int8, Int2).unwrap(), Int8);
    }

    #[test]
    fn test_float_promotion_is_asymmetric() {
        assert_eq!(strict(EvalType::Divide, Int4, Float4).unwrap(), Float4);
        assert_eq!(strict(EvalType::Divide, Float4, Int4).unwrap(), Float8);
        assert_eq!(strict(EvalType::Multiply, Float8, Int2).unwrap(), Float8);
        assert_eq!(strict(EvalType::Modular, Int8, Float4).unwrap(), Float8);
    }

    #[test]
    fn test_non_arithmetic_groups() {
        assert_eq!(strict(EvalType::Equal, Int4, Int8).unwrap(), Boolean);
        assert_eq!(strict(EvalType::Lth, Text, Int8).unwrap(), Boolean);
        assert_eq!(strict(EvalType::And, Boolean, Boolean).unwrap(), Boolean);
        assert_eq!(strict(EvalType::Concatenate, Text, Text).unwrap(), Text);
        assert_eq!(strict(EvalType::Concatenate, Int4, Text).unwrap(), Text);
    }

    #[test]
    fn test_small_int_on_the_left() {
        assert_eq!(strict(EvalType::Plus, Int2, Int2).unwrap(), Int2);
        assert_eq!(strict(EvalType::Plus, Int2, Int4).unwrap(), Int4);
        assert_eq!(strict(EvalType::Plus, Int2, Int8).unwrap(), Int8);
        assert_eq!(strict(EvalType::Plus, Int2, Float4).unwrap(), Float8);
    }

    #[test]
    fn test_strict_rejects_unsupported_pairs() {
        let err = strict(EvalType::Plus, Text, Int4).unwrap_err();
        assert!(matches!(
            err,
            EvalError::IncompatibleTypes {
                op: EvalType::Plus,
                left: Text,
                right: Int4
            }
        ));
        assert!(strict(EvalType::Plus, Int4, Text).is_err());
        assert!(strict(EvalType::Multiply, Boolean, Boolean).is_err());
    }

    #[test]
    fn test_permissive_inherits_left_type() {
        let permissive = |l, r| {
            TypePromotion::result_type(EvalType::Plus, l, r, PromotionPolicy::Permissive).unwrap()
        };
        assert_eq!(permissive(Text, Int4), Text);
        assert_eq!(permissive(Int4, Text), Int4);
        assert_eq!(permissive(Int2, Int8), Int2);
        // lattice entries are unaffected by the policy
        assert_eq!(permissive(Int4, Int8), Int8);
    }

    #[test]
    fn test_null_operand_takes_other_type() {
        assert_eq!(strict(EvalType::Plus, Null, Int8).unwrap(), Int8);
        assert_eq!(strict(EvalType::Plus, Float4, Null).unwrap(), Float4);
    }

    #[test]
    fn test_unsupported_operator_kind() {
        let err = strict(EvalType::Not, Boolean, Boolean).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedOperator(EvalType::Not)));
    }
}
