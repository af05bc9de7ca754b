// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Binary expressions
//!
//! The result type is fixed when the expression is built, so a plan node
//! holding it can report its output schema before anything is evaluated.

use crate::eval::{EvalError, EvalNode, EvalResult, EvalType};
use crate::types::{DataType, Datum, PromotionPolicy, Schema, TypePromotion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `left <op> right`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryEval {
    eval_type: EvalType,
    left: EvalNode,
    right: EvalNode,
    return_type: DataType,
}

impl BinaryEval {
    /// Build with the strict promotion policy
    pub fn new(eval_type: EvalType, left: EvalNode, right: EvalNode) -> EvalResult<Self> {
        Self::with_policy(eval_type, left, right, PromotionPolicy::Strict)
    }

    pub fn with_policy(
        eval_type: EvalType,
        left: EvalNode,
        right: EvalNode,
        policy: PromotionPolicy,
    ) -> EvalResult<Self> {
        if !eval_type.is_binary() {
            return Err(EvalError::UnsupportedOperator(eval_type));
        }

        let return_type =
            TypePromotion::result_type(eval_type, left.value_type(), right.value_type(), policy)?;

        Ok(Self {
            eval_type,
            left,
            right,
            return_type,
        })
    }

    pub fn eval_type(&self) -> EvalType {
        self.eval_type
    }

    pub fn left(&self) -> &EvalNode {
        &self.left
    }

    pub fn right(&self) -> &EvalNode {
        &self.right
    }

    pub fn value_type(&self) -> DataType {
        self.return_type
    }

    pub fn name(&self) -> &'static str {
        self.eval_type.symbol()
    }

    /// Evaluate both operands against `tuple`, then apply the operator
    pub fn eval(&self, schema: &Schema, tuple: &[Datum]) -> EvalResult<Datum> {
        let lhs = self.left.eval(schema, tuple)?;
        let rhs = self.right.eval(schema, tuple)?;
        Self::apply(self.eval_type, &lhs, &rhs)
    }

    /// Apply `op` to two already evaluated operands
    pub fn apply(op: EvalType, lhs: &Datum, rhs: &Datum) -> EvalResult<Datum> {
        match op {
            EvalType::And => lhs.and(rhs),
            EvalType::Or => lhs.or(rhs),

            EvalType::Equal => lhs.equals_to(rhs),
            EvalType::NotEqual => lhs.not_equals_to(rhs),
            EvalType::Lth => lhs.less_than(rhs),
            EvalType::Leq => lhs.less_than_equal(rhs),
            EvalType::Gth => lhs.greater_than(rhs),
            EvalType::Geq => lhs.greater_than_equal(rhs),

            EvalType::Plus => lhs.plus(rhs),
            EvalType::Minus => lhs.minus(rhs),
            EvalType::Multiply => lhs.multiply(rhs),
            EvalType::Divide => lhs.divide(rhs),
            EvalType::Modular => lhs.modular(rhs),

            EvalType::Concatenate => {
                if lhs.is_null() || rhs.is_null() {
                    return Ok(Datum::Null);
                }
                Ok(Datum::Text(lhs.as_chars() + &rhs.as_chars()))
            }

            other => Err(EvalError::UnsupportedOperator(other)),
        }
    }
}

impl fmt::Display for BinaryEval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_operand(f, &self.left)?;
        write!(f, " {} ", self.eval_type)?;
        fmt_operand(f, &self.right)
    }
}

/// Nested binary operands are parenthesized so the text keeps the tree shape
fn fmt_operand(f: &mut fmt::Formatter<'_>, operand: &EvalNode) -> fmt::Result {
    match operand {
        EvalNode::Binary(_) => write!(f, "({})", operand),
        _ => write!(f, "{}", operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int4(v: i32) -> EvalNode {
        EvalNode::constant(v)
    }

    #[test]
    fn test_return_type_is_fixed_at_construction() {
        let sum = BinaryEval::new(EvalType::Plus, int4(7), EvalNode::constant(8i64)).unwrap();
        assert_eq!(sum.value_type(), DataType::Int8);

        let cmp = BinaryEval::new(EvalType::Gth, sum.clone().into(), int4(10)).unwrap();
        assert_eq!(cmp.value_type(), DataType::Boolean);
    }

    #[test]
    fn test_nested_evaluation() {
        // (7 + 8) * 2
        let sum = BinaryEval::new(EvalType::Plus, int4(7), int4(8)).unwrap();
        let product = BinaryEval::new(EvalType::Multiply, sum.into(), int4(2)).unwrap();

        let result = product.eval(&Schema::new(), &[]).unwrap();
        assert_eq!(result, Datum::Int4(30));
        assert_eq!(product.to_string(), "(7 + 8) * 2");
    }

    #[test]
    fn test_display_keeps_grouping() {
        let left = BinaryEval::new(
            EvalType::Plus,
            int4(1),
            BinaryEval::new(EvalType::Multiply, int4(2), int4(3)).unwrap().into(),
        )
        .unwrap();
        let right = BinaryEval::new(
            EvalType::Multiply,
            BinaryEval::new(EvalType::Plus, int4(1), int4(2)).unwrap().into(),
            int4(3),
        )
        .unwrap();

        assert_eq!(left.to_string(), "1 + (2 * 3)");
        assert_eq!(right.to_string(), "(1 + 2) * 3");

        let left = crate::plan::Target::new(left.into()).column();
        let right = crate::plan::Target::new(right.into()).column();
        assert_ne!(left.name, right.name);
    }

    #[test]
    fn test_concatenate_short_circuits_on_null() {
        let null = Datum::Null;
        let text = Datum::from("abc");

        assert_eq!(BinaryEval::apply(EvalType::Concatenate, &null, &text).unwrap(), Datum::Null);
        assert_eq!(BinaryEval::apply(EvalType::Concatenate, &text, &null).unwrap(), Datum::Null);
        assert_eq!(
            BinaryEval::apply(EvalType::Concatenate, &text, &Datum::Int4(1)).unwrap(),
            Datum::from("abc1")
        );
    }

    #[test]
    fn test_non_binary_kind_is_rejected() {
        let err = BinaryEval::new(EvalType::Like, int4(1), int4(2)).unwrap_err();
        assert_eq!(err, EvalError::UnsupportedOperator(EvalType::Like));

        let err = BinaryEval::apply(EvalType::IsNull, &Datum::Null, &Datum::Null).unwrap_err();
        assert_eq!(err, EvalError::UnsupportedOperator(EvalType::IsNull));
    }
}
