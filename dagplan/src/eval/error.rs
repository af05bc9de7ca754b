// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression evaluation error types

use crate::eval::EvalType;
use crate::types::DataType;
use thiserror::Error;

/// Errors raised while deriving types for, or evaluating, expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unsupported operator: {0:?} expression is not supported")]
    UnsupportedOperator(EvalType),

    #[error("Incompatible types: {left} {op} {right}")]
    IncompatibleTypes {
        op: EvalType,
        left: DataType,
        right: DataType,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
