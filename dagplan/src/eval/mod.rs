// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression trees attached to plan nodes
//!
//! Plan nodes carry predicates and projection targets as `EvalNode` trees.
//! Each tree can report its result type without evaluating anything, which
//! is how plan nodes derive their output schema, and can be evaluated
//! against a tuple laid out by a schema.

pub mod binary;
pub mod error;

use crate::types::{Column, DataType, Datum, Schema};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use self::binary::BinaryEval;
pub use self::error::{EvalError, EvalResult};

/// Kind of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalType {
    // Logical
    And,
    Or,
    Not,

    // Comparison
    Equal,
    NotEqual,
    Lth,
    Leq,
    Gth,
    Geq,

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modular,

    // String
    Concatenate,
    Like,

    // Predicates
    In,
    IsNull,

    Function,
    Field,
    Const,
}

static BINARY_SYMBOLS: Lazy<HashMap<&'static str, EvalType>> = Lazy::new(|| {
    let mut symbols = HashMap::new();
    for op in [
        EvalType::And,
        EvalType::Or,
        EvalType::Equal,
        EvalType::NotEqual,
        EvalType::Lth,
        EvalType::Leq,
        EvalType::Gth,
        EvalType::Geq,
        EvalType::Plus,
        EvalType::Minus,
        EvalType::Multiply,
        EvalType::Divide,
        EvalType::Modular,
        EvalType::Concatenate,
    ] {
        symbols.insert(op.symbol(), op);
    }
    symbols.insert("!=", EvalType::NotEqual);
    symbols
});

impl EvalType {
    pub fn is_logical(&self) -> bool {
        matches!(self, EvalType::And | EvalType::Or)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            EvalType::Equal
                | EvalType::NotEqual
                | EvalType::Lth
                | EvalType::Leq
                | EvalType::Gth
                | EvalType::Geq
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            EvalType::Plus
                | EvalType::Minus
                | EvalType::Multiply
                | EvalType::Divide
                | EvalType::Modular
        )
    }

    /// Whether `BinaryEval` can type and evaluate this kind
    pub fn is_binary(&self) -> bool {
        self.is_logical()
            || self.is_comparison()
            || self.is_arithmetic()
            || *self == EvalType::Concatenate
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            EvalType::And => "AND",
            EvalType::Or => "OR",
            EvalType::Not => "NOT",
            EvalType::Equal => "=",
            EvalType::NotEqual => "<>",
            EvalType::Lth => "<",
            EvalType::Leq => "<=",
            EvalType::Gth => ">",
            EvalType::Geq => ">=",
            EvalType::Plus => "+",
            EvalType::Minus => "-",
            EvalType::Multiply => "*",
            EvalType::Divide => "/",
            EvalType::Modular => "%",
            EvalType::Concatenate => "||",
            EvalType::Like => "LIKE",
            EvalType::In => "IN",
            EvalType::IsNull => "IS NULL",
            EvalType::Function => "FUNCTION",
            EvalType::Field => "FIELD",
            EvalType::Const => "CONST",
        }
    }

    /// Parse the spelling of a binary operator
    pub fn from_symbol(symbol: &str) -> Option<EvalType> {
        BINARY_SYMBOLS
            .get(symbol.trim().to_uppercase().as_str())
            .copied()
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvalNode {
    Const(Datum),
    /// Reference to a column of the input tuple
    Field(Column),
    Binary(Box<BinaryEval>),
}

impl EvalNode {
    pub fn constant(value: impl Into<Datum>) -> Self {
        EvalNode::Const(value.into())
    }

    pub fn field(name: impl Into<String>, data_type: DataType) -> Self {
        EvalNode::Field(Column::new(name, data_type))
    }

    pub fn eval_type(&self) -> EvalType {
        match self {
            EvalNode::Const(_) => EvalType::Const,
            EvalNode::Field(_) => EvalType::Field,
            EvalNode::Binary(binary) => binary.eval_type(),
        }
    }

    /// Result type, known without evaluating
    pub fn value_type(&self) -> DataType {
        match self {
            EvalNode::Const(datum) => datum.data_type(),
            EvalNode::Field(column) => column.data_type,
            EvalNode::Binary(binary) => binary.value_type(),
        }
    }

    pub fn eval(&self, schema: &Schema, tuple: &[Datum]) -> EvalResult<Datum> {
        match self {
            EvalNode::Const(datum) => Ok(datum.clone()),
            EvalNode::Field(column) => schema
                .column_index(&column.name)
                .and_then(|idx| tuple.get(idx))
                .cloned()
                .ok_or_else(|| EvalError::ColumnNotFound(column.name.clone())),
            EvalNode::Binary(binary) => binary.eval(schema, tuple),
        }
    }
}

impl From<BinaryEval> for EvalNode {
    fn from(binary: BinaryEval) -> Self {
        EvalNode::Binary(Box::new(binary))
    }
}

impl fmt::Display for EvalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalNode::Const(datum) => write!(f, "{}", datum),
            EvalNode::Field(column) => write!(f, "{}", column.name),
            EvalNode::Binary(binary) => write!(f, "{}", binary),
        }
    }
}
