// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planning error types

use crate::plan::logical::NodeKind;
use crate::plan::pid::Pid;
use thiserror::Error;

/// Errors raised while lowering, querying or (de)serializing execution plans
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Lowering error: {kind} node {id}: {reason}")]
    Lowering {
        kind: NodeKind,
        id: Pid,
        reason: String,
    },

    #[error("Graph lookup error: {0}")]
    GraphLookup(String),

    #[error("Cycle detected at vertex {0}")]
    Cycle(Pid),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type PlanResult<T> = Result<T, PlanError>;
