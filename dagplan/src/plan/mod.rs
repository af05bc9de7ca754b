// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Logical plans and their lowering into execution plans
//!
//! This module holds the logical node model, the identifier allocator, the
//! execution plan DAG with its query API, and the structural comparator and
//! wire codec built on top of it.

pub mod codec;
pub mod compare;
pub mod context;
pub mod error;
pub mod execution;
pub mod graph;
pub mod input;
pub mod logical;
pub mod pid;

pub use codec::{ExecutionPlanWire, ParentRef};
pub use compare::{CompareMode, PlanComparator};
pub use context::PlanContext;
pub use error::{PlanError, PlanResult};
pub use execution::{EdgeType, ExecutionPlan, LogicalNodeGroup};
pub use input::InputContext;
pub use logical::{
    targets_schema, Arity, Detached, JoinType, LogicalNode, LogicalOp, NodeKind, SortKey, Target,
};
pub use pid::{Pid, PidAllocator};
