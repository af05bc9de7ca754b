// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! dagplan - logical plan to execution DAG lowering for SQL engines
//!
//! A planner hands over a tree of logical operators; `ExecutionPlan` moves
//! it node by node into a directed acyclic graph whose edges record how
//! each child feeds its parent. The resulting graph is what a distributed
//! scheduler splits into stages.
//!
//! # Features
//!
//! - **Lowering**: Tree fragments become vertices and typed edges wired to a
//!   single terminal node
//! - **Graph Queries**: Children, parents, edge types and edge removal for
//!   rewrite passes
//! - **Comparison**: Structural equality by identifier or by content
//! - **Codec**: Adjacency-list wire form as JSON or bincode
//! - **Expressions**: Binary operator typing over a numeric promotion
//!   lattice, and evaluation over tuples
//!
//! # Usage
//!
//! ```ignore
//! use dagplan::{DataType, JoinType, PlanContext, Schema};
//!
//! let ctx = PlanContext::new();
//! let schema = Schema::new().with_column("id", DataType::Int4);
//! let tree = ctx.join(
//!     JoinType::Inner,
//!     None,
//!     ctx.scan("orders", schema.clone()),
//!     ctx.scan("customers", schema),
//! );
//!
//! let mut plan = ctx.new_execution_plan();
//! plan.add_plan(tree);
//! plan.build()?;
//! assert!(plan.has_join_plan());
//! ```

pub mod config;
pub mod eval;
pub mod plan;
pub mod types;

pub use config::PlannerConfig;
pub use eval::{BinaryEval, EvalError, EvalNode, EvalResult, EvalType};
pub use plan::{
    CompareMode, EdgeType, ExecutionPlan, ExecutionPlanWire, InputContext, JoinType, LogicalNode,
    LogicalNodeGroup, LogicalOp, NodeKind, Pid, PidAllocator, PlanContext, PlanError, PlanResult,
    SortKey, Target,
};
pub use types::{Column, DataType, Datum, PromotionPolicy, Schema};

/// dagplan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
