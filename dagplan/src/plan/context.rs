// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-session planning context
//!
//! Owns the identifier allocator and the planner configuration. Every
//! logical node built through a context receives a fresh identifier from
//! the shared allocator, so nodes of all plans in one session never
//! collide.

use crate::config::PlannerConfig;
use crate::eval::{BinaryEval, EvalNode, EvalResult, EvalType};
use crate::plan::execution::ExecutionPlan;
use crate::plan::logical::{targets_schema, JoinType, LogicalNode, LogicalOp, SortKey, Target};
use crate::plan::pid::{Pid, PidAllocator};
use crate::types::{Column, Schema};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    allocator: Arc<PidAllocator>,
    config: PlannerConfig,
}

impl PlanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        Self {
            allocator: Arc::new(PidAllocator::new()),
            config,
        }
    }

    /// Continue an existing allocator, e.g. one restored with a plan
    pub fn with_allocator(allocator: Arc<PidAllocator>, config: PlannerConfig) -> Self {
        Self { allocator, config }
    }

    pub fn allocator(&self) -> &Arc<PidAllocator> {
        &self.allocator
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn new_pid(&self) -> Pid {
        self.allocator.new_pid()
    }

    pub fn new_execution_plan(&self) -> ExecutionPlan {
        ExecutionPlan::with_config(Arc::clone(&self.allocator), self.config.clone())
    }

    /// Binary expression typed with this context's promotion policy
    pub fn binary(&self, op: EvalType, left: EvalNode, right: EvalNode) -> EvalResult<EvalNode> {
        BinaryEval::with_policy(op, left, right, self.config.promotion).map(EvalNode::from)
    }

    fn node(&self, op: LogicalOp, schema: Schema) -> LogicalNode {
        LogicalNode::new(self.new_pid(), op, schema)
    }

    pub fn scan(&self, table: impl Into<String>, schema: Schema) -> LogicalNode {
        self.node(
            LogicalOp::Scan {
                table: table.into(),
                alias: None,
            },
            schema,
        )
    }

    pub fn scan_as(
        &self,
        table: impl Into<String>,
        alias: impl Into<String>,
        schema: Schema,
    ) -> LogicalNode {
        self.node(
            LogicalOp::Scan {
                table: table.into(),
                alias: Some(alias.into()),
            },
            schema,
        )
    }

    pub fn projection(&self, targets: Vec<Target>, child: LogicalNode) -> LogicalNode {
        let schema = targets_schema(&targets);
        self.node(
            LogicalOp::Projection {
                targets,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn selection(&self, predicate: EvalNode, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Selection {
                predicate,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn join(
        &self,
        join_type: JoinType,
        predicate: Option<EvalNode>,
        left: LogicalNode,
        right: LogicalNode,
    ) -> LogicalNode {
        let schema = left.output_schema().merge(right.output_schema());
        self.node(
            LogicalOp::Join {
                join_type,
                predicate,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
            },
            schema,
        )
    }

    pub fn group_by(
        &self,
        grouping_keys: Vec<Column>,
        targets: Vec<Target>,
        child: LogicalNode,
    ) -> LogicalNode {
        let schema = targets_schema(&targets);
        self.node(
            LogicalOp::GroupBy {
                grouping_keys,
                targets,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn having(&self, predicate: EvalNode, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Having {
                predicate,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn sort(&self, sort_keys: Vec<SortKey>, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Sort {
                sort_keys,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn limit(&self, count: u64, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Limit {
                count,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn union(&self, all: bool, left: LogicalNode, right: LogicalNode) -> LogicalNode {
        let schema = left.output_schema().clone();
        self.node(
            LogicalOp::Union {
                all,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
            },
            schema,
        )
    }

    pub fn except(&self, all: bool, left: LogicalNode, right: LogicalNode) -> LogicalNode {
        let schema = left.output_schema().clone();
        self.node(
            LogicalOp::Except {
                all,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
            },
            schema,
        )
    }

    pub fn intersect(&self, all: bool, left: LogicalNode, right: LogicalNode) -> LogicalNode {
        let schema = left.output_schema().clone();
        self.node(
            LogicalOp::Intersect {
                all,
                left: Some(Box::new(left)),
                right: Some(Box::new(right)),
            },
            schema,
        )
    }

    pub fn table_subquery(&self, alias: impl Into<String>, subquery: LogicalNode) -> LogicalNode {
        let schema = subquery.output_schema().clone();
        self.node(
            LogicalOp::TableSubQuery {
                alias: alias.into(),
                subquery: Some(Box::new(subquery)),
            },
            schema,
        )
    }

    pub fn create_table(&self, table: impl Into<String>, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::CreateTable {
                table: table.into(),
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn insert(
        &self,
        table: impl Into<String>,
        overwrite: bool,
        child: LogicalNode,
    ) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Insert {
                table: table.into(),
                overwrite,
                child: Some(Box::new(child)),
            },
            schema,
        )
    }

    pub fn exprs(&self, targets: Vec<Target>) -> LogicalNode {
        let schema = targets_schema(&targets);
        self.node(LogicalOp::Exprs { targets }, schema)
    }

    pub fn root(&self, child: LogicalNode) -> LogicalNode {
        let schema = child.output_schema().clone();
        self.node(
            LogicalOp::Root {
                child: Some(Box::new(child)),
            },
            schema,
        )
    }
}
