// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Logical query plan representation
//!
//! A logical plan is a tree of `LogicalNode`s produced by the planner. Every
//! node carries an identifier assigned once at construction and the schema
//! of the rows it produces. Child links are `Option`s so that lowering into
//! an `ExecutionPlan` can move each child out of its parent, leaving the
//! slot empty.

use crate::eval::EvalNode;
use crate::plan::pid::Pid;
use crate::types::{Column, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

type Child = Option<Box<LogicalNode>>;

/// Logical plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalNode {
    id: Pid,
    output_schema: Schema,
    op: LogicalOp,
}

/// Operator payload of a logical node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Top of a planned statement
    Root { child: Child },

    /// Compute output columns
    Projection { targets: Vec<Target>, child: Child },

    /// Filter rows based on a predicate
    Selection { predicate: EvalNode, child: Child },

    /// Read a base relation
    Scan {
        table: String,
        alias: Option<String>,
    },

    /// Join two inputs
    Join {
        join_type: JoinType,
        predicate: Option<EvalNode>,
        left: Child,
        right: Child,
    },

    /// Group rows and compute aggregates
    GroupBy {
        grouping_keys: Vec<Column>,
        targets: Vec<Target>,
        child: Child,
    },

    /// Post-aggregation filter
    Having { predicate: EvalNode, child: Child },

    /// Order rows
    Sort { sort_keys: Vec<SortKey>, child: Child },

    /// Keep at most `count` rows
    Limit { count: u64, child: Child },

    Union { all: bool, left: Child, right: Child },

    Except { all: bool, left: Child, right: Child },

    Intersect { all: bool, left: Child, right: Child },

    /// A nested plan used as a relation in FROM
    TableSubQuery { alias: String, subquery: Child },

    /// CREATE TABLE ... AS SELECT
    CreateTable { table: String, child: Child },

    /// INSERT [OVERWRITE] INTO ... SELECT
    Insert {
        table: String,
        overwrite: bool,
        child: Child,
    },

    /// Expressions evaluated without an input relation (`SELECT 7 + 8`)
    Exprs { targets: Vec<Target> },
}

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Projection,
    Selection,
    Scan,
    Join,
    GroupBy,
    Having,
    Sort,
    Limit,
    Union,
    Except,
    Intersect,
    TableSubQuery,
    CreateTable,
    Insert,
    Exprs,
}

/// How many inputs a node kind takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Leaf,
    Unary,
    Binary,
    /// Wraps a nested plan
    SubPlan,
}

/// Children moved out of a node
#[derive(Debug)]
pub enum Detached {
    Leaf,
    Unary(Option<LogicalNode>),
    Binary(Option<LogicalNode>, Option<LogicalNode>),
    SubPlan(Option<LogicalNode>),
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    Full,
    Cross,
}

/// Output expression with optional alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub expr: EvalNode,
    pub alias: Option<String>,
}

/// Sort key with order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: Column,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl Target {
    pub fn new(expr: EvalNode) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: EvalNode, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Output column described by this target
    pub fn column(&self) -> Column {
        let name = match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        };
        Column::new(name, self.expr.value_type())
    }
}

impl SortKey {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            ascending: true,
            nulls_first: false,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            ascending: false,
            nulls_first: true,
        }
    }
}

/// Schema produced by a list of targets
pub fn targets_schema(targets: &[Target]) -> Schema {
    Schema::from_columns(targets.iter().map(Target::column).collect())
}

impl NodeKind {
    pub fn arity(&self) -> Arity {
        match self {
            NodeKind::Scan | NodeKind::Exprs => Arity::Leaf,
            NodeKind::Root
            | NodeKind::Projection
            | NodeKind::Selection
            | NodeKind::GroupBy
            | NodeKind::Having
            | NodeKind::Sort
            | NodeKind::Limit
            | NodeKind::CreateTable
            | NodeKind::Insert => Arity::Unary,
            NodeKind::Join | NodeKind::Union | NodeKind::Except | NodeKind::Intersect => {
                Arity::Binary
            }
            NodeKind::TableSubQuery => Arity::SubPlan,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "ROOT",
            NodeKind::Projection => "PROJECTION",
            NodeKind::Selection => "SELECTION",
            NodeKind::Scan => "SCAN",
            NodeKind::Join => "JOIN",
            NodeKind::GroupBy => "GROUP_BY",
            NodeKind::Having => "HAVING",
            NodeKind::Sort => "SORT",
            NodeKind::Limit => "LIMIT",
            NodeKind::Union => "UNION",
            NodeKind::Except => "EXCEPT",
            NodeKind::Intersect => "INTERSECT",
            NodeKind::TableSubQuery => "TABLE_SUBQUERY",
            NodeKind::CreateTable => "CREATE_TABLE",
            NodeKind::Insert => "INSERT",
            NodeKind::Exprs => "EXPRS",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LogicalNode {
    pub fn new(id: Pid, op: LogicalOp, output_schema: Schema) -> Self {
        Self {
            id,
            output_schema,
            op,
        }
    }

    pub fn id(&self) -> Pid {
        self.id
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn op(&self) -> &LogicalOp {
        &self.op
    }

    pub fn kind(&self) -> NodeKind {
        match &self.op {
            LogicalOp::Root { .. } => NodeKind::Root,
            LogicalOp::Projection { .. } => NodeKind::Projection,
            LogicalOp::Selection { .. } => NodeKind::Selection,
            LogicalOp::Scan { .. } => NodeKind::Scan,
            LogicalOp::Join { .. } => NodeKind::Join,
            LogicalOp::GroupBy { .. } => NodeKind::GroupBy,
            LogicalOp::Having { .. } => NodeKind::Having,
            LogicalOp::Sort { .. } => NodeKind::Sort,
            LogicalOp::Limit { .. } => NodeKind::Limit,
            LogicalOp::Union { .. } => NodeKind::Union,
            LogicalOp::Except { .. } => NodeKind::Except,
            LogicalOp::Intersect { .. } => NodeKind::Intersect,
            LogicalOp::TableSubQuery { .. } => NodeKind::TableSubQuery,
            LogicalOp::CreateTable { .. } => NodeKind::CreateTable,
            LogicalOp::Insert { .. } => NodeKind::Insert,
            LogicalOp::Exprs { .. } => NodeKind::Exprs,
        }
    }

    pub fn arity(&self) -> Arity {
        self.kind().arity()
    }

    /// Child of a unary node
    pub fn child(&self) -> Option<&LogicalNode> {
        match &self.op {
            LogicalOp::Root { child }
            | LogicalOp::Projection { child, .. }
            | LogicalOp::Selection { child, .. }
            | LogicalOp::GroupBy { child, .. }
            | LogicalOp::Having { child, .. }
            | LogicalOp::Sort { child, .. }
            | LogicalOp::Limit { child, .. }
            | LogicalOp::CreateTable { child, .. }
            | LogicalOp::Insert { child, .. } => child.as_deref(),
            _ => None,
        }
    }

    pub fn left_child(&self) -> Option<&LogicalNode> {
        match &self.op {
            LogicalOp::Join { left, .. }
            | LogicalOp::Union { left, .. }
            | LogicalOp::Except { left, .. }
            | LogicalOp::Intersect { left, .. } => left.as_deref(),
            _ => None,
        }
    }

    pub fn right_child(&self) -> Option<&LogicalNode> {
        match &self.op {
            LogicalOp::Join { right, .. }
            | LogicalOp::Union { right, .. }
            | LogicalOp::Except { right, .. }
            | LogicalOp::Intersect { right, .. } => right.as_deref(),
            _ => None,
        }
    }

    pub fn sub_query(&self) -> Option<&LogicalNode> {
        match &self.op {
            LogicalOp::TableSubQuery { subquery, .. } => subquery.as_deref(),
            _ => None,
        }
    }

    /// Whether any child slot is still linked
    pub fn has_children(&self) -> bool {
        self.child_slots().iter().any(|slot| slot.is_some())
    }

    /// Child slots in canonical order: unary child, or left then right, or
    /// the nested sub-plan
    fn child_slots(&self) -> Vec<&Child> {
        match &self.op {
            LogicalOp::Root { child }
            | LogicalOp::Projection { child, .. }
            | LogicalOp::Selection { child, .. }
            | LogicalOp::GroupBy { child, .. }
            | LogicalOp::Having { child, .. }
            | LogicalOp::Sort { child, .. }
            | LogicalOp::Limit { child, .. }
            | LogicalOp::CreateTable { child, .. }
            | LogicalOp::Insert { child, .. } => vec![child],
            LogicalOp::Join { left, right, .. }
            | LogicalOp::Union { left, right, .. }
            | LogicalOp::Except { left, right, .. }
            | LogicalOp::Intersect { left, right, .. } => vec![left, right],
            LogicalOp::TableSubQuery { subquery, .. } => vec![subquery],
            LogicalOp::Scan { .. } | LogicalOp::Exprs { .. } => Vec::new(),
        }
    }

    pub(crate) fn child_slots_mut(&mut self) -> Vec<&mut Child> {
        match &mut self.op {
            LogicalOp::Root { child }
            | LogicalOp::Projection { child, .. }
            | LogicalOp::Selection { child, .. }
            | LogicalOp::GroupBy { child, .. }
            | LogicalOp::Having { child, .. }
            | LogicalOp::Sort { child, .. }
            | LogicalOp::Limit { child, .. }
            | LogicalOp::CreateTable { child, .. }
            | LogicalOp::Insert { child, .. } => vec![child],
            LogicalOp::Join { left, right, .. }
            | LogicalOp::Union { left, right, .. }
            | LogicalOp::Except { left, right, .. }
            | LogicalOp::Intersect { left, right, .. } => vec![left, right],
            LogicalOp::TableSubQuery { subquery, .. } => vec![subquery],
            LogicalOp::Scan { .. } | LogicalOp::Exprs { .. } => Vec::new(),
        }
    }

    /// Move every child out of this node, leaving its slots empty
    pub fn detach_children(&mut self) -> Detached {
        let arity = self.arity();
        let mut taken = self
            .child_slots_mut()
            .into_iter()
            .map(|slot| slot.take().map(|child| *child))
            .collect::<Vec<_>>()
            .into_iter();

        match arity {
            Arity::Leaf => Detached::Leaf,
            Arity::Unary => Detached::Unary(taken.next().flatten()),
            Arity::Binary => {
                let left = taken.next().flatten();
                let right = taken.next().flatten();
                Detached::Binary(left, right)
            }
            Arity::SubPlan => Detached::SubPlan(taken.next().flatten()),
        }
    }

    /// Copy of this node without its children
    pub fn detached_copy(&self) -> LogicalNode {
        let op = match &self.op {
            LogicalOp::Root { .. } => LogicalOp::Root { child: None },
            LogicalOp::Projection { targets, .. } => LogicalOp::Projection {
                targets: targets.clone(),
                child: None,
            },
            LogicalOp::Selection { predicate, .. } => LogicalOp::Selection {
                predicate: predicate.clone(),
                child: None,
            },
            LogicalOp::Scan { .. } | LogicalOp::Exprs { .. } => self.op.clone(),
            LogicalOp::Join {
                join_type,
                predicate,
                ..
            } => LogicalOp::Join {
                join_type: *join_type,
                predicate: predicate.clone(),
                left: None,
                right: None,
            },
            LogicalOp::GroupBy {
                grouping_keys,
                targets,
                ..
            } => LogicalOp::GroupBy {
                grouping_keys: grouping_keys.clone(),
                targets: targets.clone(),
                child: None,
            },
            LogicalOp::Having { predicate, .. } => LogicalOp::Having {
                predicate: predicate.clone(),
                child: None,
            },
            LogicalOp::Sort { sort_keys, .. } => LogicalOp::Sort {
                sort_keys: sort_keys.clone(),
                child: None,
            },
            LogicalOp::Limit { count, .. } => LogicalOp::Limit {
                count: *count,
                child: None,
            },
            LogicalOp::Union { all, .. } => LogicalOp::Union {
                all: *all,
                left: None,
                right: None,
            },
            LogicalOp::Except { all, .. } => LogicalOp::Except {
                all: *all,
                left: None,
                right: None,
            },
            LogicalOp::Intersect { all, .. } => LogicalOp::Intersect {
                all: *all,
                left: None,
                right: None,
            },
            LogicalOp::TableSubQuery { alias, .. } => LogicalOp::TableSubQuery {
                alias: alias.clone(),
                subquery: None,
            },
            LogicalOp::CreateTable { table, .. } => LogicalOp::CreateTable {
                table: table.clone(),
                child: None,
            },
            LogicalOp::Insert {
                table, overwrite, ..
            } => LogicalOp::Insert {
                table: table.clone(),
                overwrite: *overwrite,
                child: None,
            },
        };
        LogicalNode::new(self.id, op, self.output_schema.clone())
    }

    /// Compare kind, output schema and operator payload, ignoring the
    /// identifier and children
    pub fn same_content(&self, other: &LogicalNode) -> bool {
        if self.output_schema != other.output_schema || self.kind() != other.kind() {
            return false;
        }
        if !self.has_children() && !other.has_children() {
            return self.op == other.op;
        }
        self.detached_copy().op == other.detached_copy().op
    }

    /// Compare whole subtrees by content, ignoring identifiers
    pub fn deep_equals(&self, other: &LogicalNode) -> bool {
        if !self.same_content(other) {
            return false;
        }
        let mine = self.child_slots();
        let theirs = other.child_slots();
        mine.len() == theirs.len()
            && mine.iter().zip(theirs.iter()).all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.deep_equals(b),
                (None, None) => true,
                _ => false,
            })
    }

    /// Name of the scanned relation, for scan nodes
    pub fn table_name(&self) -> Option<&str> {
        match &self.op {
            LogicalOp::Scan { table, .. }
            | LogicalOp::CreateTable { table, .. }
            | LogicalOp::Insert { table, .. } => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.id)?;
        match &self.op {
            LogicalOp::Scan { table, alias } => {
                write!(f, " table: {}", table)?;
                if let Some(alias) = alias {
                    write!(f, " as {}", alias)?;
                }
                Ok(())
            }
            LogicalOp::Join {
                join_type,
                predicate,
                ..
            } => {
                write!(f, " type: {:?}", join_type)?;
                if let Some(predicate) = predicate {
                    write!(f, " on: {}", predicate)?;
                }
                Ok(())
            }
            LogicalOp::Selection { predicate, .. } | LogicalOp::Having { predicate, .. } => {
                write!(f, " predicate: {}", predicate)
            }
            LogicalOp::Limit { count, .. } => write!(f, " count: {}", count),
            LogicalOp::TableSubQuery { alias, .. } => write!(f, " alias: {}", alias),
            LogicalOp::CreateTable { table, .. } | LogicalOp::Insert { table, .. } => {
                write!(f, " table: {}", table)
            }
            _ => write!(f, " out: {}", self.output_schema),
        }
    }
}
