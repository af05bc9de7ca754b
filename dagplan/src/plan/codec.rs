// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Wire form of an execution plan
//!
//! Edges are recorded by child: each child identifier maps to its parents,
//! listed in the order the edges were added. Children are keyed in
//! ascending identifier order and are replayed in that order on decode, so
//! a decoded plan lists the parents of every vertex exactly as the encoded
//! plan did. The children of a parent are re-sorted by edge type on every
//! query, and the terminal's children are kept in ascending root id by the
//! builder, so neither depends on replay order.

use crate::config::PlannerConfig;
use crate::plan::error::{PlanError, PlanResult};
use crate::plan::execution::{EdgeType, ExecutionPlan};
use crate::plan::input::InputContext;
use crate::plan::logical::{LogicalNode, NodeKind};
use crate::plan::pid::{Pid, PidAllocator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub parent_id: Pid,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlanWire {
    pub allocator_state: u64,
    pub has_join: bool,
    pub has_union: bool,
    pub input_context: Option<InputContext>,
    pub terminal: LogicalNode,
    pub vertices: BTreeMap<Pid, LogicalNode>,
    pub adjacency: BTreeMap<Pid, Vec<ParentRef>>,
}

impl From<&ExecutionPlan> for ExecutionPlanWire {
    fn from(plan: &ExecutionPlan) -> Self {
        let mut adjacency: BTreeMap<Pid, Vec<ParentRef>> = BTreeMap::new();
        for (child, parent, edge_type) in plan.graph.edges() {
            adjacency.entry(child).or_default().push(ParentRef {
                parent_id: parent,
                edge_type: *edge_type,
            });
        }

        Self {
            allocator_state: plan.allocator.state(),
            has_join: plan.has_join_plan,
            has_union: plan.has_union_plan,
            input_context: plan.input_context.clone(),
            terminal: plan.terminal.clone(),
            vertices: plan.vertices.clone(),
            adjacency,
        }
    }
}

fn malformed(reason: String) -> PlanError {
    PlanError::Deserialization(reason)
}

impl ExecutionPlanWire {
    pub fn into_plan(self) -> PlanResult<ExecutionPlan> {
        self.into_plan_with_config(PlannerConfig::default())
    }

    /// Rebuild a plan, rejecting any wire input that does not describe a
    /// complete acyclic graph
    pub fn into_plan_with_config(self, config: PlannerConfig) -> PlanResult<ExecutionPlan> {
        self.validate()?;

        let ExecutionPlanWire {
            allocator_state,
            has_join,
            has_union,
            input_context,
            terminal,
            vertices,
            adjacency,
        } = self;

        let allocator = Arc::new(PidAllocator::starting_at(allocator_state));
        let mut plan = ExecutionPlan::from_parts(allocator, config, terminal);
        plan.has_join_plan = has_join;
        plan.has_union_plan = has_union;
        plan.input_context = input_context;
        plan.vertices.extend(vertices);

        for (child, parents) in adjacency {
            for parent in parents {
                if plan.graph.has_edge(child, parent.parent_id) {
                    return Err(malformed(format!(
                        "duplicate edge from {} to {}",
                        child, parent.parent_id
                    )));
                }
                plan.add_edge(child, parent.parent_id, parent.edge_type);
            }
        }

        if let Err(PlanError::Cycle(at)) = plan.topological_order() {
            return Err(malformed(format!("adjacency contains a cycle through {}", at)));
        }

        plan.mark_built();
        log::debug!(
            "Decoded execution plan: {} vertices, {} edges",
            plan.vertex_count(),
            plan.edge_count()
        );
        Ok(plan)
    }

    fn validate(&self) -> PlanResult<()> {
        let terminal_id = self.terminal.id();
        if self.terminal.kind() != NodeKind::Root || self.terminal.has_children() {
            return Err(malformed(format!(
                "terminal {} must be a root node without children",
                terminal_id
            )));
        }

        for (id, node) in &self.vertices {
            if *id != node.id() {
                return Err(malformed(format!(
                    "vertex key {} does not match node id {}",
                    id,
                    node.id()
                )));
            }
            if node.has_children() {
                return Err(malformed(format!("vertex {} still links its children", id)));
            }
            if *id == terminal_id && *node != self.terminal {
                return Err(malformed(format!(
                    "vertex {} conflicts with the terminal node",
                    id
                )));
            }
            if id.as_u64() >= self.allocator_state {
                return Err(malformed(format!(
                    "vertex {} was not issued by an allocator at state {}",
                    id, self.allocator_state
                )));
            }
        }
        if terminal_id.as_u64() >= self.allocator_state {
            return Err(malformed(format!(
                "terminal {} was not issued by an allocator at state {}",
                terminal_id, self.allocator_state
            )));
        }

        let known = |id: &Pid| *id == terminal_id || self.vertices.contains_key(id);
        for (child, parents) in &self.adjacency {
            if *child == terminal_id {
                return Err(malformed(format!("terminal {} cannot be a child", child)));
            }
            if !known(child) {
                return Err(malformed(format!("edge from unknown vertex {}", child)));
            }
            if let Some(parent) = parents.iter().find(|p| !known(&p.parent_id)) {
                return Err(malformed(format!(
                    "edge from {} to unknown vertex {}",
                    child, parent.parent_id
                )));
            }
        }

        if let Some(context) = &self.input_context {
            if let Some(scan) = context.scan_nodes().find(|s| !self.vertices.contains_key(&s.id())) {
                return Err(malformed(format!(
                    "input scan {} is not a vertex of the plan",
                    scan.id()
                )));
            }
        }

        Ok(())
    }
}

impl ExecutionPlan {
    pub fn to_wire(&self) -> ExecutionPlanWire {
        ExecutionPlanWire::from(self)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        let json = serde_json::to_string(&self.to_wire())
            .map_err(|e| PlanError::Serialization(e.to_string()))?;
        log::debug!("Encoded execution plan to {} bytes of JSON", json.len());
        Ok(json)
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Self::from_json_with_config(json, PlannerConfig::default())
    }

    pub fn from_json_with_config(json: &str, config: PlannerConfig) -> PlanResult<Self> {
        let wire: ExecutionPlanWire =
            serde_json::from_str(json).map_err(|e| PlanError::Deserialization(e.to_string()))?;
        wire.into_plan_with_config(config)
    }

    /// Compact binary encoding
    pub fn to_bytes(&self) -> PlanResult<Vec<u8>> {
        let bytes = bincode::serialize(&self.to_wire())
            .map_err(|e| PlanError::Serialization(e.to_string()))?;
        log::debug!("Encoded execution plan to {} bytes", bytes.len());
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> PlanResult<Self> {
        Self::from_bytes_with_config(bytes, PlannerConfig::default())
    }

    pub fn from_bytes_with_config(bytes: &[u8], config: PlannerConfig) -> PlanResult<Self> {
        let wire: ExecutionPlanWire =
            bincode::deserialize(bytes).map_err(|e| PlanError::Deserialization(e.to_string()))?;
        wire.into_plan_with_config(config)
    }
}
