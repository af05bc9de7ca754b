// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution plans: logical plan trees lowered into a DAG
//!
//! An `ExecutionPlan` collects one or more tree fragments, then `build()`
//! moves every node of every fragment into an identifier-keyed vertex map
//! and records the parent/child structure as typed edges. Each fragment
//! root is connected to a synthetic terminal node, the unique sink of the
//! graph. After lowering the graph is the only record of structure: no
//! vertex keeps a child link.

use crate::config::PlannerConfig;
use crate::plan::error::{PlanError, PlanResult};
use crate::plan::graph::DirectedGraph;
use crate::plan::input::InputContext;
use crate::plan::logical::{Detached, LogicalNode, LogicalOp, NodeKind};
use crate::plan::pid::{Pid, PidAllocator};
use crate::types::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Type of an edge from a child to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Unary input, or a fragment root feeding the terminal node
    Single,
    /// Left input of a binary node
    Left,
    /// Right input of a binary node
    Right,
}

impl EdgeType {
    /// Position among a parent's children
    fn rank(&self) -> u8 {
        match self {
            EdgeType::Left => 0,
            EdgeType::Right => 1,
            EdgeType::Single => 2,
        }
    }
}

/// Nodes of one fragment captured root first, before lowering
#[derive(Debug, Clone)]
pub struct LogicalNodeGroup {
    root_pid: Pid,
    /// order: root -> leaf
    nodes: Vec<LogicalNode>,
    /// which child slots of each node were linked
    shape: Vec<Vec<bool>>,
}

impl LogicalNodeGroup {
    pub fn new(root: LogicalNode) -> Self {
        let mut group = Self {
            root_pid: root.id(),
            nodes: Vec::new(),
            shape: Vec::new(),
        };
        group.capture(root);
        group
    }

    fn capture(&mut self, mut node: LogicalNode) {
        let children: Vec<Option<LogicalNode>> = node
            .child_slots_mut()
            .into_iter()
            .map(|slot| slot.take().map(|child| *child))
            .collect();
        self.shape.push(children.iter().map(Option::is_some).collect());
        self.nodes.push(node);
        for child in children.into_iter().flatten() {
            self.capture(child);
        }
    }

    pub fn id(&self) -> Pid {
        self.root_pid
    }

    /// Captured nodes, each without child links
    pub fn nodes(&self) -> &[LogicalNode] {
        &self.nodes
    }

    pub fn root_node(&self) -> Option<&LogicalNode> {
        self.nodes.first()
    }

    pub fn leaf_node(&self) -> Option<&LogicalNode> {
        self.nodes.last()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuild the fragment as a linked tree
    pub fn to_linked_node(&self) -> Option<LogicalNode> {
        let mut entries = self.nodes.iter().cloned().zip(self.shape.iter());
        Self::link(&mut entries)
    }

    fn link<'a, I>(entries: &mut I) -> Option<LogicalNode>
    where
        I: Iterator<Item = (LogicalNode, &'a Vec<bool>)>,
    {
        let (mut node, shape) = entries.next()?;
        for (slot, linked) in node.child_slots_mut().into_iter().zip(shape.iter()) {
            if *linked {
                *slot = Self::link(entries).map(Box::new);
            }
        }
        Some(node)
    }
}

/// A DAG of logical nodes.
///
/// If there are two input sources the plan includes a join or a union. The
/// terminal node is the start of any traversal because a plan may have
/// several output fragments.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub(crate) allocator: Arc<PidAllocator>,
    pub(crate) config: PlannerConfig,
    pub(crate) input_context: Option<InputContext>,
    pub(crate) has_union_plan: bool,
    pub(crate) has_join_plan: bool,
    pub(crate) terminal: LogicalNode,
    pub(crate) vertices: BTreeMap<Pid, LogicalNode>,
    pub(crate) graph: DirectedGraph<Pid, EdgeType>,

    groups: BTreeMap<Pid, LogicalNodeGroup>,
    lowered: BTreeSet<Pid>,
    built: bool,
}

impl ExecutionPlan {
    pub fn new(allocator: Arc<PidAllocator>) -> Self {
        Self::with_config(allocator, PlannerConfig::default())
    }

    pub fn with_config(allocator: Arc<PidAllocator>, config: PlannerConfig) -> Self {
        let terminal = LogicalNode::new(
            allocator.new_pid(),
            LogicalOp::Root { child: None },
            Schema::new(),
        );
        Self::from_parts(allocator, config, terminal)
    }

    pub(crate) fn from_parts(
        allocator: Arc<PidAllocator>,
        config: PlannerConfig,
        terminal: LogicalNode,
    ) -> Self {
        let mut vertices = BTreeMap::new();
        vertices.insert(terminal.id(), terminal.clone());
        Self {
            allocator,
            config,
            input_context: None,
            has_union_plan: false,
            has_join_plan: false,
            terminal,
            vertices,
            graph: DirectedGraph::new(),
            groups: BTreeMap::new(),
            lowered: BTreeSet::new(),
            built: false,
        }
    }

    /// Replace every registered fragment with `plan`
    pub fn set_plan(&mut self, plan: LogicalNode) -> Pid {
        self.clear();
        self.add_plan(plan)
    }

    /// Reset to an empty, unbuilt plan with the same terminal node
    pub fn clear(&mut self) {
        log::debug!("Clearing execution plan (terminal {})", self.terminal.id());
        self.graph.clear();
        self.groups.clear();
        self.lowered.clear();
        self.vertices.clear();
        self.vertices.insert(self.terminal.id(), self.terminal.clone());
        self.input_context = None;
        self.has_union_plan = false;
        self.has_join_plan = false;
        self.built = false;
    }

    /// Register a fragment for lowering. A top-level root node is unwrapped
    /// to its child. Returns the fragment's root identifier. A fragment whose
    /// root is already lowered keeps its lowered form and the tree is dropped.
    pub fn add_plan(&mut self, plan: LogicalNode) -> Pid {
        let mut top = plan;
        if top.kind() == NodeKind::Root {
            if let Detached::Unary(Some(child)) = top.detach_children() {
                top = child;
            }
        }

        let root_pid = top.id();
        if self.lowered.contains(&root_pid) {
            log::warn!(
                "Fragment {} is already lowered into this plan, ignoring the new tree",
                root_pid
            );
            return root_pid;
        }

        let group = LogicalNodeGroup::new(top);
        log::debug!(
            "Registered fragment {} with {} node(s)",
            root_pid,
            group.len()
        );
        self.groups.insert(root_pid, group);
        self.built = false;
        root_pid
    }

    pub fn logical_node_group(&self, root_pid: Pid) -> Option<&LogicalNodeGroup> {
        self.groups.get(&root_pid)
    }

    pub fn first_logical_node_group(&self) -> Option<&LogicalNodeGroup> {
        self.groups.values().next()
    }

    pub fn logical_node_groups(&self) -> impl Iterator<Item = &LogicalNodeGroup> {
        self.groups.values()
    }

    /// Lower every registered fragment that has not been lowered yet, in
    /// ascending root identifier order. Calling it again on a built plan
    /// does nothing.
    pub fn build(&mut self) -> PlanResult<()> {
        if self.built {
            return Ok(());
        }

        let pending: Vec<Pid> = self
            .groups
            .keys()
            .filter(|pid| !self.lowered.contains(pid))
            .copied()
            .collect();
        log::debug!("Building execution plan from {} fragment(s)", pending.len());

        for root_pid in pending {
            let Some(tree) = self.groups.get(&root_pid).and_then(|g| g.to_linked_node()) else {
                continue;
            };
            let fragment = ExecutionPlanBuilder::new(self).lower(tree)?;
            self.commit(root_pid, fragment);
        }
        // fragments lowered by a later build may have lower ids
        self.graph.sort_children(self.terminal.id());

        self.built = true;
        log::debug!(
            "Built execution plan: {} vertices, {} edges\n{}",
            self.vertices.len(),
            self.graph.edge_count(),
            self
        );
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    fn commit(&mut self, root_pid: Pid, fragment: LoweredFragment) {
        let LoweredFragment {
            vertices,
            edges,
            scans,
            has_join,
            has_union,
        } = fragment;

        self.vertices.extend(vertices);
        for (child, parent, edge_type) in edges {
            self.add_edge(child, parent, edge_type);
        }
        if !scans.is_empty() {
            let context = self.input_context.get_or_insert_with(InputContext::new);
            for scan in &scans {
                context.add_scan_node(scan);
            }
        }
        self.has_join_plan |= has_join;
        self.has_union_plan |= has_union;

        self.add_edge(root_pid, self.terminal.id(), EdgeType::Single);
        self.lowered.insert(root_pid);
    }

    pub(crate) fn add_edge(&mut self, child: Pid, parent: Pid, edge_type: EdgeType) {
        self.graph.add_edge(child, parent, edge_type);
    }

    pub(crate) fn mark_built(&mut self) {
        self.built = true;
    }

    pub fn allocator(&self) -> &Arc<PidAllocator> {
        &self.allocator
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn has_join_plan(&self) -> bool {
        self.has_join_plan
    }

    pub fn has_union_plan(&self) -> bool {
        self.has_union_plan
    }

    pub fn terminal(&self) -> &LogicalNode {
        &self.terminal
    }

    pub fn input_context(&self) -> Option<&InputContext> {
        self.input_context.as_ref()
    }

    pub fn vertex(&self, id: Pid) -> Option<&LogicalNode> {
        self.vertices.get(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &LogicalNode> {
        self.vertices.values()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn lookup(&self, id: Pid) -> PlanResult<&LogicalNode> {
        self.vertices
            .get(&id)
            .ok_or_else(|| PlanError::GraphLookup(format!("no vertex with id {}", id)))
    }

    /// Children of `parent` with their edge types: left before right, then
    /// single edges in insertion order
    pub(crate) fn ordered_children(&self, parent: Pid) -> Vec<(Pid, EdgeType)> {
        let mut children: Vec<(Pid, EdgeType)> = self
            .graph
            .children(parent)
            .iter()
            .filter_map(|child| self.graph.edge(*child, parent).map(|e| (*child, *e)))
            .collect();
        children.sort_by_key(|(_, edge_type)| edge_type.rank());
        children
    }

    pub fn children_of(&self, parent: Pid) -> PlanResult<Vec<&LogicalNode>> {
        self.lookup(parent)?;
        self.ordered_children(parent)
            .into_iter()
            .map(|(child, _)| self.lookup(child))
            .collect()
    }

    pub fn parents_of(&self, child: Pid) -> PlanResult<Vec<&LogicalNode>> {
        self.lookup(child)?;
        self.graph
            .parents(child)
            .iter()
            .map(|parent| self.lookup(*parent))
            .collect()
    }

    pub fn child(&self, parent: Pid, index: usize) -> PlanResult<&LogicalNode> {
        let (child, _) = self
            .ordered_children(parent)
            .get(index)
            .copied()
            .ok_or_else(|| {
                PlanError::GraphLookup(format!("vertex {} has no child #{}", parent, index))
            })?;
        self.lookup(child)
    }

    pub fn parent(&self, child: Pid, index: usize) -> PlanResult<&LogicalNode> {
        let parent = self.graph.parent(child, index).ok_or_else(|| {
            PlanError::GraphLookup(format!("vertex {} has no parent #{}", child, index))
        })?;
        self.lookup(parent)
    }

    /// The child of `parent` connected by an edge of `edge_type`
    pub fn child_with_type(&self, parent: Pid, edge_type: EdgeType) -> Option<&LogicalNode> {
        self.ordered_children(parent)
            .into_iter()
            .find(|(_, e)| *e == edge_type)
            .and_then(|(child, _)| self.vertices.get(&child))
    }

    pub fn child_count(&self, parent: Pid) -> usize {
        self.graph.child_count(parent)
    }

    pub fn parent_count(&self, child: Pid) -> usize {
        self.graph.parent_count(child)
    }

    pub fn edge_type(&self, child: Pid, parent: Pid) -> PlanResult<EdgeType> {
        self.graph.edge(child, parent).copied().ok_or_else(|| {
            PlanError::GraphLookup(format!("no edge from {} to {}", child, parent))
        })
    }

    /// Delete exactly one edge, returning its type
    pub fn remove_edge(&mut self, child: Pid, parent: Pid) -> PlanResult<EdgeType> {
        self.graph.remove_edge(child, parent).ok_or_else(|| {
            PlanError::GraphLookup(format!("no edge from {} to {}", child, parent))
        })
    }

    pub fn top_level_fragment_count(&self) -> usize {
        self.graph.child_count(self.terminal.id())
    }

    pub fn top_level_fragment_id(&self, index: usize) -> PlanResult<Pid> {
        self.graph
            .child(self.terminal.id(), index)
            .ok_or_else(|| PlanError::GraphLookup(format!("no top-level fragment #{}", index)))
    }

    /// Root of the `index`-th fragment connected to the terminal node
    pub fn top_level_fragment(&self, index: usize) -> PlanResult<&LogicalNode> {
        let id = self.top_level_fragment_id(index)?;
        self.lookup(id)
    }

    pub fn top_level_fragment_by_id(&self, id: Pid) -> Option<&LogicalNode> {
        self.graph
            .children(self.terminal.id())
            .iter()
            .find(|child| **child == id)
            .and_then(|child| self.vertices.get(child))
    }

    /// Output schema of the `index`-th top-level fragment
    pub fn out_schema(&self, index: usize) -> PlanResult<&Schema> {
        self.top_level_fragment(index).map(|node| node.output_schema())
    }

    /// Every vertex, children before parents, ending with the terminal node
    pub fn topological_order(&self) -> PlanResult<Vec<Pid>> {
        if self.graph.is_empty() {
            return Ok(vec![self.terminal.id()]);
        }
        self.graph.topological_order().map_err(PlanError::Cycle)
    }

    fn fmt_vertex(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: Pid,
        edge_type: Option<EdgeType>,
        depth: usize,
    ) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.vertices.get(&id) {
            Some(node) => write!(f, "{}{}", indent, node)?,
            None => write!(f, "{}<missing {}>", indent, id)?,
        }
        match edge_type {
            Some(edge_type) => writeln!(f, " [{:?}]", edge_type)?,
            None => writeln!(f)?,
        }
        for (child, edge_type) in self.ordered_children(id) {
            self.fmt_vertex(f, child, Some(edge_type), depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_vertex(f, self.terminal.id(), None, 0)
    }
}

/// Vertices, edges, scans and flags produced by lowering one fragment,
/// applied to the plan only once the whole fragment lowered cleanly
#[derive(Debug, Default)]
struct LoweredFragment {
    vertices: BTreeMap<Pid, LogicalNode>,
    edges: Vec<(Pid, Pid, EdgeType)>,
    scans: Vec<LogicalNode>,
    has_join: bool,
    has_union: bool,
}

/// Lowering visitor: moves a fragment tree into a `LoweredFragment`
struct ExecutionPlanBuilder<'a> {
    plan: &'a ExecutionPlan,
    fragment: LoweredFragment,
}

impl<'a> ExecutionPlanBuilder<'a> {
    fn new(plan: &'a ExecutionPlan) -> Self {
        Self {
            plan,
            fragment: LoweredFragment::default(),
        }
    }

    fn lower(mut self, tree: LogicalNode) -> PlanResult<LoweredFragment> {
        self.visit(tree)?;
        Ok(self.fragment)
    }

    fn visit(&mut self, mut node: LogicalNode) -> PlanResult<()> {
        let id = node.id();
        let kind = node.kind();

        if kind == NodeKind::Root {
            return Err(PlanError::Lowering {
                kind,
                id,
                reason: "a root node cannot appear inside a fragment".to_string(),
            });
        }
        if self.plan.vertices.contains_key(&id) || self.fragment.vertices.contains_key(&id) {
            return Err(PlanError::Lowering {
                kind,
                id,
                reason: "identifier is already used by another vertex".to_string(),
            });
        }
        if self.plan.config.trace_lowering {
            log::trace!("Lowering {}", node);
        }

        match node.detach_children() {
            Detached::Leaf => {
                if kind == NodeKind::Scan {
                    self.fragment.scans.push(node.clone());
                }
                self.fragment.vertices.insert(id, node);
                Ok(())
            }
            Detached::Unary(child) | Detached::SubPlan(child) => {
                self.fragment.vertices.insert(id, node);
                match child {
                    Some(child) => self.visit_child(child, id, EdgeType::Single),
                    None => Ok(()),
                }
            }
            Detached::Binary(left, right) => {
                match kind {
                    NodeKind::Join => self.fragment.has_join = true,
                    NodeKind::Union => self.fragment.has_union = true,
                    _ => {}
                }
                self.fragment.vertices.insert(id, node);
                if let Some(left) = left {
                    self.visit_child(left, id, EdgeType::Left)?;
                }
                if let Some(right) = right {
                    self.visit_child(right, id, EdgeType::Right)?;
                }
                Ok(())
            }
        }
    }

    fn visit_child(&mut self, child: LogicalNode, parent: Pid, edge_type: EdgeType) -> PlanResult<()> {
        self.fragment.edges.push((child.id(), parent, edge_type));
        self.visit(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::logical::JoinType;
    use crate::types::DataType;

    struct Nodes {
        allocator: Arc<PidAllocator>,
    }

    impl Nodes {
        fn scan(&self, table: &str) -> LogicalNode {
            LogicalNode::new(
                self.allocator.new_pid(),
                LogicalOp::Scan {
                    table: table.to_string(),
                    alias: None,
                },
                Schema::new().with_column(format!("{}_id", table), DataType::Int4),
            )
        }

        fn limit(&self, count: u64, child: LogicalNode) -> LogicalNode {
            let schema = child.output_schema().clone();
            LogicalNode::new(
                self.allocator.new_pid(),
                LogicalOp::Limit {
                    count,
                    child: Some(Box::new(child)),
                },
                schema,
            )
        }

        fn join(&self, left: LogicalNode, right: LogicalNode) -> LogicalNode {
            let schema = left.output_schema().merge(right.output_schema());
            LogicalNode::new(
                self.allocator.new_pid(),
                LogicalOp::Join {
                    join_type: JoinType::Inner,
                    predicate: None,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                },
                schema,
            )
        }

        fn root(&self, child: LogicalNode) -> LogicalNode {
            let schema = child.output_schema().clone();
            LogicalNode::new(
                self.allocator.new_pid(),
                LogicalOp::Root {
                    child: Some(Box::new(child)),
                },
                schema,
            )
        }
    }

    fn setup() -> (Nodes, ExecutionPlan) {
        let allocator = Arc::new(PidAllocator::new());
        let plan = ExecutionPlan::new(Arc::clone(&allocator));
        (Nodes { allocator }, plan)
    }

    #[test]
    fn test_group_captures_root_first_and_relinks() {
        let (nodes, _) = setup();
        let tree = nodes.limit(10, nodes.join(nodes.scan("a"), nodes.scan("b")));
        let expected = tree.clone();

        let group = LogicalNodeGroup::new(tree);
        let kinds: Vec<NodeKind> = group.nodes().iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Limit, NodeKind::Join, NodeKind::Scan, NodeKind::Scan]
        );
        assert!(group.nodes().iter().all(|n| !n.has_children()));
        assert_eq!(group.root_node().map(|n| n.id()), Some(group.id()));
        assert_eq!(group.leaf_node().and_then(|n| n.table_name()), Some("b"));

        assert_eq!(group.to_linked_node(), Some(expected));
    }

    #[test]
    fn test_add_plan_unwraps_root() {
        let (nodes, mut plan) = setup();
        let limit = nodes.limit(1, nodes.scan("a"));
        let limit_id = limit.id();

        let registered = plan.add_plan(nodes.root(limit));
        assert_eq!(registered, limit_id);
        assert!(plan.logical_node_group(limit_id).is_some());
    }

    #[test]
    fn test_nested_root_fails_lowering() {
        let (nodes, mut plan) = setup();
        let inner = nodes.root(nodes.scan("a"));
        let inner_id = inner.id();
        plan.add_plan(nodes.limit(5, inner));

        let err = plan.build().unwrap_err();
        assert_eq!(
            err,
            PlanError::Lowering {
                kind: NodeKind::Root,
                id: inner_id,
                reason: "a root node cannot appear inside a fragment".to_string(),
            }
        );
        assert!(!plan.is_built());
    }

    #[test]
    fn test_duplicate_identifier_fails_lowering() {
        let (nodes, mut plan) = setup();
        let scan = nodes.scan("a");
        let twin = scan.clone();
        plan.add_plan(nodes.join(scan, twin));

        let err = plan.build().unwrap_err();
        assert!(matches!(err, PlanError::Lowering { kind: NodeKind::Scan, .. }));
    }

    #[test]
    fn test_add_plan_after_build_lowers_only_new_fragment() {
        let (nodes, mut plan) = setup();
        plan.add_plan(nodes.limit(1, nodes.scan("a")));
        plan.build().unwrap();
        assert_eq!(plan.top_level_fragment_count(), 1);

        plan.add_plan(nodes.limit(2, nodes.scan("b")));
        assert!(!plan.is_built());
        plan.build().unwrap();

        assert_eq!(plan.top_level_fragment_count(), 2);
        assert_eq!(plan.input_context().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_failed_fragment_leaves_no_partial_graph() {
        let (nodes, mut plan) = setup();
        plan.add_plan(nodes.limit(1, nodes.scan("a")));
        let inner = nodes.root(nodes.scan("b"));
        let inner_id = inner.id();
        plan.add_plan(nodes.limit(2, nodes.join(nodes.scan("c"), inner)));

        let expected = PlanError::Lowering {
            kind: NodeKind::Root,
            id: inner_id,
            reason: "a root node cannot appear inside a fragment".to_string(),
        };
        assert_eq!(plan.build().unwrap_err(), expected);

        // only the terminal and the first fragment are present
        assert_eq!(plan.vertex_count(), 3);
        assert_eq!(plan.edge_count(), 2);
        assert_eq!(plan.top_level_fragment_count(), 1);
        assert!(!plan.has_join_plan());
        assert_eq!(plan.input_context().map(|c| c.len()), Some(1));
        for (child, parent, _) in plan.graph.edges() {
            assert!(plan.vertices.contains_key(&child));
            assert!(plan.vertices.contains_key(&parent));
        }

        // a retry reports the same cause
        assert_eq!(plan.build().unwrap_err(), expected);
        assert!(!plan.is_built());
        assert_eq!(plan.vertex_count(), 3);
    }

    #[test]
    fn test_add_plan_ignores_lowered_fragment() {
        let (nodes, mut plan) = setup();
        let first = nodes.limit(1, nodes.scan("a"));
        let first_id = first.id();
        let original = first.clone();
        plan.add_plan(first);
        plan.build().unwrap();

        let replacement = LogicalNode::new(
            first_id,
            LogicalOp::Limit {
                count: 99,
                child: Some(Box::new(nodes.scan("z"))),
            },
            Schema::new(),
        );
        assert_eq!(plan.add_plan(replacement), first_id);
        assert!(plan.is_built());
        assert_eq!(
            plan.logical_node_group(first_id).and_then(|g| g.to_linked_node()),
            Some(original)
        );

        plan.build().unwrap();
        assert_eq!(plan.top_level_fragment_count(), 1);
        assert_eq!(plan.vertex_count(), 3);
    }

    #[test]
    fn test_terminal_children_stay_ascending() {
        let (nodes, mut plan) = setup();
        let early = nodes.limit(1, nodes.scan("a"));
        let late = nodes.limit(2, nodes.scan("b"));
        let (early_id, late_id) = (early.id(), late.id());

        plan.add_plan(late);
        plan.build().unwrap();
        plan.add_plan(early);
        plan.build().unwrap();

        assert_eq!(plan.top_level_fragment_id(0).unwrap(), early_id);
        assert_eq!(plan.top_level_fragment_id(1).unwrap(), late_id);
    }

    #[test]
    fn test_clear_keeps_terminal() {
        let (nodes, mut plan) = setup();
        let terminal = plan.terminal().id();
        plan.add_plan(nodes.join(nodes.scan("a"), nodes.scan("b")));
        plan.build().unwrap();

        plan.clear();
        assert!(!plan.is_built());
        assert!(!plan.has_join_plan());
        assert!(plan.input_context().is_none());
        assert_eq!(plan.edge_count(), 0);
        assert_eq!(plan.vertex_count(), 1);
        assert_eq!(plan.terminal().id(), terminal);
        assert!(plan.first_logical_node_group().is_none());
    }

    #[test]
    fn test_lookup_errors() {
        let (nodes, mut plan) = setup();
        let scan = nodes.scan("a");
        let scan_id = scan.id();
        plan.add_plan(scan);
        plan.build().unwrap();

        let terminal = plan.terminal().id();
        assert!(matches!(
            plan.edge_type(terminal, scan_id),
            Err(PlanError::GraphLookup(_))
        ));
        assert!(matches!(
            plan.children_of(Pid::new(999)),
            Err(PlanError::GraphLookup(_))
        ));
        assert!(matches!(
            plan.top_level_fragment(1),
            Err(PlanError::GraphLookup(_))
        ));
        assert!(matches!(
            plan.remove_edge(terminal, scan_id),
            Err(PlanError::GraphLookup(_))
        ));
    }

    #[test]
    fn test_display_renders_from_terminal() {
        let (nodes, mut plan) = setup();
        plan.add_plan(nodes.join(nodes.scan("a"), nodes.scan("b")));
        plan.build().unwrap();

        let rendered = plan.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ROOT("));
        assert!(lines[1].trim_start().starts_with("JOIN("));
        assert!(lines[2].contains("table: a") && lines[2].ends_with("[Left]"));
        assert!(lines[3].contains("table: b") && lines[3].ends_with("[Right]"));
    }
}
