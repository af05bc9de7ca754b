// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structural equality of execution plans
//!
//! Two plans are walked in lockstep from each pair of top-level fragments.
//! `Identity` matches vertices by identifier and is only meaningful when
//! both plans come from the same allocator, such as a plan and its decoded
//! copy. `Content` matches vertices by kind, output schema and operator
//! payload, along with the type of each edge, so independently built plans
//! compare equal when they have the same shape.

use crate::plan::execution::ExecutionPlan;
use crate::plan::input::InputContext;
use crate::plan::logical::LogicalNode;
use crate::plan::pid::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    Identity,
    #[default]
    Content,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanComparator {
    mode: CompareMode,
}

impl PlanComparator {
    pub fn new(mode: CompareMode) -> Self {
        Self { mode }
    }

    pub fn equals(&self, a: &ExecutionPlan, b: &ExecutionPlan) -> bool {
        if a.has_join_plan() != b.has_join_plan() || a.has_union_plan() != b.has_union_plan() {
            return false;
        }
        if !self.same_node(a.terminal(), b.terminal()) {
            return false;
        }
        if !self.same_inputs(a.input_context(), b.input_context()) {
            return false;
        }

        let fragments = a.top_level_fragment_count();
        if fragments != b.top_level_fragment_count() {
            return false;
        }

        (0..fragments).all(|i| {
            match (a.top_level_fragment_id(i), b.top_level_fragment_id(i)) {
                (Ok(x), Ok(y)) => self.same_fragment(a, x, b, y),
                _ => false,
            }
        })
    }

    fn same_fragment(&self, a: &ExecutionPlan, a_root: Pid, b: &ExecutionPlan, b_root: Pid) -> bool {
        let mut stack = vec![(a_root, b_root)];

        while let Some((x, y)) = stack.pop() {
            match (a.vertex(x), b.vertex(y)) {
                (Some(left), Some(right)) if self.same_node(left, right) => {}
                _ => return false,
            }

            let x_children = a.ordered_children(x);
            let y_children = b.ordered_children(y);
            if x_children.len() != y_children.len() {
                return false;
            }

            for ((xc, xe), (yc, ye)) in x_children.into_iter().zip(y_children).rev() {
                if self.mode == CompareMode::Content && xe != ye {
                    return false;
                }
                stack.push((xc, yc));
            }
        }
        true
    }

    fn same_node(&self, a: &LogicalNode, b: &LogicalNode) -> bool {
        match self.mode {
            CompareMode::Identity => a.id() == b.id(),
            CompareMode::Content => a.same_content(b),
        }
    }

    fn same_inputs(&self, a: Option<&InputContext>, b: Option<&InputContext>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => match self.mode {
                CompareMode::Identity => x == y,
                CompareMode::Content => x.same_content(y),
            },
            _ => false,
        }
    }
}

impl ExecutionPlan {
    pub fn structurally_equals(&self, other: &ExecutionPlan, mode: CompareMode) -> bool {
        PlanComparator::new(mode).equals(self, other)
    }
}

impl PartialEq for ExecutionPlan {
    fn eq(&self, other: &Self) -> bool {
        PlanComparator::default().equals(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalNode, EvalType};
    use crate::plan::context::PlanContext;
    use crate::plan::logical::JoinType;
    use crate::types::{DataType, Schema};

    fn join_plan(ctx: &PlanContext, right_table: &str) -> ExecutionPlan {
        let schema = Schema::new().with_column("id", DataType::Int4);
        let predicate = ctx
            .binary(
                EvalType::Equal,
                EvalNode::field("a.id", DataType::Int4),
                EvalNode::field("b.id", DataType::Int4),
            )
            .unwrap();
        let tree = ctx.join(
            JoinType::Inner,
            Some(predicate),
            ctx.scan("a", schema.clone()),
            ctx.scan(right_table, schema),
        );
        let mut plan = ctx.new_execution_plan();
        plan.add_plan(tree);
        plan.build().unwrap();
        plan
    }

    #[test]
    fn test_independent_plans_compare_by_content() {
        let first = join_plan(&PlanContext::new(), "b");
        let second = join_plan(&PlanContext::new(), "b");
        let other = join_plan(&PlanContext::new(), "c");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_identity_mode_needs_shared_ids() {
        let ctx = PlanContext::new();
        let first = join_plan(&ctx, "b");
        let second = join_plan(&ctx, "b");

        assert!(first.structurally_equals(&first.clone(), CompareMode::Identity));
        assert!(!first.structurally_equals(&second, CompareMode::Identity));
        assert!(first.structurally_equals(&second, CompareMode::Content));
    }

    #[test]
    fn test_swapped_join_inputs_differ() {
        let ctx = PlanContext::new();
        let plan = join_plan(&ctx, "b");
        let mut swapped = plan.clone();

        let join = swapped.top_level_fragment_id(0).unwrap();
        let children: Vec<Pid> = swapped.ordered_children(join).into_iter().map(|(c, _)| c).collect();
        for child in &children {
            swapped.remove_edge(*child, join).unwrap();
        }
        swapped.add_edge(children[0], join, crate::plan::execution::EdgeType::Right);
        swapped.add_edge(children[1], join, crate::plan::execution::EdgeType::Left);

        assert_ne!(plan, swapped);
    }
}
