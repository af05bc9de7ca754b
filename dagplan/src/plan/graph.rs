// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Directed edge store keyed by vertex identifier pairs
//!
//! Edges point from child to parent. Both directions are indexed so that
//! children and parents of a vertex can be listed without scanning, and
//! both lists keep insertion order.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct DirectedGraph<V, E> {
    edges: HashMap<(V, V), E>,
    /// child -> parents
    parents: HashMap<V, Vec<V>>,
    /// parent -> children
    children: HashMap<V, Vec<V>>,
}

impl<V, E> Default for DirectedGraph<V, E> {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
        }
    }
}

impl<V, E> DirectedGraph<V, E>
where
    V: Copy + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `child -> parent`. An existing edge between the same pair is
    /// replaced in place and returned.
    pub fn add_edge(&mut self, child: V, parent: V, edge: E) -> Option<E> {
        if let Some(existing) = self.edges.get_mut(&(child, parent)) {
            return Some(std::mem::replace(existing, edge));
        }
        self.edges.insert((child, parent), edge);
        self.parents.entry(child).or_default().push(parent);
        self.children.entry(parent).or_default().push(child);
        None
    }

    pub fn remove_edge(&mut self, child: V, parent: V) -> Option<E> {
        let edge = self.edges.remove(&(child, parent))?;
        Self::unlink(&mut self.parents, child, parent);
        Self::unlink(&mut self.children, parent, child);
        Some(edge)
    }

    fn unlink(index: &mut HashMap<V, Vec<V>>, key: V, value: V) {
        if let Some(list) = index.get_mut(&key) {
            list.retain(|v| *v != value);
            if list.is_empty() {
                index.remove(&key);
            }
        }
    }

    pub fn edge(&self, child: V, parent: V) -> Option<&E> {
        self.edges.get(&(child, parent))
    }

    pub fn has_edge(&self, child: V, parent: V) -> bool {
        self.edges.contains_key(&(child, parent))
    }

    pub fn children(&self, parent: V) -> &[V] {
        self.children
            .get(&parent)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn parents(&self, child: V) -> &[V] {
        self.parents
            .get(&child)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, parent: V, index: usize) -> Option<V> {
        self.children(parent).get(index).copied()
    }

    pub fn parent(&self, child: V, index: usize) -> Option<V> {
        self.parents(child).get(index).copied()
    }

    pub fn child_count(&self, parent: V) -> usize {
        self.children(parent).len()
    }

    pub fn parent_count(&self, child: V) -> usize {
        self.parents(child).len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All edges as `(child, parent, edge)`, ordered by child and then by
    /// the order each child's parents were added
    pub fn edges(&self) -> Vec<(V, V, &E)> {
        let mut childs: Vec<V> = self.parents.keys().copied().collect();
        childs.sort();
        childs
            .into_iter()
            .flat_map(|child| {
                self.parents(child).iter().filter_map(move |parent| {
                    self.edges
                        .get(&(child, *parent))
                        .map(|edge| (child, *parent, edge))
                })
            })
            .collect()
    }

    /// Reorder the children of `parent` by vertex
    pub fn sort_children(&mut self, parent: V) {
        if let Some(children) = self.children.get_mut(&parent) {
            children.sort();
        }
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.parents.clear();
        self.children.clear();
    }

    /// Vertices ordered so every child precedes its parents. On a cycle the
    /// error carries one vertex on it.
    pub fn topological_order(&self) -> Result<Vec<V>, V> {
        let mut graph: DiGraphMap<V, ()> = DiGraphMap::new();
        for (child, parent) in self.edges.keys() {
            graph.add_edge(*child, *parent, ());
        }
        toposort(&graph, None).map_err(|cycle| cycle.node_id())
    }
}
