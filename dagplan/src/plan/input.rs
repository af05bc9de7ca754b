// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan leaves collected while lowering, used downstream to resolve the
//! fragments each scan reads

use crate::plan::logical::{LogicalNode, NodeKind};
use crate::plan::pid::Pid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputContext {
    scans: BTreeMap<Pid, LogicalNode>,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scan leaf. Non-scan nodes are ignored.
    pub fn add_scan_node(&mut self, node: &LogicalNode) {
        if node.kind() == NodeKind::Scan {
            self.scans.insert(node.id(), node.detached_copy());
        }
    }

    pub fn scan_nodes(&self) -> impl Iterator<Item = &LogicalNode> {
        self.scans.values()
    }

    pub fn scan_node(&self, id: Pid) -> Option<&LogicalNode> {
        self.scans.get(&id)
    }

    pub fn contains(&self, id: Pid) -> bool {
        self.scans.contains_key(&id)
    }

    /// Scanned table names in identifier order
    pub fn table_names(&self) -> Vec<&str> {
        self.scans.values().filter_map(|n| n.table_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    /// Same scans, compared by content rather than identifier
    pub fn same_content(&self, other: &InputContext) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut unmatched: Vec<&LogicalNode> = other.scan_nodes().collect();
        for scan in self.scan_nodes() {
            match unmatched.iter().position(|o| o.same_content(scan)) {
                Some(idx) => {
                    unmatched.swap_remove(idx);
                }
                None => return false,
            }
        }
        true
    }
}
