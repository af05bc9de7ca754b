// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan node identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a logical plan node, the only key the execution graph uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(u64);

impl Pid {
    pub fn new(raw: u64) -> Self {
        Pid(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints identifiers for one planning session.
///
/// Allocation is atomic, so a single allocator may be shared by statements
/// planned concurrently without handing out overlapping identifiers.
#[derive(Debug, Default)]
pub struct PidAllocator {
    next: AtomicU64,
}

impl PidAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Resume from a previously saved `state()`
    pub fn starting_at(state: u64) -> Self {
        Self {
            next: AtomicU64::new(state),
        }
    }

    pub fn new_pid(&self) -> Pid {
        Pid(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The next identifier that will be handed out
    pub fn state(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
