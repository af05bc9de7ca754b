// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planner configuration

use crate::types::PromotionPolicy;
use serde::{Deserialize, Serialize};

/// Settings shared by one planning session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// How binary expressions treat operand types outside the numeric
    /// promotion lattice
    pub promotion: PromotionPolicy,

    /// Emit a trace record for every node lowered into an execution plan
    pub trace_lowering: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            promotion: PromotionPolicy::Strict,
            trace_lowering: false,
        }
    }
}

impl PlannerConfig {
    /// Configuration that keeps the legacy left-operand type fallback
    pub fn permissive() -> Self {
        Self {
            promotion: PromotionPolicy::Permissive,
            ..Self::default()
        }
    }

    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let config = PlannerConfig::default();
        assert_eq!(config.promotion, PromotionPolicy::Strict);
        assert!(!config.trace_lowering);
    }

    #[test]
    fn test_partial_json_document() {
        let config = PlannerConfig::from_json(r#"{ "promotion": "Permissive" }"#).unwrap();
        assert_eq!(config, PlannerConfig::permissive());

        let config = PlannerConfig::from_json(r#"{ "trace_lowering": true }"#).unwrap();
        assert_eq!(config.promotion, PromotionPolicy::Strict);
        assert!(config.trace_lowering);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(PlannerConfig::from_json(r#"{ "promotion": "Lenient" }"#).is_err());
    }
}
