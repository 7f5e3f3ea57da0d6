// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Parser configuration

use serde::{Deserialize, Serialize};

/// Options controlling how a TAP stream is parsed
///
/// Deserializable from any serde format; missing fields take their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Treat increased indentation as the start of a subtest
    pub subtests_enabled: bool,
    /// Fail with `MissingPlan` when the stream has no plan
    pub plan_required: bool,
    /// Replace unparseable diagnostics blocks with a placeholder mapping
    pub lenient_diagnostics: bool,
    /// Require a trailing plan to be the last element of the stream
    pub check_plan_position: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            subtests_enabled: true,
            plan_required: true,
            lenient_diagnostics: false,
            check_plan_position: false,
        }
    }
}

impl ParserConfig {
    /// Configuration that ignores indentation and parses a single level
    #[must_use]
    pub fn flat() -> Self {
        Self::default().with_subtests(false)
    }

    /// Configuration that tolerates a missing plan and broken diagnostics
    #[must_use]
    pub fn lenient() -> Self {
        Self::default()
            .with_plan_required(false)
            .with_lenient_diagnostics(true)
    }

    /// Enable or disable subtest nesting
    #[must_use]
    pub fn with_subtests(mut self, enabled: bool) -> Self {
        self.subtests_enabled = enabled;
        self
    }

    /// Require or waive the plan
    #[must_use]
    pub fn with_plan_required(mut self, required: bool) -> Self {
        self.plan_required = required;
        self
    }

    /// Choose between placeholder and failure for malformed diagnostics
    #[must_use]
    pub fn with_lenient_diagnostics(mut self, lenient: bool) -> Self {
        self.lenient_diagnostics = lenient;
        self
    }

    /// Enable the trailing plan position check
    #[must_use]
    pub fn with_plan_position_check(mut self, check: bool) -> Self {
        self.check_plan_position = check;
        self
    }
}
