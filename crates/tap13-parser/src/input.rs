// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Line delivery helpers
//!
//! Harnesses running in a terminal may interleave cursor show/hide escapes
//! (`ESC[?25l`, `ESC[?25h`) with their TAP output. These are removed before a
//! line is classified.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static CURSOR_CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[(?:\?25|25\?)[lh]").expect("cursor control regex should be valid")
});

/// Remove cursor visibility escape sequences from `line`
#[must_use]
pub fn strip_cursor_controls(line: &str) -> Cow<'_, str> {
    CURSOR_CONTROL_RE.replace_all(line, "")
}
