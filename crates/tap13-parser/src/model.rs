// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TAP result tree types
//!
//! A [`ResultTree`] is produced for the whole stream and, recursively, for
//! every subtest. Test results, bail outs, comments and unparsed text are kept
//! in a single ordered line sequence; the typed views are filters over it.

use serde::{Deserialize, Serialize};

/// Structured diagnostics attached to an element
///
/// String keys mapping to arbitrarily nested scalar, sequence or mapping values.
pub type Diagnostic = serde_json::Map<String, serde_json::Value>;

/// Outcome of a single test line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// `ok`
    Ok,
    /// `not ok`
    NotOk,
}

/// Kind of a test directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectiveKind {
    /// `# SKIP`
    Skip,
    /// `# TODO`
    Todo,
}

/// A `# SKIP` or `# TODO` annotation on a test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Directive keyword
    pub kind: DirectiveKind,
    /// Free-text reason following the keyword (may be empty)
    pub reason: String,
}

/// A `#` comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text without the leading `#`
    pub text: String,
}

impl Comment {
    /// Create a comment from its text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// `TAP version N`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Protocol version
    pub version: u32,
    /// Trailing comment
    pub comment: Option<Comment>,
    /// Diagnostics block following the header
    pub diagnostic: Option<Diagnostic>,
}

/// `M..N`, optionally with a skip reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// First test number (conventionally 1)
    pub initial_test_number: u32,
    /// Last test number
    pub last_test_number: u32,
    /// Reason when the whole plan is skipped
    pub skip: Option<String>,
    /// Trailing comment
    pub comment: Option<Comment>,
    /// Diagnostics block following the plan
    pub diagnostic: Option<Diagnostic>,
}

impl Plan {
    /// Create a plan covering `initial..=last`
    #[must_use]
    pub fn new(initial_test_number: u32, last_test_number: u32) -> Self {
        Self {
            initial_test_number,
            last_test_number,
            skip: None,
            comment: None,
            diagnostic: None,
        }
    }

    /// Whether this is the `1..0` form, which may repeat without being a duplicate
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.initial_test_number == 1 && self.last_test_number == 0
    }

    /// Number of tests the plan announces, saturating at `u32::MAX`
    #[must_use]
    pub fn expected_count(&self) -> u32 {
        let count = (u64::from(self.last_test_number) + 1)
            .saturating_sub(u64::from(self.initial_test_number));
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// An `ok` / `not ok` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Outcome
    pub status: Status,
    /// Test number (assigned sequentially when the line omits it)
    pub number: u32,
    /// Description with any leading `-` separator removed
    pub description: String,
    /// SKIP / TODO annotation
    pub directive: Option<Directive>,
    /// Trailing comment on the same line
    pub comment: Option<Comment>,
    /// Diagnostics block following the result
    pub diagnostic: Option<Diagnostic>,
    /// Nested result tree
    pub subtest: Option<ResultTree>,
    /// Comment lines that followed this result
    pub comments: Vec<Comment>,
}

impl TestResult {
    /// Create a result with no description or annotations
    #[must_use]
    pub fn new(status: Status, number: u32) -> Self {
        Self {
            status,
            number,
            description: String::new(),
            directive: None,
            comment: None,
            diagnostic: None,
            subtest: None,
            comments: Vec::new(),
        }
    }

    /// Check if the line reported `ok`
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Ok
    }

    /// Check if the line reported `not ok`
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status == Status::NotOk
    }

    /// Check if the result carries a SKIP directive
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.directive_kind() == Some(DirectiveKind::Skip)
    }

    /// Check if the result carries a TODO directive
    #[must_use]
    pub fn is_todo(&self) -> bool {
        self.directive_kind() == Some(DirectiveKind::Todo)
    }

    fn directive_kind(&self) -> Option<DirectiveKind> {
        self.directive.as_ref().map(|d| d.kind)
    }
}

/// `Bail out!`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BailOut {
    /// Reason following the marker (may be empty)
    pub reason: String,
    /// Trailing comment on the same line
    pub comment: Option<Comment>,
    /// Diagnostics block following the bail out
    pub diagnostic: Option<Diagnostic>,
    /// Comment lines that followed this bail out
    pub comments: Vec<Comment>,
}

/// Closing `TAP ...` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    /// Text after `TAP`
    pub text: String,
    /// Trailing comment
    pub comment: Option<Comment>,
    /// Diagnostics block following the footer
    pub diagnostic: Option<Diagnostic>,
}

/// A line that matched no TAP production, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// The raw line
    pub value: String,
    /// Number of leading whitespace characters
    pub indentation: usize,
    /// The leading whitespace itself
    pub indentation_string: String,
    /// Diagnostics block following the text
    pub diagnostic: Option<Diagnostic>,
}

impl Text {
    /// Wrap a raw line, measuring its indentation
    #[must_use]
    pub fn new(value: &str) -> Self {
        let indentation_string = crate::grammar::leading_whitespace(value).to_string();
        Self {
            value: value.to_string(),
            indentation: indentation_string.chars().count(),
            indentation_string,
            diagnostic: None,
        }
    }
}

/// One entry of a tree's ordered line sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TapLine {
    /// `ok` / `not ok`
    TestResult(TestResult),
    /// `Bail out!`
    BailOut(BailOut),
    /// `# ...`
    Comment(Comment),
    /// Unparsed text
    Text(Text),
}

/// Pass/fail counts for one tree level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Number of test results
    pub total: usize,
    /// Results reported `ok`
    pub passed: usize,
    /// Results reported `not ok`
    pub failed: usize,
    /// Results with a SKIP directive
    pub skipped: usize,
    /// Results with a TODO directive
    pub todo: usize,
    /// Number of bail outs
    pub bail_outs: usize,
}

/// Parsed content of one nesting level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTree {
    /// `TAP version N`
    pub header: Option<Header>,
    /// `M..N`
    pub plan: Option<Plan>,
    /// Every result, bail out, comment and text line in order
    pub lines: Vec<TapLine>,
    /// Closing `TAP` line
    pub footer: Option<Footer>,
}

impl ResultTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test results in textual order
    pub fn test_results(&self) -> impl Iterator<Item = &TestResult> {
        self.lines.iter().filter_map(|line| match line {
            TapLine::TestResult(result) => Some(result),
            _ => None,
        })
    }

    /// Bail outs in textual order
    pub fn bail_outs(&self) -> impl Iterator<Item = &BailOut> {
        self.lines.iter().filter_map(|line| match line {
            TapLine::BailOut(bail_out) => Some(bail_out),
            _ => None,
        })
    }

    /// Comment lines in textual order
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.lines.iter().filter_map(|line| match line {
            TapLine::Comment(comment) => Some(comment),
            _ => None,
        })
    }

    /// Find the first result carrying `number`
    #[must_use]
    pub fn test_result(&self, number: u32) -> Option<&TestResult> {
        self.test_results().find(|r| r.number == number)
    }

    /// Number of entries in the line sequence
    #[must_use]
    pub fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    /// Number of test results
    #[must_use]
    pub fn number_of_test_results(&self) -> usize {
        self.test_results().count()
    }

    /// Number of bail outs
    #[must_use]
    pub fn number_of_bail_outs(&self) -> usize {
        self.bail_outs().count()
    }

    /// Number of comment lines
    #[must_use]
    pub fn number_of_comments(&self) -> usize {
        self.comments().count()
    }

    /// Number the next unnumbered result would receive
    #[must_use]
    pub fn next_test_number(&self) -> u32 {
        u32::try_from(self.number_of_test_results())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Check if any result reported `ok`
    #[must_use]
    pub fn contains_ok(&self) -> bool {
        self.test_results().any(TestResult::passed)
    }

    /// Check if any result reported `not ok`
    #[must_use]
    pub fn contains_not_ok(&self) -> bool {
        self.test_results().any(TestResult::failed)
    }

    /// Check if the stream bailed out
    #[must_use]
    pub fn contains_bail_out(&self) -> bool {
        self.bail_outs().next().is_some()
    }

    /// Results that failed and are not marked TODO
    #[must_use]
    pub fn failing_tests(&self) -> Vec<&TestResult> {
        self.test_results()
            .filter(|r| r.failed() && !r.is_todo())
            .collect()
    }

    /// Check that nothing failed (TODO failures excepted) and nothing bailed out
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failing_tests().is_empty() && !self.contains_bail_out()
    }

    /// Count outcomes at this level
    #[must_use]
    pub fn summary(&self) -> TestSummary {
        let mut summary = TestSummary {
            bail_outs: self.number_of_bail_outs(),
            ..TestSummary::default()
        };
        for result in self.test_results() {
            summary.total += 1;
            if result.passed() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            if result.is_skipped() {
                summary.skipped += 1;
            }
            if result.is_todo() {
                summary.todo += 1;
            }
        }
        summary
    }
}
