// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TAP 13 stream parsing
//!
//! The parser consumes a stream one line at a time and builds a
//! [`ResultTree`]. Indentation drives nesting: a line indented deeper than the
//! current level opens a subtest level, a shallower line closes levels until
//! it fits. A closed level becomes the subtest of the test result that
//! preceded it, or is held as a *loose* subtest until the next test result at
//! the outer level claims it.
//!
//! # Example
//!
//! ```
//! use tap13_parser::{ParserConfig, parse_str};
//!
//! let tap = "TAP version 13\n1..2\nok 1 - first\nnot ok 2 - second\n";
//! let tree = parse_str(tap, ParserConfig::default()).unwrap();
//! assert_eq!(tree.number_of_test_results(), 2);
//! assert!(tree.contains_not_ok());
//! ```

use std::io::BufRead;

use tracing::{debug, trace, warn};

use crate::config::ParserConfig;
use crate::diagnostics::{self, DiagnosticBlock, DiagnosticParser, YamlDiagnosticParser};
use crate::error::ParseError;
use crate::grammar::{self, Classified, Element};
use crate::input::strip_cursor_controls;
use crate::model::{Diagnostic, ResultTree, TapLine, TestResult, Text};

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse a complete TAP document held in memory
///
/// # Errors
///
/// Returns the first `ParseError` encountered; no partial tree is returned.
pub fn parse_str(input: &str, config: ParserConfig) -> Result<ResultTree, ParseError> {
    let mut parser = TapParser::new(config);
    for line in input.lines() {
        parser.process_line(line)?;
    }
    parser.finish()
}

/// Parse a TAP document from a buffered reader
///
/// # Errors
///
/// Returns `ParseError::Io` if reading fails, or the first structural error.
pub fn parse_reader<R: BufRead>(reader: R, config: ParserConfig) -> Result<ResultTree, ParseError> {
    let mut parser = TapParser::new(config);
    for line in reader.lines() {
        parser.process_line(&line?)?;
    }
    parser.finish()
}

// ============================================================================
// Per-level state
// ============================================================================

/// The element a following diagnostics block or comment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastElement {
    Header,
    Plan,
    Footer,
    /// Index into the tree's line sequence
    Line(usize),
}

/// Parser state for one indentation level
#[derive(Debug)]
struct Frame {
    indentation: usize,
    tree: ResultTree,
    diagnostics: DiagnosticBlock,
    last_element: Option<LastElement>,
    first_line: bool,
    plan_before_results: bool,
    /// Test results recorded at this level
    results: usize,
    bail_outs: usize,
    /// Index of the test result in the parent level that owns this tree
    owner: Option<usize>,
    /// Finished child tree waiting for the next test result at this level
    loose_subtest: Option<ResultTree>,
}

impl Frame {
    fn new(indentation: usize, owner: Option<usize>) -> Self {
        Self {
            indentation,
            tree: ResultTree::new(),
            diagnostics: DiagnosticBlock::default(),
            last_element: None,
            first_line: true,
            plan_before_results: false,
            results: 0,
            bail_outs: 0,
            owner,
            loose_subtest: None,
        }
    }

    /// Index of the last element if it is a test result without a subtest
    fn subtest_owner_candidate(&self) -> Option<usize> {
        match self.last_element {
            Some(LastElement::Line(idx)) => match self.tree.lines.get(idx) {
                Some(TapLine::TestResult(result)) if result.subtest.is_none() => Some(idx),
                _ => None,
            },
            _ => None,
        }
    }

    /// Number the next unnumbered result at this level receives
    fn next_test_number(&self) -> u32 {
        u32::try_from(self.results)
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    fn push_line(&mut self, line: TapLine) -> usize {
        self.tree.lines.push(line);
        self.tree.lines.len() - 1
    }

    fn set_diagnostic(&mut self, target: LastElement, diagnostic: Diagnostic) {
        let slot = match target {
            LastElement::Header => self.tree.header.as_mut().map(|h| &mut h.diagnostic),
            LastElement::Plan => self.tree.plan.as_mut().map(|p| &mut p.diagnostic),
            LastElement::Footer => self.tree.footer.as_mut().map(|f| &mut f.diagnostic),
            LastElement::Line(idx) => match self.tree.lines.get_mut(idx) {
                Some(TapLine::TestResult(result)) => Some(&mut result.diagnostic),
                Some(TapLine::BailOut(bail_out)) => Some(&mut bail_out.diagnostic),
                Some(TapLine::Text(text)) => Some(&mut text.diagnostic),
                Some(TapLine::Comment(_)) | None => None,
            },
        };
        if let Some(slot) = slot {
            *slot = Some(diagnostic);
        }
    }

    /// Parse any buffered diagnostics and attach them to the last element
    fn flush_diagnostics<D: DiagnosticParser>(
        &mut self,
        parser: &D,
        lenient: bool,
        line: usize,
    ) -> Result<(), ParseError> {
        let Some(text) = self.diagnostics.take() else {
            return Ok(());
        };
        let Some(target) = self.last_element else {
            return Err(ParseError::DanglingDiagnostic { line });
        };

        let diagnostic = match parser.parse(&text) {
            Ok(diagnostic) => diagnostic,
            Err(error) if lenient => {
                warn!(line, %error, "Replacing malformed diagnostics block with placeholder");
                diagnostics::placeholder()
            }
            Err(source) => {
                return Err(ParseError::MalformedDiagnostic {
                    line,
                    content: text,
                    source,
                });
            }
        };

        debug!(line, ?target, keys = diagnostic.len(), "Attaching diagnostics");
        self.set_diagnostic(target, diagnostic);
        Ok(())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// A line-at-a-time TAP 13 parser
///
/// Each instance parses exactly one stream: [`TapParser::finish`] consumes it.
pub struct TapParser<D = YamlDiagnosticParser> {
    config: ParserConfig,
    diagnostic_parser: D,
    root: Frame,
    /// Open subtest levels, innermost last
    stack: Vec<Frame>,
    /// Smallest indentation of any classified line so far
    base_indentation: usize,
    line_number: usize,
}

impl TapParser<YamlDiagnosticParser> {
    /// Create a parser using the YAML diagnostics parser
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self::with_diagnostic_parser(config, YamlDiagnosticParser)
    }
}

impl Default for TapParser<YamlDiagnosticParser> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<D: DiagnosticParser> TapParser<D> {
    /// Create a parser with a custom diagnostics parser
    #[must_use]
    pub fn with_diagnostic_parser(config: ParserConfig, diagnostic_parser: D) -> Self {
        Self {
            config,
            diagnostic_parser,
            root: Frame::new(0, None),
            stack: Vec::new(),
            base_indentation: usize::MAX,
            line_number: 0,
        }
    }

    /// Number of open subtest levels
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Process a single line of input
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the line violates a structural rule.
    pub fn process_line(&mut self, raw: &str) -> Result<(), ParseError> {
        self.line_number += 1;
        if raw.is_empty() {
            return Ok(());
        }
        let line = strip_cursor_controls(raw);
        if line.is_empty() {
            return Ok(());
        }

        if self.current().diagnostics.is_open() {
            if self.current_mut().diagnostics.feed(&line) {
                self.flush_current()?;
            }
            return Ok(());
        }

        match grammar::classify(&line) {
            Some(classified) => self.process_element(classified, &line),
            None => self.process_text(&line),
        }
    }

    /// Finish the stream and return the document tree
    ///
    /// # Errors
    ///
    /// Returns `MalformedDiagnostic` or `DanglingDiagnostic` for a pending
    /// block, `MissingPlan` if a plan is required but absent, and
    /// `MisplacedPlan` if the position check is enabled and fails.
    pub fn finish(mut self) -> Result<ResultTree, ParseError> {
        self.flush_current()?;

        while self
            .stack
            .last()
            .is_some_and(|top| top.indentation > self.base_indentation)
        {
            self.close_level();
        }

        // A uniformly indented stream leaves its document level on the stack.
        // Anything but text at the root means the root is the document.
        let root = &self.root.tree;
        let root_is_text_only = root.header.is_none()
            && root.plan.is_none()
            && root.footer.is_none()
            && root.lines.iter().all(|line| matches!(line, TapLine::Text(_)));
        if !root_is_text_only {
            while !self.stack.is_empty() {
                self.close_level();
            }
        }

        let document = match self.stack.pop() {
            Some(frame) => {
                if !self.root.tree.lines.is_empty() {
                    debug!(
                        lines = self.root.tree.lines.len(),
                        "Dropping unindented text outside the document level"
                    );
                }
                frame
            }
            None => self.root,
        };

        if document.loose_subtest.is_some() {
            warn!("Discarding subtest that no test result claimed");
        }

        if self.config.plan_required && document.tree.plan.is_none() {
            return Err(ParseError::MissingPlan);
        }
        if self.config.check_plan_position
            && document.tree.plan.is_some()
            && !document.plan_before_results
            && document.last_element != Some(LastElement::Plan)
        {
            return Err(ParseError::MisplacedPlan);
        }

        Ok(document.tree)
    }

    fn current(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn current_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn flush_current(&mut self) -> Result<(), ParseError> {
        let lenient = self.config.lenient_diagnostics;
        let line = self.line_number;
        let frame = self.stack.last_mut().unwrap_or(&mut self.root);
        frame.flush_diagnostics(&self.diagnostic_parser, lenient, line)
    }

    fn process_text(&mut self, line: &str) -> Result<(), ParseError> {
        if line.trim() == "---" {
            let indentation = grammar::leading_whitespace(line);
            // No base exists until the first classified line
            if self.base_indentation != usize::MAX
                && indentation.chars().count() < self.base_indentation
            {
                return Err(ParseError::Indentation {
                    line: self.line_number,
                    content: line.to_string(),
                });
            }
            trace!(line = self.line_number, "Opening diagnostics block");
            self.current_mut().diagnostics.open(indentation);
            return Ok(());
        }

        trace!(line = self.line_number, "Unparsed text");
        let frame = self.current_mut();
        let idx = frame.push_line(TapLine::Text(Text::new(line)));
        frame.last_element = Some(LastElement::Line(idx));
        Ok(())
    }

    fn process_element(&mut self, classified: Classified, line: &str) -> Result<(), ParseError> {
        let Classified {
            indentation,
            element,
        } = classified;
        trace!(line = self.line_number, indentation, "Classified line");

        self.base_indentation = self.base_indentation.min(indentation);
        if self.config.subtests_enabled {
            self.adjust_nesting(indentation);
        }

        let line_number = self.line_number;
        let last = match element {
            Element::Header(header) => {
                let frame = self.current_mut();
                if frame.tree.header.is_some() {
                    return Err(ParseError::DuplicateHeader {
                        line: line_number,
                        content: line.to_string(),
                    });
                }
                if !frame.first_line {
                    return Err(ParseError::MisplacedHeader {
                        line: line_number,
                        content: line.to_string(),
                    });
                }
                frame.tree.header = Some(header);
                LastElement::Header
            }
            Element::Plan(plan) => {
                let frame = self.current_mut();
                if frame.tree.plan.is_none() {
                    frame.tree.plan = Some(plan);
                } else if !plan.is_sentinel() {
                    return Err(ParseError::DuplicatePlan {
                        line: line_number,
                        content: line.to_string(),
                    });
                }
                if frame.results == 0 && frame.bail_outs == 0 {
                    frame.plan_before_results = true;
                }
                LastElement::Plan
            }
            Element::TestResult(result) => {
                self.flush_current()?;
                match self.add_test_result(result) {
                    Some(idx) => LastElement::Line(idx),
                    None => return Ok(()),
                }
            }
            Element::BailOut(bail_out) => {
                self.flush_current()?;
                let frame = self.current_mut();
                frame.bail_outs += 1;
                LastElement::Line(frame.push_line(TapLine::BailOut(bail_out)))
            }
            Element::Footer(footer) => {
                self.current_mut().tree.footer = Some(footer);
                LastElement::Footer
            }
            Element::Comment(comment) => {
                let frame = self.current_mut();
                frame.push_line(TapLine::Comment(comment.clone()));
                if let Some(LastElement::Line(idx)) = frame.last_element {
                    match frame.tree.lines.get_mut(idx) {
                        Some(TapLine::TestResult(result)) => result.comments.push(comment),
                        Some(TapLine::BailOut(bail_out)) => bail_out.comments.push(comment),
                        _ => {}
                    }
                }
                return Ok(());
            }
        };

        let frame = self.current_mut();
        frame.first_line = false;
        frame.last_element = Some(last);
        Ok(())
    }

    /// Append a test result, or drop it if it is an end-of-testing marker
    fn add_test_result(&mut self, mut result: TestResult) -> Option<usize> {
        let line = self.line_number;
        let frame = self.current_mut();

        if result.number == 0 {
            if let Some(plan) = &frame.tree.plan {
                if !frame.plan_before_results
                    || usize::try_from(plan.last_test_number)
                        .is_ok_and(|last| last == frame.results)
                {
                    debug!(line, "Ignoring end-of-testing marker");
                    return None;
                }
            }
            result.number = frame.next_test_number();
        }

        if let Some(subtest) = frame.loose_subtest.take() {
            debug!(line, number = result.number, "Attaching loose subtest");
            result.subtest = Some(subtest);
        }
        frame.results += 1;
        Some(frame.push_line(TapLine::TestResult(result)))
    }

    fn adjust_nesting(&mut self, indentation: usize) {
        let current = self.current().indentation;

        if indentation > current {
            let owner = self.current().subtest_owner_candidate();
            debug!(
                line = self.line_number,
                indentation,
                attached = owner.is_some(),
                "Opening subtest level"
            );
            self.stack.push(Frame::new(indentation, owner));
        } else if indentation < current {
            while self
                .stack
                .last()
                .is_some_and(|top| top.indentation > indentation)
            {
                self.close_level();
            }

            // Landing between two levels opens a level at the new indentation;
            // the tree just closed stays loose for the next result there
            if indentation > self.current().indentation {
                let parent = self.current_mut();
                let owner = parent.subtest_owner_candidate();
                let loose_subtest = parent.loose_subtest.take();
                debug!(
                    line = self.line_number,
                    indentation,
                    attached = owner.is_some(),
                    "Opening intermediate level"
                );
                let mut frame = Frame::new(indentation, owner);
                frame.loose_subtest = loose_subtest;
                self.stack.push(frame);
            }
        }
    }

    /// Pop the innermost level and hand its tree to the level below
    fn close_level(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let Frame {
            indentation,
            tree,
            owner,
            loose_subtest,
            ..
        } = frame;

        if loose_subtest.is_some() {
            warn!(indentation, "Discarding subtest that no test result claimed");
        }

        let parent = self.current_mut();
        match owner {
            Some(idx) => {
                if let Some(TapLine::TestResult(result)) = parent.tree.lines.get_mut(idx) {
                    debug!(indentation, number = result.number, "Attaching subtest");
                    result.subtest = Some(tree);
                }
            }
            None => {
                debug!(indentation, "Holding loose subtest");
                parent.loose_subtest = Some(tree);
            }
        }
    }
}
