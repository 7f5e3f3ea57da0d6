// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Embedded diagnostics blocks
//!
//! A block opens with a `---` line and closes with a `...` line. The lines in
//! between are buffered verbatim and handed to a [`DiagnosticParser`], which
//! turns them into a [`Diagnostic`] mapping. The parser only decides when a
//! block opens and closes; the mapping grammar belongs to the injected
//! implementation ([`YamlDiagnosticParser`] by default).

use thiserror::Error;

use crate::grammar::leading_whitespace;
use crate::model::Diagnostic;

/// Key of the placeholder mapping used for unparseable blocks in lenient mode
pub const PLACEHOLDER_KEY: &str = "TAP processing error";

/// Value of the placeholder mapping used for unparseable blocks in lenient mode
pub const PLACEHOLDER_VALUE: &str = "could not parse original diagnostic YAML data";

/// Errors produced by a [`DiagnosticParser`]
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// The default YAML implementation rejected the block
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A custom implementation rejected the block
    #[error("Invalid diagnostic block: {message}")]
    Invalid {
        /// Description of the problem
        message: String,
    },
}

/// Turns the text of a diagnostics block into a mapping
pub trait DiagnosticParser {
    /// Parse the buffered block text
    ///
    /// # Errors
    ///
    /// Returns `DiagnosticError` if the text is not a valid mapping.
    fn parse(&self, text: &str) -> Result<Diagnostic, DiagnosticError>;
}

impl<F> DiagnosticParser for F
where
    F: Fn(&str) -> Result<Diagnostic, DiagnosticError>,
{
    fn parse(&self, text: &str) -> Result<Diagnostic, DiagnosticError> {
        self(text)
    }
}

/// Default diagnostics parser backed by `serde_yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDiagnosticParser;

impl DiagnosticParser for YamlDiagnosticParser {
    fn parse(&self, text: &str) -> Result<Diagnostic, DiagnosticError> {
        serde_yaml::from_str(text).map_err(DiagnosticError::from)
    }
}

/// Mapping attached in place of a block that failed to parse
#[must_use]
pub fn placeholder() -> Diagnostic {
    let mut map = Diagnostic::new();
    map.insert(PLACEHOLDER_KEY.to_string(), PLACEHOLDER_VALUE.into());
    map
}

/// Per-level block state: whether a block is open, its marker indentation
/// and the text collected so far
#[derive(Debug, Default)]
pub(crate) struct DiagnosticBlock {
    open: bool,
    indentation: String,
    buffer: String,
}

impl DiagnosticBlock {
    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Start a block whose `---` marker carried `indentation`
    pub(crate) fn open(&mut self, indentation: &str) {
        self.open = true;
        self.indentation.clear();
        self.indentation.push_str(indentation);
    }

    /// Feed a line of an open block; returns `true` if it was the closing marker
    ///
    /// The `...` marker closes the block only when it sits exactly at the
    /// opening indentation or shallower; deeper `...` lines are block content.
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        let closes = line.trim() == "..."
            && (line.strip_prefix(self.indentation.as_str()) == Some("...")
                || leading_whitespace(line).chars().count() < self.indentation.chars().count());

        if closes {
            self.open = false;
        } else {
            self.buffer.push_str(line);
            self.buffer.push('\n');
        }
        closes
    }

    /// Take the buffered text, if any, leaving the buffer empty
    pub(crate) fn take(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}
