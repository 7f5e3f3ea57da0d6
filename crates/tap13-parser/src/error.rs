// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for tap13-parser

use thiserror::Error;

use crate::diagnostics::DiagnosticError;

/// Errors that abort a TAP parse
///
/// Line numbers are 1-based positions in the input stream, counting every
/// line delivered to the parser (empty lines included).
#[derive(Debug, Error)]
pub enum ParseError {
    /// A second Header was found at the same nesting level
    #[error("Duplicated TAP Header found at line {line}: {content}")]
    DuplicateHeader {
        /// Line number of the offending Header
        line: usize,
        /// Raw content of the offending line
        content: String,
    },

    /// A Header appeared after another non-comment element
    #[error(
        "Invalid position of TAP Header at line {line}: it must be the first element \
         (apart from comments) in the TAP stream: {content}"
    )]
    MisplacedHeader {
        /// Line number of the offending Header
        line: usize,
        /// Raw content of the offending line
        content: String,
    },

    /// A second, non-sentinel Plan was found at the same nesting level
    #[error("Duplicated TAP Plan found at line {line}: {content}")]
    DuplicatePlan {
        /// Line number of the offending Plan
        line: usize,
        /// Raw content of the offending line
        content: String,
    },

    /// A diagnostics block opened shallower than the base indentation
    #[error("Invalid indentation of diagnostics block at line {line}: {content}")]
    Indentation {
        /// Line number of the `---` marker
        line: usize,
        /// Raw content of the offending line
        content: String,
    },

    /// A diagnostics block closed with nothing to attach to
    #[error("Found diagnostic information without a previous TAP element at line {line}")]
    DanglingDiagnostic {
        /// Line number where the block was flushed
        line: usize,
    },

    /// The embedded mapping block could not be parsed
    #[error("Error parsing diagnostics block ending at line {line} [{content}]: {source}")]
    MalformedDiagnostic {
        /// Line number where the block was flushed
        line: usize,
        /// Buffered block text
        content: String,
        /// Underlying mapping parser error
        #[source]
        source: DiagnosticError,
    },

    /// No Plan was recorded and the configuration requires one
    #[error("Missing TAP Plan")]
    MissingPlan,

    /// The Plan followed the results but was not the last element
    #[error("Invalid position of TAP Plan: it must precede all test results or be the last element")]
    MisplacedPlan,

    /// Error reading the input stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The input line the error refers to, if it is tied to one
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::DuplicateHeader { line, .. }
            | Self::MisplacedHeader { line, .. }
            | Self::DuplicatePlan { line, .. }
            | Self::Indentation { line, .. }
            | Self::DanglingDiagnostic { line }
            | Self::MalformedDiagnostic { line, .. } => Some(*line),
            Self::MissingPlan | Self::MisplacedPlan | Self::Io(_) => None,
        }
    }
}
