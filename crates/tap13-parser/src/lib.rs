// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! tap13-parser: TAP 13 stream parsing
//!
//! This library crate turns a Test Anything Protocol (version 13) stream into a
//! [`ResultTree`]: header, plan, test results, bail outs, comments, footer,
//! embedded YAML diagnostics and indentation-nested subtests.
//!
//! # Example
//!
//! ```no_run
//! use tap13_parser::{ParserConfig, TapParser, parse_str};
//!
//! // Parse a complete document
//! let tree = parse_str("1..1\nok 1 - works\n", ParserConfig::default()).unwrap();
//! assert!(tree.all_passed());
//!
//! // Or feed lines one at a time
//! let mut parser = TapParser::new(ParserConfig::lenient());
//! parser.process_line("ok 1 - works").unwrap();
//! let tree = parser.finish().unwrap();
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod input;
pub mod model;
pub mod parser;

pub use config::ParserConfig;
pub use diagnostics::{DiagnosticError, DiagnosticParser, YamlDiagnosticParser};
pub use error::ParseError;
pub use model::{
    BailOut, Comment, Diagnostic, Directive, DirectiveKind, Footer, Header, Plan, ResultTree,
    Status, TapLine, TestResult, TestSummary, Text,
};
pub use parser::{TapParser, parse_reader, parse_str};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ParserConfig;
    pub use crate::error::ParseError;
    pub use crate::model::{ResultTree, Status, TapLine, TestResult};
    pub use crate::parser::{TapParser, parse_reader, parse_str};
}
