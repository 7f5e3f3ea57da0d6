// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the stream parser
//!
//! Feeds arbitrary lines to `TapParser` under a fuzzer-chosen configuration.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tap13_parser::{ParserConfig, TapParser};

#[derive(Debug, Arbitrary)]
struct Input {
    subtests_enabled: bool,
    plan_required: bool,
    lenient_diagnostics: bool,
    check_plan_position: bool,
    stream: String,
}

fuzz_target!(|input: Input| {
    let config = ParserConfig {
        subtests_enabled: input.subtests_enabled,
        plan_required: input.plan_required,
        lenient_diagnostics: input.lenient_diagnostics,
        check_plan_position: input.check_plan_position,
    };
    let mut parser = TapParser::new(config);

    // Process each line - parser should never panic
    for line in input.stream.lines() {
        if parser.process_line(line).is_err() {
            return;
        }
    }

    // Finalize should never panic
    let _ = parser.finish();
});
