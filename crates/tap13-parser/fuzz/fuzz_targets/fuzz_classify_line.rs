// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for line classification
//!
//! This fuzzes `grammar::classify`, which matches a single line against the
//! ordered TAP productions.

#![no_main]

use libfuzzer_sys::fuzz_target;

use tap13_parser::grammar;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        for line in input.lines() {
            if let Some(classified) = grammar::classify(line) {
                // Indentation never exceeds the line itself
                assert!(classified.indentation <= line.chars().count());
            }
        }
    }
});
