// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TAP 13 line grammar
//!
//! Productions overlap textually (`TAP version 13` is also a valid footer,
//! `# SKIP` is also a valid comment), so they are tried in a fixed order:
//! comment, header, plan, test result, bail out, footer. A line matching
//! none of them is plain text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{
    BailOut, Comment, Directive, DirectiveKind, Footer, Header, Plan, Status, TestResult,
};

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)#\s*(.*)$").expect("comment regex should be valid"));

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)TAP\s*version\s*([0-9]+)\s*(?:#\s*(.*))?$")
        .expect("header regex should be valid")
});

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([0-9]+)\.\.([0-9]+)\s*(?:skip\b\s*([^#]*?))?\s*(?:#\s*(.*))?$")
        .expect("plan regex should be valid")
});

static TEST_RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\s*)(ok|not ok)\b\s*([0-9]+)?\s*([^#]*?)\s*(?:#\s*(SKIP|TODO)\b\s*([^#]*?))?\s*(?:#\s*(.*))?$",
    )
    .expect("test result regex should be valid")
});

static BAIL_OUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)Bail out!\s*([^#]*?)\s*(?:#\s*(.*))?$")
        .expect("bail out regex should be valid")
});

static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)TAP\b\s*([^#]*?)\s*(?:#\s*(.*))?$").expect("footer regex should be valid")
});

/// A TAP element recognized on a single line
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `TAP version N`
    Header(Header),
    /// `M..N`
    Plan(Plan),
    /// `ok` / `not ok`
    TestResult(TestResult),
    /// `Bail out!`
    BailOut(BailOut),
    /// Closing `TAP` line
    Footer(Footer),
    /// `# ...`
    Comment(Comment),
}

/// A classified line together with its indentation
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    /// Count of leading whitespace characters
    pub indentation: usize,
    /// The recognized element
    pub element: Element,
}

/// Leading whitespace of `line`
#[must_use]
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(line.len(), |(idx, _)| idx);
    &line[..end]
}

/// Count of leading whitespace characters in `line`
#[must_use]
pub fn indentation_of(line: &str) -> usize {
    leading_whitespace(line).chars().count()
}

/// Classify one line, or return `None` when it is plain text
///
/// Numbers that do not fit in a `u32` make the line plain text.
#[must_use]
pub fn classify(line: &str) -> Option<Classified> {
    let element = parse_comment(line)
        .or_else(|| parse_header(line))
        .or_else(|| parse_plan(line))
        .or_else(|| parse_test_result(line))
        .or_else(|| parse_bail_out(line))
        .or_else(|| parse_footer(line))?;

    Some(Classified {
        indentation: indentation_of(line),
        element,
    })
}

fn parse_comment(line: &str) -> Option<Element> {
    let caps = COMMENT_RE.captures(line)?;
    Some(Element::Comment(Comment::new(group(&caps, 2).trim_end())))
}

fn parse_header(line: &str) -> Option<Element> {
    let caps = HEADER_RE.captures(line)?;
    Some(Element::Header(Header {
        version: group(&caps, 2).parse().ok()?,
        comment: trailing_comment(&caps, 3),
        diagnostic: None,
    }))
}

fn parse_plan(line: &str) -> Option<Element> {
    let caps = PLAN_RE.captures(line)?;
    let mut plan = Plan::new(group(&caps, 2).parse().ok()?, group(&caps, 3).parse().ok()?);
    plan.skip = caps.get(4).map(|m| m.as_str().trim().to_string());
    plan.comment = trailing_comment(&caps, 5);

    // `1..0 # SKIP reason` is the directive spelling of a skipped plan
    if plan.skip.is_none() {
        if let Some(reason) = plan
            .comment
            .as_ref()
            .and_then(|c| skip_directive_reason(&c.text))
        {
            plan.skip = Some(reason);
            plan.comment = None;
        }
    }
    Some(Element::Plan(plan))
}

fn skip_directive_reason(text: &str) -> Option<String> {
    let rest = text.strip_prefix("SKIP")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim().to_string())
    } else {
        None
    }
}

fn parse_test_result(line: &str) -> Option<Element> {
    let caps = TEST_RESULT_RE.captures(line)?;
    let status = if group(&caps, 2) == "ok" {
        Status::Ok
    } else {
        Status::NotOk
    };
    let number = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    let mut result = TestResult::new(status, number);
    result.description = normalize_description(group(&caps, 4));
    result.directive = caps.get(5).map(|kind| Directive {
        kind: if kind.as_str() == "TODO" {
            DirectiveKind::Todo
        } else {
            DirectiveKind::Skip
        },
        reason: group(&caps, 6).trim().to_string(),
    });
    result.comment = trailing_comment(&caps, 7);
    Some(Element::TestResult(result))
}

fn parse_bail_out(line: &str) -> Option<Element> {
    let caps = BAIL_OUT_RE.captures(line)?;
    Some(Element::BailOut(BailOut {
        reason: group(&caps, 2).trim().to_string(),
        comment: trailing_comment(&caps, 3),
        diagnostic: None,
        comments: Vec::new(),
    }))
}

fn parse_footer(line: &str) -> Option<Element> {
    let caps = FOOTER_RE.captures(line)?;
    Some(Element::Footer(Footer {
        text: group(&caps, 2).trim().to_string(),
        comment: trailing_comment(&caps, 3),
        diagnostic: None,
    }))
}

fn group<'a>(caps: &Captures<'a>, idx: usize) -> &'a str {
    caps.get(idx).map_or("", |m| m.as_str())
}

fn trailing_comment(caps: &Captures<'_>, idx: usize) -> Option<Comment> {
    caps.get(idx).map(|m| Comment::new(m.as_str().trim_end()))
}

/// Strip the conventional `-` separator between number and description
fn normalize_description(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('-')
        .map_or(trimmed, str::trim_start)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn element(line: &str) -> Element {
        classify(line)
            .unwrap_or_else(|| panic!("expected {line:?} to classify"))
            .element
    }

    fn test_result(line: &str) -> TestResult {
        match element(line) {
            Element::TestResult(r) => r,
            other => panic!("expected test result, got {other:?}"),
        }
    }

    #[test]
    fn test_header_with_comment() {
        match element("TAP version 13 # generated") {
            Element::Header(h) => {
                assert_eq!(h.version, 13);
                assert_eq!(h.comment, Some(Comment::new("generated")));
            }
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_forms() {
        match element("1..5") {
            Element::Plan(p) => {
                assert_eq!((p.initial_test_number, p.last_test_number), (1, 5));
                assert_eq!(p.skip, None);
            }
            other => panic!("expected plan, got {other:?}"),
        }
        match element("1..0 skip no database # ci") {
            Element::Plan(p) => {
                assert_eq!(p.skip.as_deref(), Some("no database"));
                assert_eq!(p.comment, Some(Comment::new("ci")));
            }
            other => panic!("expected plan, got {other:?}"),
        }
        match element("1..0 # SKIP not on windows") {
            Element::Plan(p) => {
                assert_eq!(p.skip.as_deref(), Some("not on windows"));
                assert_eq!(p.comment, None);
            }
            other => panic!("expected plan, got {other:?}"),
        }
    }

    #[test]
    fn test_result_full_line() {
        let r = test_result("not ok 7 - parses input # TODO not written # later");
        assert_eq!(r.status, Status::NotOk);
        assert_eq!(r.number, 7);
        assert_eq!(r.description, "parses input");
        assert_eq!(
            r.directive,
            Some(Directive {
                kind: DirectiveKind::Todo,
                reason: "not written".to_string(),
            })
        );
        assert_eq!(r.comment, Some(Comment::new("later")));
    }

    #[test]
    fn test_result_minimal_line() {
        let r = test_result("ok");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.number, 0);
        assert_eq!(r.description, "");
        assert!(r.directive.is_none());
        assert!(r.comment.is_none());
    }

    #[test]
    fn test_directive_is_case_sensitive() {
        let r = test_result("ok 2 - works # skip because");
        assert!(r.directive.is_none());
        assert_eq!(r.comment, Some(Comment::new("skip because")));

        let r = test_result("ok 3 # SKIP");
        assert_eq!(r.directive.map(|d| d.kind), Some(DirectiveKind::Skip));
    }

    #[test]
    fn test_bail_out() {
        match element("Bail out! database down # retry") {
            Element::BailOut(b) => {
                assert_eq!(b.reason, "database down");
                assert_eq!(b.comment, Some(Comment::new("retry")));
            }
            other => panic!("expected bail out, got {other:?}"),
        }
    }

    #[test]
    fn test_footer_only_after_header() {
        assert!(matches!(element("TAP version 13"), Element::Header(_)));
        match element("TAP done") {
            Element::Footer(f) => assert_eq!(f.text, "done"),
            other => panic!("expected footer, got {other:?}"),
        }
        assert!(matches!(element("TAP"), Element::Footer(_)));
    }

    #[test]
    fn test_comment_wins_over_directive_text() {
        match element("  # SKIP everything") {
            Element::Comment(c) => assert_eq!(c.text, "SKIP everything"),
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn test_indentation_is_measured() {
        let classified = classify("    ok 1 - inner").expect("Should classify");
        assert_eq!(classified.indentation, 4);
        assert_eq!(indentation_of("\t\tx"), 2);
        assert_eq!(indentation_of("x"), 0);
    }

    #[test]
    fn test_plain_text_is_unclassified() {
        assert!(classify("hello world").is_none());
        assert!(classify("okay then").is_none());
        assert!(classify("---").is_none());
        assert!(classify("ok 99999999999 - too big").is_none());
    }
}
