use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::mermaid::PREAMBLE;

/// Connector tokens accepted on relationship lines, including the mirrored
/// forms Mermaid understands.
const CONNECTORS: &[&str] = &[
    "*--", "--*", "o--", "--o", "-->", "<--", "--|>", "<|--", "--",
];

static EMPTY_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+\w+\s*\{\s*\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for SyntaxReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl SyntaxReport {
    fn error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }
}

/// Purely syntactic check of Mermaid class-diagram source.
pub fn validate(source: &str) -> SyntaxReport {
    let mut report = SyntaxReport::default();

    let first = source.lines().map(str::trim).find(|l| !l.is_empty());
    if !first.is_some_and(|l| l.starts_with(PREAMBLE)) {
        report.error(format!("Missing '{PREAMBLE}' directive"));
    }

    check_braces(source, &mut report);

    if EMPTY_CLASS.is_match(source) {
        report.warnings.push("Empty class definitions found".to_string());
    }

    let mut in_body = false;
    for raw in source.lines() {
        let line = raw.trim();
        if in_body {
            if line.starts_with('}') {
                in_body = false;
            }
            continue;
        }
        if line.starts_with("class ") {
            in_body = line.ends_with('{');
            continue;
        }
        if is_statement(line) {
            continue;
        }
        if !has_valid_connector(line) {
            report.error(format!("Invalid relationship symbol in line: {line}"));
        }
    }

    report
}

fn check_braces(source: &str, report: &mut SyntaxReport) {
    let mut depth = 0usize;
    let mut premature = false;
    for ch in source.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => premature = true,
            '}' => depth -= 1,
            _ => {}
        }
    }
    if premature {
        report.error("Closing brace without a matching opening brace");
    }
    if depth > 0 || premature {
        report.error("Unbalanced braces in class definitions");
    }
}

/// Lines that never carry a connector.
fn is_statement(line: &str) -> bool {
    line.is_empty()
        || line.starts_with(PREAMBLE)
        || line.starts_with("%%")
        || line.starts_with("direction ")
        || line.starts_with("note")
        || line == "}"
        || !line.contains("--")
}

fn has_valid_connector(line: &str) -> bool {
    let head = line.split_once(" : ").map_or(line, |(head, _)| head);
    head.split_whitespace()
        .filter(|token| token.contains("--"))
        .all(|token| CONNECTORS.contains(&token))
}
