//! Diagnostics for view.tree sources.
//!
//! Two layers: a hard parse error (at most one, the parser stops at the
//! first defect) and spacing lint warnings computed per line on the raw
//! text, so they survive even when the parse fails.

use serde::Serialize;
use viewtree_ast::SourceFile;

/// Diagnostic source tag reported to editors.
const SOURCE: &str = "viewtree";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic. Positions are 0-based, end-exclusive, in characters
/// of the affected line.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub severity: Severity,
    pub message: String,
    pub source: &'static str,
}

impl Diagnostic {
    fn warning(line: usize, start: usize, end: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            start,
            end,
            severity: Severity::Warning,
            message: message.into(),
            source: SOURCE,
        }
    }
}

/// Parse and report all diagnostics for a source text.
pub fn check(text: &str) -> Vec<Diagnostic> {
    let (_, mut diagnostics) = parse_with_diagnostics(text);
    diagnostics.extend(spacing_diagnostics(text));
    diagnostics
}

/// Parse, converting a parse failure into a single error diagnostic.
pub fn parse_with_diagnostics(text: &str) -> (Option<SourceFile>, Vec<Diagnostic>) {
    match viewtree_ast::parse(text) {
        Ok(file) => (Some(file), Vec::new()),
        Err(err) => {
            let (line, column) = err.line_col().unwrap_or((1, 1));
            let start = column.saturating_sub(1);
            let diagnostic = Diagnostic {
                line: line.saturating_sub(1),
                start,
                end: start + 1,
                severity: Severity::Error,
                message: err.to_string(),
                source: SOURCE,
            };
            (None, vec![diagnostic])
        }
    }
}

/// Spacing lints: tab-only indentation, unbroken operators, no raw data
/// after an operator usage, single spaces between elements.
pub fn spacing_diagnostics(text: &str) -> Vec<Diagnostic> {
    let mut issues = Vec::new();
    let unix = text.replace("\r\n", "\n").replace('\r', "\n");

    for (line_idx, raw_line) in unix.split('\n').enumerate() {
        let content_start = raw_line
            .find(|c: char| c != '\t' && c != ' ')
            .unwrap_or(raw_line.len());
        let (indent, rest) = raw_line.split_at(content_start);

        if let Some(first) = indent.find(' ') {
            let last = indent.rfind(' ').unwrap_or(first);
            issues.push(Diagnostic::warning(
                line_idx,
                first,
                last + 1,
                "Indent must use tabs only",
            ));
        }

        if rest.starts_with('\\') {
            continue;
        }

        spaced_operator_issues(rest, content_start, line_idx, &mut issues);
        raw_after_operator_issue(rest, content_start, line_idx, &mut issues);
        multi_space_issues(rest, content_start, line_idx, &mut issues);
    }

    issues
}

fn spaced_operator_issues(
    rest: &str,
    indent_len: usize,
    line_idx: usize,
    issues: &mut Vec<Diagnostic>,
) {
    let bytes = rest.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] == b' ' {
                    j += 1;
                }
                let spaces_before_eq = j - (i + 1);
                if j < bytes.len() && bytes[j] == b'=' {
                    let mut k = j + 1;
                    while k < bytes.len() && bytes[k] == b' ' {
                        k += 1;
                    }
                    let spaces_before_gt = k - (j + 1);
                    if k < bytes.len()
                        && bytes[k] == b'>'
                        && (spaces_before_eq > 0 || spaces_before_gt > 0)
                    {
                        issues.push(Diagnostic::warning(
                            line_idx,
                            indent_len + i,
                            indent_len + k + 1,
                            "Operator '<=>' must not contain spaces",
                        ));
                        i = k + 1;
                        continue;
                    }
                    if spaces_before_eq > 0 {
                        issues.push(Diagnostic::warning(
                            line_idx,
                            indent_len + i,
                            indent_len + j + 1,
                            "Operator '<=' must not contain spaces",
                        ));
                        i = j + 1;
                        continue;
                    }
                }
                i += 1;
            }
            b'=' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] == b' ' {
                    j += 1;
                }
                if j > i + 1 && j < bytes.len() && bytes[j] == b'>' {
                    issues.push(Diagnostic::warning(
                        line_idx,
                        indent_len + i,
                        indent_len + j + 1,
                        "Operator '=>' must not contain spaces",
                    ));
                    i = j + 1;
                    continue;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
}

fn raw_after_operator_issue(
    rest: &str,
    indent_len: usize,
    line_idx: usize,
    issues: &mut Vec<Diagnostic>,
) {
    let bytes = rest.as_bytes();
    let Some(op_end) = find_bind_op_end(rest) else {
        return;
    };

    // Right-hand side after the operator, then a raw string: invalid.
    let mut i = op_end;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    let rhs_start = i;
    while i < bytes.len() && bytes[i] != b' ' {
        i += 1;
    }
    if i == rhs_start {
        return;
    }
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'\\' {
        issues.push(Diagnostic::warning(
            line_idx,
            indent_len + i,
            indent_len + rest.len(),
            "Raw string not allowed after operator; remove trailing raw data",
        ));
    }
}

/// Byte offset just past the first binding operator, if any.
fn find_bind_op_end(rest: &str) -> Option<usize> {
    for (pos, _) in rest.match_indices("<=>") {
        return Some(pos + 3);
    }
    if let Some(pos) = rest.find("<=") {
        return Some(pos + 2);
    }
    rest.find("=>").map(|pos| pos + 2)
}

fn multi_space_issues(
    rest: &str,
    indent_len: usize,
    line_idx: usize,
    issues: &mut Vec<Diagnostic>,
) {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b' ' {
            let start = i;
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            if i - start >= 2 {
                issues.push(Diagnostic::warning(
                    line_idx,
                    indent_len + start,
                    indent_len + i,
                    "Multiple spaces - use single space",
                ));
            }
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_source_has_no_diagnostics() {
        let diags = check("$my_app $mol_view\n\ttitle \\Hello\n");
        assert!(diags.is_empty(), "unexpected: {diags:?}");
    }

    #[test]
    fn test_parse_error_reported_once() {
        let diags = check("$my_app\n");
        let errors: Vec<_> = diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 0);
        assert!(errors[0].message.contains("base"));
    }

    #[test]
    fn test_space_indent_warning() {
        let diags = spacing_diagnostics("$a $b\n  title \\x\n");
        assert!(diags
            .iter()
            .any(|d| d.line == 1 && d.message == "Indent must use tabs only"));
    }

    #[test]
    fn test_spaced_operator_warnings() {
        let diags = spacing_diagnostics("\ttitle < = head\n\tout = > alias\n\tsync < => peer\n");
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"Operator '<=' must not contain spaces"));
        assert!(messages.contains(&"Operator '=>' must not contain spaces"));
        assert!(messages.contains(&"Operator '<=>' must not contain spaces"));
    }

    #[test]
    fn test_correct_operators_not_flagged() {
        let diags = spacing_diagnostics("\tclick? <=> active? null\n\ttitle <= head\n");
        assert!(
            !diags.iter().any(|d| d.message.contains("Operator")),
            "unexpected: {diags:?}"
        );
    }

    #[test]
    fn test_raw_after_operator_warning() {
        let diags = spacing_diagnostics("\ttitle <= head \\stale\n");
        assert!(diags
            .iter()
            .any(|d| d.message.starts_with("Raw string not allowed")));
    }

    #[test]
    fn test_multi_space_warning() {
        let diags = spacing_diagnostics("\tsub    /\n");
        assert!(diags
            .iter()
            .any(|d| d.message == "Multiple spaces - use single space"));
    }

    #[test]
    fn test_raw_line_spacing_ignored() {
        let diags = spacing_diagnostics("\t\\two  spaces  kept\n");
        assert!(diags.is_empty(), "unexpected: {diags:?}");
    }

    #[test]
    fn test_diagnostic_serializes() {
        let diags = check("$broken\n");
        let json = serde_json::to_value(&diags).unwrap();
        assert_eq!(json[0]["severity"], "error");
        assert_eq!(json[0]["source"], "viewtree");
    }
}
