//! Non-destructive formatter for view.tree sources.
//!
//! Keeps line structure and indentation untouched; repairs binding operators
//! broken by spaces, collapses space runs, drops a raw string trailing an
//! operator usage, normalizes newlines and guarantees a final LF. Raw-string
//! lines are never modified.

/// Format a whole source text.
pub fn format_text(text: &str) -> String {
    let unix = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unix.split('\n').map(sanitize_line).collect();
    let mut out = lines.join("\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Sanitize a single line, preserving its indentation.
pub fn sanitize_line(line: &str) -> String {
    let content_start = line
        .find(|c: char| c != '\t' && c != ' ')
        .unwrap_or(line.len());
    let (indent, rest) = line.split_at(content_start);

    // Raw string lines keep their spacing verbatim.
    if rest.starts_with('\\') {
        return line.to_string();
    }

    let mut elements = merge_broken_operators(rest);
    drop_raw_after_operator(&mut elements);

    format!("{indent}{}", elements.join(" "))
}

fn is_bind_op(token: &str) -> bool {
    matches!(token, "<=>" | "<=" | "=>")
}

/// Rejoin operator fragments split by spaces: `< =` -> `<=`, `= >` -> `=>`,
/// `< = >` and friends -> `<=>`. Also collapses space runs as a side effect
/// of element-wise splitting.
fn merge_broken_operators(rest: &str) -> Vec<String> {
    let tokens: Vec<&str> = rest.split(' ').filter(|t| !t.is_empty()).collect();
    let mut merged = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        let next = tokens.get(i + 1).copied();
        match (token, next) {
            ("<", Some("=")) => {
                if tokens.get(i + 2) == Some(&">") {
                    merged.push("<=>".to_string());
                    i += 3;
                } else {
                    merged.push("<=".to_string());
                    i += 2;
                }
            }
            ("<", Some("=>")) | ("<=", Some(">")) => {
                merged.push("<=>".to_string());
                i += 2;
            }
            ("=", Some(">")) => {
                merged.push("=>".to_string());
                i += 2;
            }
            _ => {
                merged.push(token.to_string());
                i += 1;
            }
        }
    }

    merged
}

/// A raw string is not allowed right after an operator's single right-hand
/// side; drop the trailing raw data.
fn drop_raw_after_operator(elements: &mut Vec<String>) {
    let Some(op_pos) = elements.iter().position(|t| is_bind_op(t)) else {
        return;
    };
    if let Some(raw) = elements.get(op_pos + 2) {
        if raw.starts_with('\\') {
            elements.truncate(op_pos + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced_operators_repaired() {
        assert_eq!(sanitize_line("\tclick? < => active?"), "\tclick? <=> active?");
        assert_eq!(sanitize_line("\tclick? < = > active?"), "\tclick? <=> active?");
        assert_eq!(sanitize_line("\ttitle < = head"), "\ttitle <= head");
        assert_eq!(sanitize_line("\tout = > alias"), "\tout => alias");
    }

    #[test]
    fn test_multiple_spaces_collapsed() {
        assert_eq!(sanitize_line("\tsub    /"), "\tsub /");
    }

    #[test]
    fn test_raw_line_untouched() {
        assert_eq!(sanitize_line("\t\\  keep   spacing  "), "\t\\  keep   spacing  ");
    }

    #[test]
    fn test_raw_after_operator_dropped() {
        assert_eq!(
            sanitize_line("\ttitle <= head \\stale data"),
            "\ttitle <= head"
        );
    }

    #[test]
    fn test_raw_later_in_path_kept() {
        assert_eq!(
            sanitize_line("\ttitle <= head foo \\raw"),
            "\ttitle <= head foo \\raw"
        );
    }

    #[test]
    fn test_trailing_newline_added() {
        assert_eq!(format_text("$a $b"), "$a $b\n");
        assert_eq!(format_text("$a $b\n"), "$a $b\n");
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(format_text("$a $b\r\n\tone 1\r\n"), "$a $b\n\tone 1\n");
    }
}
