//! Integration tests for the formatter and diagnostics over whole sources.

use pretty_assertions::assert_eq;
use viewtree::{check, format_text, Severity};

// ============================================================================
// Formatting
// ============================================================================

#[test]
fn format_repairs_spaced_operators() {
    let input = "$my_app $mol_view\n\tclick? < => selected?\n\ttitle < = head\n\tout = > alias\n";
    let expected = "$my_app $mol_view\n\tclick? <=> selected?\n\ttitle <= head\n\tout => alias\n";
    assert_eq!(format_text(input), expected);
}

#[test]
fn format_collapses_space_runs() {
    let input = "$my_app $mol_view\n\tsub   /\n\t\t<= Body    $mol_page\n";
    let expected = "$my_app $mol_view\n\tsub /\n\t\t<= Body $mol_page\n";
    assert_eq!(format_text(input), expected);
}

#[test]
fn format_is_idempotent() {
    let input = "$my_app $mol_view\n\tclick? < = > selected?\n\tsub   /\n";
    let once = format_text(input);
    assert_eq!(format_text(&once), once);
}

#[test]
fn format_keeps_raw_lines_verbatim() {
    let input = "$my_app $mol_view\n\ttext \\two  spaces   stay\n\tblock\n\t\t\\  leading kept\n";
    assert_eq!(format_text(input), input);
}

#[test]
fn format_normalizes_crlf_and_final_newline() {
    let input = "$my_app $mol_view\r\n\ttitle \\Hi";
    assert_eq!(format_text(input), "$my_app $mol_view\n\ttitle \\Hi\n");
}

#[test]
fn formatted_output_parses_cleanly() {
    let input = "$my_app $mol_view\n\tclick? < => selected? null\n\tsub   /\n\t\t<= Body $mol_page\n";
    let formatted = format_text(input);
    viewtree::parse(&formatted).unwrap();
}

// ============================================================================
// Diagnostics end to end
// ============================================================================

#[test]
fn diagnostics_cover_spacing_and_parse_errors() {
    let input = "$my_app $mol_view\n  title < = head\n";
    let diags = check(input);

    assert!(diags
        .iter()
        .any(|d| d.severity == Severity::Error), "space indent is a parse error");
    assert!(diags
        .iter()
        .any(|d| d.message == "Indent must use tabs only"));
    assert!(diags
        .iter()
        .any(|d| d.message == "Operator '<=' must not contain spaces"));
}

#[test]
fn diagnostics_empty_for_formatted_source() {
    let dirty = "$my_app $mol_view\n\ttitle < = head\n\tsub   /\n";
    let clean = format_text(dirty);
    assert_eq!(check(&clean).len(), 0, "diags: {:?}", check(&clean));
}
