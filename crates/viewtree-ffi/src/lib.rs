//! C FFI bindings for the viewtree parser and tooling.
//!
//! Exposes `vt_parse_json`, `vt_check_json`, `vt_format` and `vt_string_free`
//! for editor plugins and other FFI consumers.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde_json::{json, Value};
use viewtree::{
    BodyNode, Component, ListType, PathElement, PathElementKind, SourceFile, SourceItem,
    ViewtreeError,
};

/// Parse a view.tree source and return the AST as JSON.
///
/// # Safety
///
/// - `source_utf8` must be a valid null-terminated UTF-8 string.
/// - `out_error_json_utf8` must be a valid pointer to a `*mut c_char` (initially null).
///
/// On success, returns a pointer to a null-terminated UTF-8 JSON string.
/// The caller must free it with `vt_string_free`.
///
/// On error, returns null and writes an error JSON string to `*out_error_json_utf8`.
/// The caller must free the error string with `vt_string_free`.
#[no_mangle]
pub unsafe extern "C" fn vt_parse_json(
    source_utf8: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    // Safety: caller guarantees valid pointers
    let source = match CStr::from_ptr(source_utf8).to_str() {
        Ok(s) => s,
        Err(e) => {
            write_error(out_error_json_utf8, "IoError", &e.to_string(), None, None);
            return ptr::null_mut();
        }
    };

    match viewtree::parse(source) {
        Ok(file) => into_raw_json(&source_file_json(&file), out_error_json_utf8),
        Err(err) => {
            write_viewtree_error(out_error_json_utf8, &err);
            ptr::null_mut()
        }
    }
}

/// Report all diagnostics for a view.tree source as a JSON array.
///
/// # Safety
///
/// Same contract as [`vt_parse_json`]. A source with diagnostics still
/// returns a (possibly empty) JSON array; null is returned only when the
/// input itself is unusable.
#[no_mangle]
pub unsafe extern "C" fn vt_check_json(
    source_utf8: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let source = match CStr::from_ptr(source_utf8).to_str() {
        Ok(s) => s,
        Err(e) => {
            write_error(out_error_json_utf8, "IoError", &e.to_string(), None, None);
            return ptr::null_mut();
        }
    };

    let diagnostics = viewtree::check(source);
    match serde_json::to_value(&diagnostics) {
        Ok(value) => into_raw_json(&value, out_error_json_utf8),
        Err(e) => {
            write_error(out_error_json_utf8, "IoError", &e.to_string(), None, None);
            ptr::null_mut()
        }
    }
}

/// Format a view.tree source.
///
/// # Safety
///
/// Same contract as [`vt_parse_json`]; the returned string is the formatted
/// source text rather than JSON.
#[no_mangle]
pub unsafe extern "C" fn vt_format(
    source_utf8: *const c_char,
    out_error_json_utf8: *mut *mut c_char,
) -> *mut c_char {
    let source = match CStr::from_ptr(source_utf8).to_str() {
        Ok(s) => s,
        Err(e) => {
            write_error(out_error_json_utf8, "IoError", &e.to_string(), None, None);
            return ptr::null_mut();
        }
    };

    let formatted = viewtree::format_text(source);
    match CString::new(formatted) {
        Ok(cs) => cs.into_raw(),
        Err(e) => {
            write_error(out_error_json_utf8, "IoError", &e.to_string(), None, None);
            ptr::null_mut()
        }
    }
}

/// Free a string previously returned by this crate.
///
/// # Safety
///
/// `p` must be a pointer previously returned by this crate via `CString::into_raw`,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn vt_string_free(p: *mut c_char) {
    if !p.is_null() {
        drop(CString::from_raw(p));
    }
}

unsafe fn into_raw_json(value: &Value, out: *mut *mut c_char) -> *mut c_char {
    match CString::new(value.to_string()) {
        Ok(cs) => cs.into_raw(),
        Err(e) => {
            write_error(out, "IoError", &e.to_string(), None, None);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// AST to JSON
// ============================================================================

fn span(location: viewtree::Location) -> Value {
    json!({"line": location.line, "column": location.column})
}

fn source_file_json(file: &SourceFile) -> Value {
    let items: Vec<Value> = file
        .items()
        .iter()
        .map(|item| match item {
            SourceItem::Component(component) => component_json(component),
            SourceItem::Comment(comment) => json!({
                "kind": "comment_line",
                "text": comment.text,
                "span": span(comment.location),
            }),
        })
        .collect();
    json!({"kind": "source_file", "items": items})
}

fn component_json(component: &Component) -> Value {
    json!({
        "kind": "component",
        "name": component.name,
        "base": component.base,
        "body": body_json(&component.body),
        "span": span(component.location),
    })
}

fn body_json(body: &[BodyNode]) -> Value {
    let nodes: Vec<Value> = body
        .iter()
        .map(|node| match node {
            BodyNode::Node(node) => json!({
                "kind": "node",
                "path": node.path.iter().map(path_element_json).collect::<Vec<_>>(),
                "children": body_json(&node.children),
                "span": span(node.location),
            }),
            BodyNode::Comment(comment) => json!({
                "kind": "comment_line",
                "text": comment.text,
                "span": span(comment.location),
            }),
            BodyNode::Raw(raw) => json!({
                "kind": "raw_line",
                "content": raw.content,
                "span": span(raw.location),
            }),
        })
        .collect();
    Value::Array(nodes)
}

fn path_element_json(element: &PathElement) -> Value {
    let mut value = match &element.kind {
        PathElementKind::Bind(op) => json!({"kind": "binding", "op": op.as_str()}),
        PathElementKind::Dash => json!({"kind": "stub"}),
        PathElementKind::At => json!({"kind": "locale_marker"}),
        PathElementKind::Caret => json!({"kind": "inherit_marker"}),
        PathElementKind::DictMarker => json!({"kind": "dict_marker"}),
        PathElementKind::ListMarker => json!({"kind": "list_marker"}),
        PathElementKind::TypedList(ListType::Component(name)) => {
            json!({"kind": "typed_list", "item_kind": "component", "item": name})
        }
        PathElementKind::TypedList(ListType::Primitive(name)) => {
            json!({"kind": "typed_list", "item_kind": "primitive", "item": name})
        }
        PathElementKind::Raw(content) => json!({"kind": "raw_string", "content": content}),
        PathElementKind::Bool(value) => json!({"kind": "boolean", "value": value}),
        PathElementKind::Null => json!({"kind": "null"}),
        PathElementKind::Special(special) => {
            json!({"kind": "special_number", "value": special.as_str()})
        }
        PathElementKind::Number(number) => {
            json!({"kind": "number", "raw": number.raw(), "value": number.value()})
        }
        PathElementKind::Component(name) => json!({"kind": "component_name", "name": name}),
        PathElementKind::Property(ident) => json!({
            "kind": "property_identifier",
            "name": ident.name,
            "suffix": ident.suffix,
            "param": ident.param,
        }),
    };
    value["span"] = span(element.location);
    value
}

// ============================================================================
// Errors
// ============================================================================

/// Convert a `ViewtreeError` to error JSON and write it to the output pointer.
unsafe fn write_viewtree_error(out: *mut *mut c_char, err: &ViewtreeError) {
    let (error_type, message, line, column) = match err {
        ViewtreeError::Parse(parse) => {
            let (line, column) = parse
                .line_col()
                .map_or((None, None), |(l, c)| (Some(l), Some(c)));
            ("ParseError", parse.to_string(), line, column)
        }
        ViewtreeError::Grammar(grammar) => ("GrammarError", grammar.to_string(), None, None),
        ViewtreeError::Load { message } => ("LoadError", message.clone(), None, None),
        ViewtreeError::Io(io) => ("IoError", io.to_string(), None, None),
    };

    write_error(out, error_type, &message, line, column);
}

/// Write an error JSON string to the output pointer.
unsafe fn write_error(
    out: *mut *mut c_char,
    error_type: &str,
    message: &str,
    line: Option<usize>,
    column: Option<usize>,
) {
    let json = json!({
        "type": error_type,
        "message": message,
        "line": line,
        "column": column,
    });

    if let Ok(cs) = CString::new(json.to_string()) {
        *out = cs.into_raw();
    }
}
