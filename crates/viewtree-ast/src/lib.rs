//! Typed AST for view.tree sources.
//!
//! view.tree is the declarative component description language of the $mol
//! framework: one component per `$Name $Base` header, a tab-indented tree of
//! property nodes underneath, with binding operators, literals and raw
//! strings as path elements.
//!
//! Parsing loads the grammar handle first, then runs the hand-written lexer
//! and recursive descent parser over its operator and type tables.

use thiserror::Error;

pub mod lexer;
pub mod parser;
pub mod token;

pub use viewtree_grammar::{Grammar, GrammarError};

// ============================================================================
// Location
// ============================================================================

/// Location in source code. `line` and `column` are 1-indexed and count
/// characters; `byte_offset` counts bytes from the start of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

// ============================================================================
// AST Nodes
// ============================================================================

/// A parsed view.tree file: components and whole-line comments.
#[derive(Debug, Clone)]
pub struct SourceFile {
    items: Vec<SourceItem>,
    location: Location,
}

impl SourceFile {
    pub fn new(items: Vec<SourceItem>, location: Location) -> Self {
        Self { items, location }
    }

    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    /// Just the component definitions, in source order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.items.iter().filter_map(|item| match item {
            SourceItem::Component(c) => Some(c),
            SourceItem::Comment(_) => None,
        })
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

#[derive(Debug, Clone)]
pub enum SourceItem {
    Component(Component),
    Comment(CommentLine),
}

/// Component definition: `$name $base` plus an indented body.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub base: String,
    pub body: Vec<BodyNode>,
    pub location: Location,
}

/// One line inside a property list.
#[derive(Debug, Clone)]
pub enum BodyNode {
    Node(PropertyNode),
    Comment(CommentLine),
    Raw(RawLine),
}

impl BodyNode {
    pub fn location(&self) -> Location {
        match self {
            BodyNode::Node(n) => n.location,
            BodyNode::Comment(n) => n.location,
            BodyNode::Raw(n) => n.location,
        }
    }

    pub fn as_node(&self) -> Option<&PropertyNode> {
        match self {
            BodyNode::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// A property node: a path of space-separated elements plus children.
#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub path: Vec<PathElement>,
    pub children: Vec<BodyNode>,
    pub location: Location,
}

impl PropertyNode {
    /// Name of the leading property identifier, when the node declares one.
    pub fn property_name(&self) -> Option<&str> {
        match self.path.first().map(|e| &e.kind) {
            Some(PathElementKind::Property(ident)) => Some(&ident.name),
            _ => None,
        }
    }
}

/// Disabled or annotated line: `- text`.
#[derive(Debug, Clone)]
pub struct CommentLine {
    pub text: String,
    pub location: Location,
}

/// Raw string occupying a whole line: `\content`.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub content: String,
    pub location: Location,
}

/// One space-separated element of a node path.
#[derive(Debug, Clone)]
pub struct PathElement {
    pub kind: PathElementKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathElementKind {
    /// `<=>`, `<=` or `=>`
    Bind(BindOp),
    /// `-` stub element
    Dash,
    /// `@` localization marker
    At,
    /// `^` dictionary inheritance
    Caret,
    /// `*` dictionary marker
    DictMarker,
    /// `/` untyped list marker
    ListMarker,
    /// `/$mol_view` or `/string`
    TypedList(ListType),
    /// `\content` (to end of line)
    Raw(String),
    Bool(bool),
    Null,
    Special(SpecialNumber),
    Number(NumberLiteral),
    /// `$name` reference
    Component(String),
    Property(PropertyIdent),
}

/// Binding operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOp {
    /// `<=>` two-way
    Both,
    /// `<=` one-way from provider
    Left,
    /// `=>` alias to the right
    Right,
}

impl BindOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindOp::Both => "<=>",
            BindOp::Left => "<=",
            BindOp::Right => "=>",
        }
    }
}

/// Element type of a typed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListType {
    /// `/$mol_view`
    Component(String),
    /// `/string`, `/number`, `/boolean`
    Primitive(String),
}

/// `NaN`, `Infinity`, `-Infinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialNumber {
    NaN,
    Infinity,
    NegInfinity,
}

impl SpecialNumber {
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "NaN" => Some(SpecialNumber::NaN),
            "Infinity" => Some(SpecialNumber::Infinity),
            "-Infinity" => Some(SpecialNumber::NegInfinity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialNumber::NaN => "NaN",
            SpecialNumber::Infinity => "Infinity",
            SpecialNumber::NegInfinity => "-Infinity",
        }
    }
}

/// A numeric literal, kept in source form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    raw: String,
}

impl NumberLiteral {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Numeric value; the lexer only produces parseable literals.
    pub fn value(&self) -> f64 {
        self.raw.parse().unwrap_or(f64::NAN)
    }
}

/// Property identifier split into name, `?!*` suffix run and parameter.
///
/// `click?` -> name `click`, suffix `?`; `item*key` -> name `item`,
/// suffix `*`, param `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyIdent {
    pub name: String,
    pub suffix: String,
    pub param: Option<String>,
}

impl PropertyIdent {
    pub fn from_raw(raw: &str) -> Self {
        let name_end = raw
            .find(|c: char| matches!(c, '?' | '!' | '*'))
            .unwrap_or(raw.len());
        let (name, rest) = raw.split_at(name_end);
        let suffix_end = rest
            .find(|c: char| !matches!(c, '?' | '!' | '*'))
            .unwrap_or(rest.len());
        let (suffix, param) = rest.split_at(suffix_end);
        Self {
            name: name.to_string(),
            suffix: suffix.to_string(),
            param: if param.is_empty() {
                None
            } else {
                Some(param.to_string())
            },
        }
    }

    /// `?` marks a mutable (writable) property.
    pub fn is_mutable(&self) -> bool {
        self.suffix.contains('?')
    }

    /// `*` marks a keyed multi-property.
    pub fn is_keyed(&self) -> bool {
        self.suffix.contains('*')
    }
}

impl std::fmt::Display for PropertyIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.suffix)?;
        if let Some(param) = &self.param {
            write!(f, "{param}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("grammar failed to load")]
    GrammarInit(#[source] GrammarError),

    #[error("indentation must use tabs, found space at line {line}, column {column}")]
    IndentSpace { line: usize, column: usize },

    #[error("unexpected indentation level at line {line}, column {column}")]
    IndentMismatch { line: usize, column: usize },

    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedChar {
        ch: char,
        line: usize,
        column: usize,
    },

    #[error("invalid component name at line {line}, column {column}")]
    InvalidComponentName { line: usize, column: usize },

    #[error("component '{name}' requires a base component at line {line}, column {column}")]
    MissingBase {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("invalid list type '{name}' at line {line}, column {column}")]
    InvalidListType {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("{message} at line {line}, column {column}")]
    UnexpectedToken {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// Source position of the error, when it has one.
    pub fn line_col(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::GrammarInit(_) => None,
            ParseError::IndentSpace { line, column }
            | ParseError::IndentMismatch { line, column }
            | ParseError::UnexpectedChar { line, column, .. }
            | ParseError::InvalidComponentName { line, column }
            | ParseError::MissingBase { line, column, .. }
            | ParseError::InvalidListType { line, column, .. }
            | ParseError::UnexpectedToken { line, column, .. } => Some((*line, *column)),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a view.tree source string into an AST.
pub fn parse(source: &str) -> Result<SourceFile, ParseError> {
    let grammar = viewtree_grammar::language().map_err(ParseError::GrammarInit)?;
    parse_with_grammar(source, &grammar)
}

/// Parse with a caller-supplied grammar handle.
pub fn parse_with_grammar(source: &str, grammar: &Grammar) -> Result<SourceFile, ParseError> {
    let tokens = lexer::tokenize(source, grammar)?;
    parser::parse(tokens, grammar)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "$my_survey_app $mol_book2_catalog\n\
\tparam \\meet\n\
\t- menu_title disabled for now\n\
\tmenu_tools /\n\
\t\t<= Meet_add $mol_button_minor\n\
\t\t\tclick? <=> meet_add? null\n\
\t\t\thint @ \\Add new Meet\n\
\t\t\tsub /\n\
\t\t\t\t<= Meet_add_icon $mol_icon_plus\n";

    #[test]
    fn parse_sample_component() {
        let file = parse(SAMPLE).unwrap();
        let comp = file.components().next().unwrap();
        assert_eq!(comp.name, "$my_survey_app");
        assert_eq!(comp.base, "$mol_book2_catalog");
        assert_eq!(comp.body.len(), 3);
    }

    #[test]
    fn parse_locations_are_one_indexed() {
        let file = parse(SAMPLE).unwrap();
        let comp = file.components().next().unwrap();
        assert_eq!(comp.location.line, 1);
        assert_eq!(comp.location.column, 1);
        let param = comp.body[0].as_node().unwrap();
        assert_eq!(param.location.line, 2);
        assert_eq!(param.location.column, 2);
    }

    #[test]
    fn parse_comment_line_text() {
        let file = parse(SAMPLE).unwrap();
        let comp = file.components().next().unwrap();
        match &comp.body[1] {
            BodyNode::Comment(c) => assert_eq!(c.text, "menu_title disabled for now"),
            other => panic!("expected comment line, got {other:?}"),
        }
    }

    #[test]
    fn parse_deep_nesting() {
        let file = parse(SAMPLE).unwrap();
        let comp = file.components().next().unwrap();
        let tools = comp.body[2].as_node().unwrap();
        assert_eq!(tools.property_name(), Some("menu_tools"));
        let button = tools.children[0].as_node().unwrap();
        assert_eq!(button.children.len(), 3);
        let sub = button.children[2].as_node().unwrap();
        let icon = sub.children[0].as_node().unwrap();
        match &icon.path[2].kind {
            PathElementKind::Component(name) => assert_eq!(name, "$mol_icon_plus"),
            other => panic!("expected component reference, got {other:?}"),
        }
    }

    #[test]
    fn parse_two_way_binding() {
        let file = parse(SAMPLE).unwrap();
        let comp = file.components().next().unwrap();
        let button = comp.body[2].as_node().unwrap().children[0].as_node().unwrap();
        let click = button.children[0].as_node().unwrap();
        let kinds: Vec<&PathElementKind> = click.path.iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], PathElementKind::Property(p) if p.is_mutable()));
        assert!(matches!(kinds[1], PathElementKind::Bind(BindOp::Both)));
        assert!(matches!(kinds[3], PathElementKind::Null));
    }

    #[test]
    fn parse_multiple_components() {
        let file = parse("$first $mol_view\n\n$second $mol_page\n\ttitle \\Second\n").unwrap();
        let names: Vec<&str> = file.components().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["$first", "$second"]);
    }

    #[test]
    fn property_ident_from_raw() {
        let plain = PropertyIdent::from_raw("title");
        assert_eq!(plain.name, "title");
        assert!(plain.suffix.is_empty());
        assert_eq!(plain.param, None);

        let keyed = PropertyIdent::from_raw("item*key");
        assert_eq!(keyed.name, "item");
        assert_eq!(keyed.suffix, "*");
        assert_eq!(keyed.param.as_deref(), Some("key"));
        assert!(keyed.is_keyed());

        let combo = PropertyIdent::from_raw("value?!");
        assert_eq!(combo.suffix, "?!");
        assert!(combo.is_mutable());
        assert_eq!(combo.to_string(), "value?!");
    }

    #[test]
    fn number_literal_values() {
        assert_eq!(NumberLiteral::new("4e2").value(), 400.0);
        assert_eq!(NumberLiteral::new("-1.5").value(), -1.5);
        assert_eq!(NumberLiteral::new(".5").value(), 0.5);
    }

    #[test]
    fn parse_error_position() {
        let err = parse("$my_app\n").unwrap_err();
        assert_eq!(err.line_col(), Some((1, 1)));
        assert!(err.to_string().contains("$my_app"));
    }

    #[test]
    fn corrupted_grammar_fails_parse() {
        let grammar = Grammar::from_json(viewtree_grammar::grammar_json()).unwrap();
        assert!(parse_with_grammar("$a $b\n", &grammar).is_ok());

        let err = Grammar::from_json("{}").unwrap_err();
        let parse_err = ParseError::GrammarInit(err);
        assert!(parse_err.line_col().is_none());
    }
}
