//! Token types for the view.tree lexer.

use crate::Location;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// End of line (also synthesized once at EOF when the file lacks a final LF)
    Newline,
    /// Indentation level increased by one tab
    Indent,
    /// Indentation level decreased by one tab
    Dedent,
    /// `- text` occupying a whole line
    CommentLine,
    /// `\raw text` to end of line; value excludes the backslash
    RawString,
    /// `<=>` two-way binding
    ArrowBoth,
    /// `<=` left binding (provider)
    ArrowLeft,
    /// `=>` right binding (alias)
    ArrowRight,
    /// `-` path element
    Dash,
    /// `/` list marker
    Slash,
    /// `*` dictionary marker
    Star,
    /// `^` dictionary inheritance
    Caret,
    /// `@` localized string marker
    At,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `NaN`, `Infinity`, `-Infinity`
    SpecialNumber,
    /// Signed decimal with optional fraction and exponent
    Number,
    /// `$name`
    ComponentName,
    /// Identifier with optional `?!*` suffix run and optional parameter
    PropertyIdent,
    /// End of file
    Eof,
}

/// A token with its type, value, and location.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, location: Location) -> Self {
        Self {
            token_type,
            value: value.into(),
            location,
        }
    }

    /// Byte offset one past the end of this token's text.
    pub fn end_offset(&self) -> usize {
        self.location.byte_offset + self.value.len()
    }
}
