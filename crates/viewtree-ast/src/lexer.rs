//! Hand-written lexer for view.tree sources.
//!
//! Line-oriented state machine:
//! - At line start, leading tabs are measured against a level stack and
//!   converted into `Indent`/`Dedent` tokens (one `Dedent` per popped level).
//! - Inside a line, elements are separated by spaces; `#` comments are trivia.
//!
//! A final `Newline` is synthesized when the file does not end with LF, then
//! all open levels are drained as `Dedent`s.

use viewtree_grammar::Grammar;

use crate::token::{Token, TokenType};
use crate::{Location, ParseError};

/// Tokenize a source string into a sequence of tokens.
pub fn tokenize(source: &str, grammar: &Grammar) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source, grammar);
    lexer.tokenize()
}

struct Lexer<'a> {
    text: &'a str,
    source: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    line_has_element: bool,
    operators: Vec<(String, TokenType)>,
}

/// Map an operator rule name from the grammar artifact to its token type.
fn operator_token(rule: &str) -> Option<TokenType> {
    Some(match rule {
        "arrow_both" => TokenType::ArrowBoth,
        "arrow_left" => TokenType::ArrowLeft,
        "arrow_right" => TokenType::ArrowRight,
        "op_dash" => TokenType::Dash,
        "op_slash" => TokenType::Slash,
        "op_star" => TokenType::Star,
        "op_caret" => TokenType::Caret,
        "op_at" => TokenType::At,
        _ => return None,
    })
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, grammar: &Grammar) -> Self {
        let operators = grammar
            .operators_by_length()
            .into_iter()
            .filter_map(|(rule, literal)| {
                operator_token(rule).map(|tt| (literal.to_string(), tt))
            })
            .collect();
        Self {
            text: source,
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            at_line_start: true,
            line_has_element: false,
            operators,
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while self.pos < self.source.len() {
            if self.at_line_start {
                self.lex_line_start(&mut tokens)?;
            } else {
                self.lex_element(&mut tokens)?;
            }
        }

        // The grammar requires every line to end with LF.
        if !self.at_line_start {
            tokens.push(Token::new(TokenType::Newline, "\n", self.here()));
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenType::Dedent, "", self.here()));
        }
        tokens.push(Token::new(TokenType::Eof, "", self.here()));

        Ok(tokens)
    }

    /// Measure leading tabs and emit Indent/Dedent tokens.
    fn lex_line_start(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let mut tabs = 0usize;
        let mut space_at = None;
        loop {
            match self.peek() {
                Some(b'\t') => {
                    self.advance_one();
                    tabs += 1;
                }
                Some(b' ') => {
                    if space_at.is_none() {
                        space_at = Some((self.line, self.col));
                    }
                    self.advance_one();
                }
                _ => break,
            }
        }

        // Blank line: only trivia before the newline; the level stack is
        // untouched no matter what whitespace the line carries.
        let is_blank = matches!(self.peek(), None | Some(b'\n') | Some(b'\r') | Some(b'#'));
        if is_blank {
            if self.peek() == Some(b'#') {
                self.skip_line_comment();
            }
            self.consume_newline_into(tokens);
            return Ok(());
        }

        // Only a line with content gets its indentation policed.
        if let Some((line, column)) = space_at {
            return Err(ParseError::IndentSpace { line, column });
        }

        let prev = self.indent_stack.last().copied().unwrap_or(0);
        if tabs > prev {
            self.indent_stack.push(tabs);
            tokens.push(Token::new(TokenType::Indent, "", self.here()));
        } else if tabs < prev {
            while self.indent_stack.last().copied().unwrap_or(0) > tabs {
                self.indent_stack.pop();
                tokens.push(Token::new(TokenType::Dedent, "", self.here()));
            }
            if self.indent_stack.last().copied().unwrap_or(0) != tabs {
                return Err(ParseError::IndentMismatch {
                    line: self.line,
                    column: self.col,
                });
            }
        }

        self.at_line_start = false;
        self.line_has_element = false;
        Ok(())
    }

    /// Lex a single element (or separator/terminator) inside a line.
    fn lex_element(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.advance_one();
        }

        let loc = self.here();
        let Some(c) = self.peek() else {
            return Ok(());
        };

        match c {
            b'\r' | b'\n' => {
                self.consume_newline_into(tokens);
                Ok(())
            }
            b'#' => {
                self.skip_line_comment();
                Ok(())
            }
            b'-' if !self.line_has_element && self.peek_at(1) == Some(b' ') => {
                self.lex_comment_line(tokens, loc);
                Ok(())
            }
            b'\\' => {
                self.lex_raw_string(tokens, loc);
                Ok(())
            }
            b'$' => self.lex_component_name(tokens, loc),
            b'0'..=b'9' => {
                self.lex_number(tokens, loc);
                Ok(())
            }
            b'.' if self.digit_at(1) => {
                self.lex_number(tokens, loc);
                Ok(())
            }
            b'+' | b'-' if self.digit_at(1) || (self.peek_at(1) == Some(b'.') && self.digit_at(2)) => {
                self.lex_number(tokens, loc);
                Ok(())
            }
            b'-' if self.looking_at(b"-Infinity") && !self.is_ident_continue_at(self.pos + 9) => {
                let value = &self.text[self.pos..self.pos + 9];
                tokens.push(Token::new(TokenType::SpecialNumber, value, loc));
                self.advance_n(9);
                self.line_has_element = true;
                Ok(())
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                self.lex_word(tokens, loc);
                Ok(())
            }
            _ => self.lex_operator(tokens, loc),
        }
    }

    /// Comment line: `- ` plus text to end of line.
    fn lex_comment_line(&mut self, tokens: &mut Vec<Token>, loc: Location) {
        self.advance_n(2); // "- "
        let start = self.pos;
        while !matches!(self.peek(), None | Some(b'\n') | Some(b'\r')) {
            self.advance_one();
        }
        tokens.push(Token::new(
            TokenType::CommentLine,
            &self.text[start..self.pos],
            loc,
        ));
        self.line_has_element = true;
    }

    /// Raw string: `\` plus everything to end of line, spaces included.
    fn lex_raw_string(&mut self, tokens: &mut Vec<Token>, loc: Location) {
        self.advance_one(); // backslash
        let start = self.pos;
        while !matches!(self.peek(), None | Some(b'\n') | Some(b'\r')) {
            self.advance_one();
        }
        tokens.push(Token::new(
            TokenType::RawString,
            &self.text[start..self.pos],
            loc,
        ));
        self.line_has_element = true;
    }

    /// Component name: `$` plus an identifier.
    fn lex_component_name(
        &mut self,
        tokens: &mut Vec<Token>,
        loc: Location,
    ) -> Result<(), ParseError> {
        let start = self.pos;
        self.advance_one(); // $
        if !matches!(self.peek(), Some(b'A'..=b'Z') | Some(b'a'..=b'z') | Some(b'_')) {
            return Err(ParseError::InvalidComponentName {
                line: loc.line,
                column: loc.column,
            });
        }
        while self.is_ident_continue_at(self.pos) {
            self.advance_one();
        }
        tokens.push(Token::new(
            TokenType::ComponentName,
            &self.text[start..self.pos],
            loc,
        ));
        self.line_has_element = true;
        Ok(())
    }

    /// Number: optional sign, integer/fraction digits, optional exponent.
    fn lex_number(&mut self, tokens: &mut Vec<Token>, loc: Location) {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.advance_one();
        }
        while self.digit_at(0) {
            self.advance_one();
        }
        if self.peek() == Some(b'.') {
            self.advance_one();
            while self.digit_at(0) {
                self.advance_one();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mut exp_len = 1;
            if matches!(self.peek_at(1), Some(b'+') | Some(b'-')) {
                exp_len = 2;
            }
            if self.digit_at(exp_len) {
                self.advance_n(exp_len);
                while self.digit_at(0) {
                    self.advance_one();
                }
            }
        }
        tokens.push(Token::new(
            TokenType::Number,
            &self.text[start..self.pos],
            loc,
        ));
        self.line_has_element = true;
    }

    /// Keyword, special number, or property identifier.
    fn lex_word(&mut self, tokens: &mut Vec<Token>, loc: Location) {
        let start = self.pos;
        while self.is_ident_continue_at(self.pos) {
            self.advance_one();
        }
        let base = &self.text[start..self.pos];

        let keyword = match base {
            "true" => Some(TokenType::True),
            "false" => Some(TokenType::False),
            "null" => Some(TokenType::Null),
            "NaN" | "Infinity" => Some(TokenType::SpecialNumber),
            _ => None,
        };
        if let Some(token_type) = keyword {
            // A `?!*` suffix turns a would-be keyword into a property name.
            if !matches!(self.peek(), Some(b'?') | Some(b'!') | Some(b'*')) {
                tokens.push(Token::new(token_type, base, loc));
                self.line_has_element = true;
                return;
            }
        }

        // Suffix run, then an optional parameter glued to it: `click?`,
        // `item*key`, `sub?val`.
        while matches!(self.peek(), Some(b'?') | Some(b'!') | Some(b'*')) {
            self.advance_one();
        }
        if self.pos > start + base.len() {
            while self.is_ident_continue_at(self.pos) {
                self.advance_one();
            }
        }
        tokens.push(Token::new(
            TokenType::PropertyIdent,
            &self.text[start..self.pos],
            loc,
        ));
        self.line_has_element = true;
    }

    /// Match against the grammar's operator table, longest literal first.
    fn lex_operator(&mut self, tokens: &mut Vec<Token>, loc: Location) -> Result<(), ParseError> {
        for i in 0..self.operators.len() {
            let (literal, token_type) = (self.operators[i].0.clone(), self.operators[i].1);
            if self.looking_at(literal.as_bytes()) {
                tokens.push(Token::new(token_type, literal.as_str(), loc));
                self.advance_n(literal.len());
                self.line_has_element = true;
                return Ok(());
            }
        }
        let ch = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
        Err(ParseError::UnexpectedChar {
            ch,
            line: loc.line,
            column: loc.column,
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn consume_newline_into(&mut self, tokens: &mut Vec<Token>) {
        if self.peek() == Some(b'\r') {
            self.advance_one();
        }
        if self.peek() == Some(b'\n') {
            let loc = self.here();
            self.advance_one();
            tokens.push(Token::new(TokenType::Newline, "\n", loc));
        }
        self.at_line_start = true;
    }

    fn skip_line_comment(&mut self) {
        while !matches!(self.peek(), None | Some(b'\n') | Some(b'\r')) {
            self.advance_one();
        }
    }

    fn here(&self) -> Location {
        Location::new(self.line, self.col, self.pos)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn digit_at(&self, offset: usize) -> bool {
        matches!(self.peek_at(offset), Some(b'0'..=b'9'))
    }

    fn looking_at(&self, pattern: &[u8]) -> bool {
        self.source[self.pos..].starts_with(pattern)
    }

    fn is_ident_continue_at(&self, pos: usize) -> bool {
        matches!(
            self.source.get(pos),
            Some(b'A'..=b'Z') | Some(b'a'..=b'z') | Some(b'0'..=b'9') | Some(b'_')
        )
    }

    fn advance_one(&mut self) {
        if self.pos < self.source.len() {
            let byte = self.source[self.pos];
            if byte == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if byte & 0xC0 != 0x80 {
                // UTF-8 continuation bytes stay within the current column.
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance_one();
        }
    }
}
