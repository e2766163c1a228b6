//! Recursive descent parser for view.tree sources.
//!
//! Consumes the token stream produced by the lexer (indentation already
//! resolved into Indent/Dedent tokens) and produces a typed AST.

use viewtree_grammar::Grammar;

use crate::token::{Token, TokenType};
use crate::{
    BindOp, BodyNode, CommentLine, Component, ListType, Location, NumberLiteral, ParseError,
    PathElement, PathElementKind, PropertyIdent, PropertyNode, RawLine, SourceFile, SourceItem,
    SpecialNumber,
};

/// Parse a token stream into a [`SourceFile`].
pub fn parse(tokens: Vec<Token>, grammar: &Grammar) -> Result<SourceFile, ParseError> {
    let mut parser = Parser::new(tokens, grammar);
    parser.parse()
}

struct Parser<'g> {
    tokens: Vec<Token>,
    pos: usize,
    grammar: &'g Grammar,
}

impl<'g> Parser<'g> {
    fn new(tokens: Vec<Token>, grammar: &'g Grammar) -> Self {
        Self {
            tokens,
            pos: 0,
            grammar,
        }
    }

    fn parse(&mut self) -> Result<SourceFile, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_blank_lines();
            match self.current_type() {
                TokenType::Eof => break,
                TokenType::ComponentName => {
                    items.push(SourceItem::Component(self.parse_component()?));
                }
                TokenType::CommentLine => {
                    items.push(SourceItem::Comment(self.parse_comment_line()?));
                }
                _ => {
                    return self.unexpected_token("Expected component definition");
                }
            }
        }

        Ok(SourceFile::new(items, Location::new(1, 1, 0)))
    }

    /// `$Name $Base NEWLINE property_list?`
    fn parse_component(&mut self) -> Result<Component, ParseError> {
        let name_token = self.consume(TokenType::ComponentName)?;
        let location = name_token.location;

        if self.current_type() != TokenType::ComponentName {
            return Err(ParseError::MissingBase {
                name: name_token.value,
                line: location.line,
                column: location.column,
            });
        }
        let base_token = self.consume(TokenType::ComponentName)?;

        if self.current_type() != TokenType::Newline {
            return self.unexpected_token("Component header takes exactly two names");
        }
        self.advance();

        let body = if self.current_type() == TokenType::Indent {
            self.parse_property_list()?
        } else {
            Vec::new()
        };

        Ok(Component {
            name: name_token.value,
            base: base_token.value,
            body,
            location,
        })
    }

    /// `INDENT (blank | comment_line | node | raw_line)+ DEDENT`
    fn parse_property_list(&mut self) -> Result<Vec<BodyNode>, ParseError> {
        self.consume(TokenType::Indent)?;
        let mut nodes = Vec::new();

        loop {
            match self.current_type() {
                TokenType::Dedent => break,
                TokenType::Newline => self.advance(),
                TokenType::CommentLine => {
                    nodes.push(BodyNode::Comment(self.parse_comment_line()?));
                }
                TokenType::RawString => {
                    nodes.push(BodyNode::Raw(self.parse_raw_line()?));
                }
                TokenType::Eof => {
                    return self.unexpected_token("Unclosed property list");
                }
                _ => {
                    nodes.push(BodyNode::Node(self.parse_node()?));
                }
            }
        }

        self.consume(TokenType::Dedent)?;
        Ok(nodes)
    }

    fn parse_comment_line(&mut self) -> Result<CommentLine, ParseError> {
        let token = self.consume(TokenType::CommentLine)?;
        self.consume(TokenType::Newline)?;
        Ok(CommentLine {
            text: token.value,
            location: token.location,
        })
    }

    fn parse_raw_line(&mut self) -> Result<RawLine, ParseError> {
        let token = self.consume(TokenType::RawString)?;
        self.consume(TokenType::Newline)?;
        Ok(RawLine {
            content: token.value,
            location: token.location,
        })
    }

    /// `node_path NEWLINE property_list?`
    fn parse_node(&mut self) -> Result<PropertyNode, ParseError> {
        let location = self.current_location();
        let mut path = Vec::new();

        while self.current_type() != TokenType::Newline {
            path.push(self.parse_path_element()?);
        }
        self.consume(TokenType::Newline)?;

        let children = if self.current_type() == TokenType::Indent {
            self.parse_property_list()?
        } else {
            Vec::new()
        };

        Ok(PropertyNode {
            path,
            children,
            location,
        })
    }

    fn parse_path_element(&mut self) -> Result<PathElement, ParseError> {
        let token = match self.current_token() {
            Some(t) => t.clone(),
            None => return self.unexpected_token("Unexpected end of input"),
        };
        let location = token.location;

        let kind = match token.token_type {
            TokenType::ArrowBoth => {
                self.advance();
                PathElementKind::Bind(BindOp::Both)
            }
            TokenType::ArrowLeft => {
                self.advance();
                PathElementKind::Bind(BindOp::Left)
            }
            TokenType::ArrowRight => {
                self.advance();
                PathElementKind::Bind(BindOp::Right)
            }
            TokenType::Dash => {
                self.advance();
                PathElementKind::Dash
            }
            TokenType::At => {
                self.advance();
                PathElementKind::At
            }
            TokenType::Caret => {
                self.advance();
                PathElementKind::Caret
            }
            TokenType::Star => {
                self.advance();
                PathElementKind::DictMarker
            }
            TokenType::Slash => return self.parse_list_element(),
            TokenType::RawString => {
                self.advance();
                PathElementKind::Raw(token.value)
            }
            TokenType::True => {
                self.advance();
                PathElementKind::Bool(true)
            }
            TokenType::False => {
                self.advance();
                PathElementKind::Bool(false)
            }
            TokenType::Null => {
                self.advance();
                PathElementKind::Null
            }
            TokenType::SpecialNumber => {
                self.advance();
                PathElementKind::Special(SpecialNumber::from_raw(&token.value).ok_or(
                    ParseError::UnexpectedToken {
                        message: format!("Unknown special number '{}'", token.value),
                        line: location.line,
                        column: location.column,
                    },
                )?)
            }
            TokenType::Number => {
                self.advance();
                PathElementKind::Number(NumberLiteral::new(token.value))
            }
            TokenType::ComponentName => {
                self.advance();
                PathElementKind::Component(token.value)
            }
            TokenType::PropertyIdent => {
                self.advance();
                PathElementKind::Property(PropertyIdent::from_raw(&token.value))
            }
            _ => return self.unexpected_token("Invalid path element"),
        };

        Ok(PathElement { kind, location })
    }

    /// `/` alone is a list marker; `/` glued to a component name or a
    /// primitive type name is a typed list.
    fn parse_list_element(&mut self) -> Result<PathElement, ParseError> {
        let slash = self.consume(TokenType::Slash)?;
        let location = slash.location;

        let glued = self
            .current_token()
            .map(|next| next.location.byte_offset == slash.end_offset())
            .unwrap_or(false);

        if !glued {
            return Ok(PathElement {
                kind: PathElementKind::ListMarker,
                location,
            });
        }

        match self.current_type() {
            TokenType::ComponentName => {
                let name = self.consume(TokenType::ComponentName)?;
                Ok(PathElement {
                    kind: PathElementKind::TypedList(ListType::Component(name.value)),
                    location,
                })
            }
            TokenType::PropertyIdent => {
                let word = self.consume(TokenType::PropertyIdent)?;
                if !self.grammar.is_type_name(&word.value) {
                    return Err(ParseError::InvalidListType {
                        name: word.value,
                        line: location.line,
                        column: location.column,
                    });
                }
                Ok(PathElement {
                    kind: PathElementKind::TypedList(ListType::Primitive(word.value)),
                    location,
                })
            }
            _ => Ok(PathElement {
                kind: PathElementKind::ListMarker,
                location,
            }),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn skip_blank_lines(&mut self) {
        while self.current_type() == TokenType::Newline {
            self.advance();
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_type(&self) -> TokenType {
        self.current_token()
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    fn current_location(&self) -> Location {
        self.current_token()
            .map(|t| t.location)
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn consume(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        let token = self.current_token().cloned();
        match token {
            Some(t) if t.token_type == expected => {
                self.advance();
                Ok(t)
            }
            Some(t) => Err(ParseError::UnexpectedToken {
                message: format!("Expected {:?}, got {:?}", expected, t.token_type),
                line: t.location.line,
                column: t.location.column,
            }),
            None => Err(ParseError::UnexpectedToken {
                message: format!("Expected {:?}, got end of input", expected),
                line: 0,
                column: 0,
            }),
        }
    }

    fn unexpected_token<T>(&self, message: &str) -> Result<T, ParseError> {
        let loc = self.current_location();
        let msg = match self.current_token() {
            Some(t) => format!("{}: {:?}", message, t.token_type),
            None => message.to_string(),
        };
        Err(ParseError::UnexpectedToken {
            message: msg,
            line: loc.line,
            column: loc.column,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse, ParseError, PathElementKind, SourceItem};

    #[test]
    fn test_parse_empty_source() {
        let file = parse("\n\n").unwrap();
        assert!(file.items().is_empty());
    }

    #[test]
    fn test_parse_component_header() {
        let file = parse("$my_app $mol_view\n").unwrap();
        let comp = file.components().next().unwrap();
        assert_eq!(comp.name, "$my_app");
        assert_eq!(comp.base, "$mol_view");
        assert!(comp.body.is_empty());
    }

    #[test]
    fn test_missing_base_error() {
        let result = parse("$my_app\n");
        assert!(matches!(result, Err(ParseError::MissingBase { .. })));
    }

    #[test]
    fn test_extra_header_token_error() {
        let result = parse("$a $b $c\n");
        assert!(matches!(result, Err(ParseError::UnexpectedToken { .. })));
    }

    #[test]
    fn test_nested_nodes() {
        let file = parse("$a $b\n\tsub /\n\t\t<= Body $mol_page\n").unwrap();
        let comp = file.components().next().unwrap();
        assert_eq!(comp.body.len(), 1);
        let node = comp.body[0].as_node().unwrap();
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_typed_list() {
        let file = parse("$a $b\n\tparams /string\n\titems /$mol_view\n\tfree /\n").unwrap();
        let comp = file.components().next().unwrap();
        let kinds: Vec<&PathElementKind> = comp
            .body
            .iter()
            .map(|n| &n.as_node().unwrap().path[1].kind)
            .collect();
        assert!(matches!(kinds[0], PathElementKind::TypedList(_)));
        assert!(matches!(kinds[1], PathElementKind::TypedList(_)));
        assert!(matches!(kinds[2], PathElementKind::ListMarker));
    }

    #[test]
    fn test_invalid_list_type() {
        let result = parse("$a $b\n\tparams /object\n");
        assert!(matches!(result, Err(ParseError::InvalidListType { .. })));
    }

    #[test]
    fn test_separated_slash_is_list_marker() {
        let file = parse("$a $b\n\titems / string\n").unwrap();
        let comp = file.components().next().unwrap();
        let node = comp.body[0].as_node().unwrap();
        assert!(matches!(node.path[1].kind, PathElementKind::ListMarker));
    }

    #[test]
    fn test_top_level_comment() {
        let file = parse("- scratch file\n$a $b\n").unwrap();
        assert_eq!(file.items().len(), 2);
        assert!(matches!(file.items()[0], SourceItem::Comment(_)));
    }

    #[test]
    fn test_stray_top_level_token() {
        let result = parse("title \\Hello\n");
        assert!(matches!(result, Err(ParseError::UnexpectedToken { .. })));
    }
}
