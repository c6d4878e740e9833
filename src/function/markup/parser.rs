use crate::function::markup::error::MarkupError;
use crate::function::markup::lexer::{Span, Token, TokenKind, lex};

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) content: Vec<Content>,
    pub(crate) offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Element(Element),
    Text { text: String, offset: usize },
}

impl Element {
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Deepest element nesting a document may have.
pub(crate) const MAX_DEPTH: usize = 512;

/// Parse a whole document into its single root element.
pub(crate) fn parse_document(src: &str) -> Result<Element, MarkupError> {
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };

    p.skip_declarations();
    let root = p.parse_element(1)?;
    p.skip_declarations();
    match &p.peek().kind {
        TokenKind::Eof => Ok(root),
        TokenKind::Text(_) => Err(MarkupError::new(
            p.span().start,
            "character data after the document element",
        )),
        _ => Err(MarkupError::new(
            p.span().start,
            "more than one document element",
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn skip_declarations(&mut self) {
        while self.peek().kind == TokenKind::Declaration {
            self.bump();
        }
    }

    fn parse_element(&mut self, depth: usize) -> Result<Element, MarkupError> {
        let Token { kind, span } = self.bump();
        let (name, attributes, self_closing) = match kind {
            TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            } => (name, attributes, self_closing),
            TokenKind::Eof => return Err(MarkupError::new(span.start, "no document element")),
            other => {
                return Err(MarkupError::new(
                    span.start,
                    format!("expected a start tag, found {other:?}"),
                ));
            }
        };

        let mut element = Element {
            name,
            attributes,
            content: Vec::new(),
            offset: span.start,
        };
        if self_closing {
            return Ok(element);
        }
        if depth > MAX_DEPTH {
            return Err(MarkupError::new(
                span.start,
                format!("elements nested deeper than {MAX_DEPTH} levels"),
            ));
        }

        loop {
            match &self.peek().kind {
                TokenKind::StartTag { .. } => {
                    let child = self.parse_element(depth + 1)?;
                    element.content.push(Content::Element(child));
                }
                TokenKind::Text(_) => {
                    let Token { kind, span } = self.bump();
                    if let TokenKind::Text(text) = kind {
                        element.content.push(Content::Text {
                            text,
                            offset: span.start,
                        });
                    }
                }
                TokenKind::EndTag(name) => {
                    if *name != element.name {
                        return Err(MarkupError::new(
                            self.span().start,
                            format!("expected </{}>, found </{name}>", element.name),
                        ));
                    }
                    self.bump();
                    return Ok(element);
                }
                TokenKind::Declaration => {
                    self.bump();
                }
                TokenKind::Eof => {
                    return Err(MarkupError::new(
                        self.span().start,
                        format!("missing </{}>", element.name),
                    ));
                }
            }
        }
    }
}
