use crate::function::markup::error::MarkupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// `<?...?>`
    Declaration,
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    /// Character data with entities resolved. Whitespace-only runs are dropped.
    Text(String),

    Eof,
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token>, MarkupError> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let start = i;

        if bytes[i] != b'<' {
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            let raw = &input[start..i];
            if !raw.trim().is_empty() {
                out.push(Token {
                    kind: TokenKind::Text(unescape(raw, start)?),
                    span: Span { start, end: i },
                });
            }
            continue;
        }

        let rest = &input[i..];
        if rest.starts_with("<?") {
            i = skip_past(input, i, "?>", "unterminated declaration")?;
            out.push(Token {
                kind: TokenKind::Declaration,
                span: Span { start, end: i },
            });
            continue;
        }
        if rest.starts_with("<!--") {
            i = skip_past(input, i, "-->", "unterminated comment")?;
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            let body = i + "<![CDATA[".len();
            i = skip_past(input, i, "]]>", "unterminated CDATA section")?;
            out.push(Token {
                kind: TokenKind::Text(input[body..i - 3].to_owned()),
                span: Span { start, end: i },
            });
            continue;
        }
        if rest.starts_with("<!") {
            // DOCTYPE and friends carry nothing we use
            i = skip_past(input, i, ">", "unterminated markup declaration")?;
            continue;
        }

        if rest.starts_with("</") {
            i += 2;
            let name = read_name(input, &mut i)?;
            skip_ws(bytes, &mut i);
            if i >= bytes.len() || bytes[i] != b'>' {
                return Err(MarkupError::new(i, format!("expected '>' to close </{name}")));
            }
            i += 1;
            out.push(Token {
                kind: TokenKind::EndTag(name),
                span: Span { start, end: i },
            });
            continue;
        }

        i += 1;
        let name = read_name(input, &mut i)?;
        let mut attributes = Vec::new();
        let self_closing = loop {
            skip_ws(bytes, &mut i);
            if i >= bytes.len() {
                return Err(MarkupError::new(start, format!("unterminated tag <{name}")));
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break false;
                }
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return Err(MarkupError::new(i, "expected '>' after '/'"));
                    }
                    i += 2;
                    break true;
                }
                _ => {
                    let key = read_name(input, &mut i)?;
                    skip_ws(bytes, &mut i);
                    if bytes.get(i) != Some(&b'=') {
                        return Err(MarkupError::new(
                            i,
                            format!("expected '=' after attribute {key}"),
                        ));
                    }
                    i += 1;
                    skip_ws(bytes, &mut i);
                    let quote = match bytes.get(i) {
                        Some(&q @ (b'"' | b'\'')) => q,
                        _ => {
                            return Err(MarkupError::new(
                                i,
                                format!("expected quoted value for attribute {key}"),
                            ));
                        }
                    };
                    i += 1;
                    let value_start = i;
                    while i < bytes.len() && bytes[i] != quote {
                        i += 1;
                    }
                    if i >= bytes.len() {
                        return Err(MarkupError::new(
                            value_start,
                            format!("unterminated value for attribute {key}"),
                        ));
                    }
                    let value = unescape(&input[value_start..i], value_start)?;
                    i += 1;
                    attributes.push((key, value));
                }
            }
        };
        out.push(Token {
            kind: TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            },
            span: Span { start, end: i },
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span {
            start: input.len(),
            end: input.len(),
        },
    });

    Ok(out)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn skip_past(input: &str, from: usize, terminator: &str, what: &str) -> Result<usize, MarkupError> {
    input[from..]
        .find(terminator)
        .map(|k| from + k + terminator.len())
        .ok_or_else(|| MarkupError::new(from, what))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.')
}

fn read_name(input: &str, i: &mut usize) -> Result<String, MarkupError> {
    let bytes = input.as_bytes();
    let start = *i;
    if start >= bytes.len() || !(bytes[start].is_ascii_alphabetic() || bytes[start] == b'_') {
        return Err(MarkupError::new(start, "expected a name"));
    }
    while *i < bytes.len() && is_name_byte(bytes[*i]) {
        *i += 1;
    }
    Ok(input[start..*i].to_owned())
}

/// Resolve the predefined and numeric character references in `raw`.
fn unescape(raw: &str, offset: usize) -> Result<String, MarkupError> {
    if !raw.contains('&') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let at = offset + (raw.len() - rest.len()) + amp;
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| MarkupError::new(at, "unterminated entity reference"))?;
        let entity = &after[..semi];
        let c = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    MarkupError::new(at, format!("unknown entity &{entity};"))
                })?
            }
        };
        out.push(c);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
