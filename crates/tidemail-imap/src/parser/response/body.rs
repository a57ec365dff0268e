//! BODYSTRUCTURE parsing.
//!
//! The BODYSTRUCTURE grammar is recursive: a node whose first element is
//! itself a list is a multipart container, anything else is a leaf. Child
//! nodes get dotted part paths, 1-indexed within their parent; the nested
//! node of a `message/rfc822` part shares its parent's path. Trailing
//! extension fields may be absent at any point and are left unset.

use crate::parser::lexer::{Lexer, Token};
use crate::{Error, Result};

use super::fetch::parse_envelope;
use super::types::BodyStructure;

/// Parses a BODYSTRUCTURE value.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    parse_node(lexer, &[])
}

#[allow(clippy::too_many_lines)]
fn parse_node(lexer: &mut Lexer<'_>, path: &[u32]) -> Result<BodyStructure> {
    lexer.expect(Token::LParen)?;

    let mut node = BodyStructure {
        part: (!path.is_empty()).then(|| {
            path.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        }),
        ..BodyStructure::default()
    };

    skip_spaces(lexer);

    if lexer.peek() == Some(b'(') {
        // Multipart: contiguous leading lists are the children.
        let mut index = 1u32;
        while lexer.peek() == Some(b'(') {
            let mut child_path = path.to_vec();
            child_path.push(index);
            node.child_nodes.push(parse_node(lexer, &child_path)?);
            index += 1;
            skip_spaces(lexer);
        }

        let subtype = read_string_value(lexer)?.unwrap_or_default();
        node.media_type = format!("multipart/{}", subtype.to_lowercase());

        if has_more(lexer) {
            node.parameters = parse_parameter_list(lexer)?;
        }
        if has_more(lexer) {
            parse_disposition(lexer, &mut node)?;
        }
        if has_more(lexer) {
            node.language = parse_language(lexer)?;
        }
        if has_more(lexer) {
            node.location = read_string_value(lexer)?;
        }
    } else {
        // Leaf: type and subtype first.
        let media_type = read_string_value(lexer)?.unwrap_or_default().to_lowercase();
        skip_spaces(lexer);
        let subtype = read_string_value(lexer)?.unwrap_or_default().to_lowercase();
        node.media_type = format!("{media_type}/{subtype}");

        skip_spaces(lexer);
        node.parameters = parse_parameter_list(lexer)?;

        skip_spaces(lexer);
        node.id = read_string_value(lexer)?;

        skip_spaces(lexer);
        node.description = read_string_value(lexer)?;

        skip_spaces(lexer);
        node.encoding = read_string_value(lexer)?.map(|e| e.to_lowercase());

        skip_spaces(lexer);
        if let Ok(size) = lexer.read_number() {
            node.size = Some(size);
        }

        if node.media_type == "message/rfc822" {
            if has_more(lexer) {
                node.envelope = Some(Box::new(parse_envelope(lexer)?));
            }
            if has_more(lexer) {
                // The nested message shares the parent's part path.
                node.child_nodes.push(parse_node(lexer, path)?);
            }
            if has_more(lexer) {
                node.line_count = Some(lexer.read_number()?);
            }
        } else if media_type == "text" && has_more(lexer) {
            node.line_count = Some(lexer.read_number()?);
        }

        if has_more(lexer) {
            node.md5 = read_string_value(lexer)?;
        }
        if has_more(lexer) {
            parse_disposition(lexer, &mut node)?;
        }
        if has_more(lexer) {
            node.language = parse_language(lexer)?;
        }
        if has_more(lexer) {
            node.location = read_string_value(lexer)?;
        }
    }

    skip_to_close(lexer);
    Ok(node)
}

/// Skips spaces; returns true when another field follows before the
/// closing parenthesis.
fn has_more(lexer: &mut Lexer<'_>) -> bool {
    skip_spaces(lexer);
    !matches!(lexer.peek(), Some(b')') | None)
}

fn skip_spaces(lexer: &mut Lexer<'_>) {
    while lexer.peek() == Some(b' ') {
        lexer.advance();
    }
}

/// Reads a string-ish value: NIL, quoted, literal, atom, or number.
fn read_string_value(lexer: &mut Lexer<'_>) -> Result<Option<String>> {
    skip_spaces(lexer);
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::QuotedString(s) => Ok(Some(s)),
        Token::Literal(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
        Token::Atom(s) => Ok(Some(s.to_string())),
        Token::Number(n) => Ok(Some(n.to_string())),
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected body field, got {token:?}"),
        }),
    }
}

/// Parses a parameter list: NIL or `(key value ...)` with keys lowercased
/// and values stringified.
fn parse_parameter_list(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    skip_spaces(lexer);
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                skip_spaces(lexer);
                if lexer.peek() == Some(b')') {
                    lexer.advance();
                    break;
                }
                let Some(key) = read_string_value(lexer)? else {
                    continue;
                };
                let value = read_string_value(lexer)?.unwrap_or_default();
                params.push((key.to_lowercase(), value));
            }
            Ok(params)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected parameter list, got {token:?}"),
        }),
    }
}

/// Parses disposition data: NIL or `(type (params))`.
fn parse_disposition(lexer: &mut Lexer<'_>, node: &mut BodyStructure) -> Result<()> {
    skip_spaces(lexer);
    match lexer.next_token()? {
        Token::Nil => Ok(()),
        Token::LParen => {
            node.disposition = read_string_value(lexer)?.map(|d| d.to_lowercase());
            skip_spaces(lexer);
            if lexer.peek() != Some(b')') {
                node.disposition_parameters = parse_parameter_list(lexer)?;
            }
            skip_spaces(lexer);
            if lexer.peek() == Some(b')') {
                lexer.advance();
            }
            Ok(())
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected disposition, got {token:?}"),
        }),
    }
}

/// Parses language data: NIL, a single string, or a list of strings.
fn parse_language(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    skip_spaces(lexer);
    if lexer.peek() == Some(b'(') {
        lexer.advance();
        let mut langs = Vec::new();
        loop {
            skip_spaces(lexer);
            if lexer.peek() == Some(b')') {
                lexer.advance();
                break;
            }
            if let Some(lang) = read_string_value(lexer)? {
                langs.push(lang.to_lowercase());
            }
        }
        Ok(langs)
    } else {
        Ok(read_string_value(lexer)?
            .map(|l| vec![l.to_lowercase()])
            .unwrap_or_default())
    }
}

/// Consumes any unparsed extension data up to the node's closing
/// parenthesis.
fn skip_to_close(lexer: &mut Lexer<'_>) {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    while let Some(b) = lexer.peek() {
        lexer.advance();
        if in_quotes {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_quotes = false;
            }
            continue;
        }
        match b {
            b'"' => in_quotes = true,
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> BodyStructure {
        let mut lexer = Lexer::new(input);
        parse_body_structure(&mut lexer).unwrap()
    }

    #[test]
    fn test_text_leaf() {
        let node = parse(
            b"(\"TEXT\" \"PLAIN\" (\"CHARSET\" \"ISO-8859-1\") NIL NIL \"QUOTED-PRINTABLE\" 1292 23)",
        );
        assert_eq!(node.media_type, "text/plain");
        assert_eq!(node.part, None);
        assert_eq!(
            node.parameters,
            vec![("charset".to_string(), "ISO-8859-1".to_string())]
        );
        assert_eq!(node.encoding.as_deref(), Some("quoted-printable"));
        assert_eq!(node.size, Some(1292));
        assert_eq!(node.line_count, Some(23));
        assert!(node.child_nodes.is_empty());
    }

    #[test]
    fn test_leaf_without_line_count() {
        let node = parse(b"(\"APPLICATION\" \"PDF\" (\"NAME\" \"doc.pdf\") NIL NIL \"BASE64\" 102400)");
        assert_eq!(node.media_type, "application/pdf");
        assert_eq!(node.size, Some(102_400));
        assert_eq!(node.line_count, None);
    }

    #[test]
    fn test_multipart_child_paths() {
        let node = parse(
            b"((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 100 5)(\"TEXT\" \"HTML\" NIL NIL NIL \"7BIT\" 500 20) \"ALTERNATIVE\" (\"BOUNDARY\" \"xyz\"))",
        );
        assert_eq!(node.media_type, "multipart/alternative");
        assert_eq!(node.part, None);
        assert_eq!(
            node.parameters,
            vec![("boundary".to_string(), "xyz".to_string())]
        );
        assert_eq!(node.child_nodes.len(), 2);
        assert_eq!(node.child_nodes[0].part.as_deref(), Some("1"));
        assert_eq!(node.child_nodes[0].media_type, "text/plain");
        assert_eq!(node.child_nodes[1].part.as_deref(), Some("2"));
        assert_eq!(node.child_nodes[1].media_type, "text/html");
    }

    #[test]
    fn test_nested_multipart_dotted_paths() {
        let node = parse(
            b"((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 10 1)((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 10 1)(\"TEXT\" \"HTML\" NIL NIL NIL \"7BIT\" 10 1) \"ALTERNATIVE\") \"MIXED\")",
        );
        assert_eq!(node.media_type, "multipart/mixed");
        assert_eq!(node.child_nodes[1].media_type, "multipart/alternative");
        assert_eq!(node.child_nodes[1].part.as_deref(), Some("2"));
        assert_eq!(node.child_nodes[1].child_nodes[0].part.as_deref(), Some("2.1"));
        assert_eq!(node.child_nodes[1].child_nodes[1].part.as_deref(), Some("2.2"));
    }

    #[test]
    fn test_message_rfc822() {
        let node = parse(
            b"(\"MESSAGE\" \"RFC822\" NIL NIL NIL \"7BIT\" 3028 (NIL \"fwd\" NIL NIL NIL NIL NIL NIL NIL NIL) (\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 100 5) 62)",
        );
        assert_eq!(node.media_type, "message/rfc822");
        assert_eq!(node.size, Some(3028));
        assert_eq!(node.line_count, Some(62));
        let env = node.envelope.as_ref().unwrap();
        assert_eq!(env.subject.as_deref(), Some("fwd"));
        // The nested node shares the parent's path
        assert_eq!(node.child_nodes.len(), 1);
        assert_eq!(node.child_nodes[0].part, None);
        assert_eq!(node.child_nodes[0].media_type, "text/plain");
    }

    #[test]
    fn test_extension_data() {
        let node = parse(
            b"(\"APPLICATION\" \"OCTET-STREAM\" NIL NIL NIL \"BASE64\" 2048 NIL (\"ATTACHMENT\" (\"FILENAME\" \"data.bin\")) (\"EN\" \"DE\") \"http://example.com/data\")",
        );
        assert_eq!(node.disposition.as_deref(), Some("attachment"));
        assert_eq!(
            node.disposition_parameters,
            vec![("filename".to_string(), "data.bin".to_string())]
        );
        assert_eq!(node.language, vec!["en".to_string(), "de".to_string()]);
        assert_eq!(node.location.as_deref(), Some("http://example.com/data"));
    }

    #[test]
    fn test_single_language_string() {
        let node =
            parse(b"(\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 10 1 NIL NIL \"en\")");
        assert_eq!(node.language, vec!["en".to_string()]);
    }

    #[test]
    fn test_truncated_extensions_tolerated() {
        // Nothing after size: all extension fields stay unset
        let node = parse(b"(\"IMAGE\" \"PNG\" NIL NIL NIL \"BASE64\" 512)");
        assert_eq!(node.media_type, "image/png");
        assert!(node.md5.is_none());
        assert!(node.disposition.is_none());
        assert!(node.language.is_empty());
        assert!(node.location.is_none());
    }

    #[test]
    fn test_multipart_disposition() {
        let node = parse(
            b"((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 10 1) \"MIXED\" (\"BOUNDARY\" \"b\") (\"INLINE\" NIL) NIL NIL)",
        );
        assert_eq!(node.disposition.as_deref(), Some("inline"));
        assert!(node.disposition_parameters.is_empty());
    }
}
