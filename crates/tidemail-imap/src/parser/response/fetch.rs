//! FETCH response parsing.
//!
//! Each FETCH line carries a parenthesized list of key/value pairs. Keys
//! are canonicalized to their lowercase wire form; a trailing `<n>` origin
//! suffix is stripped from the key while `<offset.length>` forms (as
//! echoed for partial fetches) stay part of it.

use tidemail_mime::decode_rfc2047;

use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;
use crate::{Error, Result};

use super::helpers::{parse_flag_list, read_u32};
use super::types::{Address, Envelope, FetchField};

/// Parses the parenthesized data-item list of a FETCH response.
pub fn parse_fetch_fields(lexer: &mut Lexer<'_>) -> Result<Vec<FetchField>> {
    lexer.expect(Token::LParen)?;

    let mut fields = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => continue,
            Token::Atom(name) => {
                let key = read_canonical_key(lexer, name);
                fields.push(parse_field(lexer, &key)?);
            }
            Token::Eof => break,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in FETCH items: {token:?}"),
                });
            }
        }
    }

    Ok(fields)
}

/// Builds the canonical lowercase key for a data item, consuming any
/// `[section]` and `<...>` suffix directly from the input.
fn read_canonical_key(lexer: &mut Lexer<'_>, name: &str) -> String {
    let mut key = name.to_lowercase();

    if lexer.peek() == Some(b'[') {
        key.push('[');
        lexer.advance();
        let mut in_quotes = false;
        while let Some(b) = lexer.peek() {
            lexer.advance();
            if b == b'"' {
                in_quotes = !in_quotes;
            }
            if b == b']' && !in_quotes {
                key.push(']');
                break;
            }
            key.push(char::from(b.to_ascii_lowercase()));
        }
    }

    if lexer.peek() == Some(b'<') {
        while let Some(b) = lexer.peek() {
            lexer.advance();
            key.push(char::from(b));
            if b == b'>' {
                break;
            }
        }
    }

    // A bare `<n>` origin marker is not part of the key; an explicit
    // `<offset.length>` echo is.
    if let Some(open) = key.rfind('<')
        && key.ends_with('>')
        && key[open + 1..key.len() - 1]
            .bytes()
            .all(|b| b.is_ascii_digit())
        && !key[open..].is_empty()
    {
        key.truncate(open);
    }

    key
}

/// Parses the value for one data item, dispatching on the canonical key.
fn parse_field(lexer: &mut Lexer<'_>, key: &str) -> Result<FetchField> {
    lexer.expect_space()?;

    match key {
        "uid" => {
            let n = read_u32(lexer)?;
            let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid UID 0".to_string(),
            })?;
            Ok(FetchField::Uid(uid))
        }
        "rfc822.size" => Ok(FetchField::Size(read_u32(lexer)?)),
        "modseq" => {
            // The value arrives as a one-element list: (12345)
            lexer.expect(Token::LParen)?;
            let n = lexer.read_number()?;
            lexer.expect(Token::RParen)?;
            Ok(FetchField::ModSeq(n))
        }
        "flags" => Ok(FetchField::Flags(parse_flag_list(lexer)?)),
        "internaldate" => match lexer.next_token()? {
            Token::QuotedString(date) => Ok(FetchField::InternalDate(date)),
            token => Err(Error::Parse {
                position: lexer.position(),
                message: format!("Expected INTERNALDATE string, got {token:?}"),
            }),
        },
        "envelope" => Ok(FetchField::Envelope(Box::new(parse_envelope(lexer)?))),
        "bodystructure" => Ok(FetchField::BodyStructure(Box::new(
            super::body::parse_body_structure(lexer)?,
        ))),
        "body" if lexer.peek() == Some(b'(') => Ok(FetchField::BodyStructure(Box::new(
            super::body::parse_body_structure(lexer)?,
        ))),
        _ => Ok(FetchField::Data {
            key: key.to_string(),
            value: read_scalar_value(lexer)?,
        }),
    }
}

/// Reads a scalar item value verbatim.
///
/// Parenthesized values (unknown list-shaped items) are captured as their
/// raw text so nothing is silently dropped.
fn read_scalar_value(lexer: &mut Lexer<'_>) -> Result<Option<String>> {
    if lexer.peek() == Some(b'(') {
        return Ok(Some(read_raw_list(lexer)));
    }

    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::QuotedString(s) => Ok(Some(s)),
        Token::Literal(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
        Token::Number(n) => Ok(Some(n.to_string())),
        Token::Atom(s) => Ok(Some(s.to_string())),
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected FETCH item value, got {token:?}"),
        }),
    }
}

/// Captures a balanced parenthesized expression as raw text.
fn read_raw_list(lexer: &mut Lexer<'_>) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;

    while let Some(b) = lexer.peek() {
        lexer.advance();
        out.push(char::from(b));
        match b {
            b'"' => in_quotes = !in_quotes,
            b'(' if !in_quotes => depth += 1,
            b')' if !in_quotes => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    out
}

/// Parses the positional ENVELOPE 10-tuple.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;

    let subject = lexer.read_nstring()?.map(|s| decode_rfc2047(&s));
    lexer.expect_space()?;

    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;

    let message_id = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list: NIL or a list of `(name adl mailbox host)`.
fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();

            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => break,
                }
            }

            Ok(addresses)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected address list, got {token:?}"),
        }),
    }
}

/// Parses one address 4-tuple into `{name, address}`.
fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;

    // Source route, obsolete
    let _adl = lexer.read_nstring()?;
    lexer.expect_space()?;

    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;

    let host = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    let address = match (mailbox, host) {
        (Some(m), Some(h)) => Some(format!("{m}@{h}")),
        _ => None,
    };

    Ok(Address {
        name: name.map(|n| decode_rfc2047(&n)),
        address,
    })
}
