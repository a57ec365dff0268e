//! Parser helper functions.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListItem, Mailbox, MailboxAttribute, Namespace, NamespacePrefix,
    ResponseCode, SeqNum, Uid, UidValidity,
};
use crate::{Error, Result};

/// Parses a bracketed response code.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = read_u32(lexer)?;
            let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid UID 0".to_string(),
            })?;
            ResponseCode::UidNext(uid)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = read_u32(lexer)?;
            let validity = UidValidity::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid UIDVALIDITY 0".to_string(),
            })?;
            ResponseCode::UidValidity(validity)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let n = read_u32(lexer)?;
            let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid sequence number 0".to_string(),
            })?;
            ResponseCode::Unseen(seq)
        }
        "HIGHESTMODSEQ" => {
            lexer.expect_space()?;
            ResponseCode::HighestModSeq(lexer.read_number()?)
        }
        "CAPABILITY" => {
            let caps = parse_capability_data(lexer)?;
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags)
        }
        _ => ResponseCode::Unknown(upper),
    };

    // Skip unparsed code arguments up to the closing bracket.
    while lexer.peek() != Some(b']') && !lexer.is_eof() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Reads a number that must fit in 32 bits.
pub fn read_u32(lexer: &mut Lexer<'_>) -> Result<u32> {
    let n = lexer.read_number()?;
    u32::try_from(n).map_err(|_| Error::Parse {
        position: lexer.position(),
        message: format!("Number out of range: {n}"),
    })
}

/// Parses space-separated capability atoms until end of line.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }

    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Space => continue,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in flag list: {token:?}"),
                });
            }
        }
    }

    Ok(flags)
}

/// Parses a LIST/LSUB response body.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListItem> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            Token::Space => continue,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in LIST attributes: {token:?}"),
                });
            }
        }
    }

    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("Expected delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let mailbox_name = lexer.read_astring()?;

    Ok(ListItem {
        attributes,
        delimiter,
        mailbox: Mailbox::new(mailbox_name),
    })
}

/// Parses a SEARCH response: space-separated message numbers.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut nums = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Number(n) = lexer.next_token()?
            && let Ok(n) = u32::try_from(n)
        {
            nums.push(n);
        }
    }

    Ok(nums)
}

/// Parses a NAMESPACE response: three slots, each NIL or a list of
/// `(prefix delimiter)` pairs.
pub fn parse_namespace_response(lexer: &mut Lexer<'_>) -> Result<Namespace> {
    let personal = parse_namespace_slot(lexer)?;
    lexer.expect_space()?;
    let users = parse_namespace_slot(lexer)?;
    lexer.expect_space()?;
    let shared = parse_namespace_slot(lexer)?;

    Ok(Namespace {
        personal,
        users,
        shared,
    })
}

fn parse_namespace_slot(lexer: &mut Lexer<'_>) -> Result<Option<Vec<NamespacePrefix>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let mut prefixes = Vec::new();

            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    Some(b'(') => {
                        lexer.advance();
                        let prefix = lexer.read_astring()?;
                        lexer.expect_space()?;
                        let delimiter = match lexer.next_token()? {
                            Token::Nil => None,
                            Token::QuotedString(s) => s.chars().next(),
                            token => {
                                return Err(Error::Parse {
                                    position: lexer.position(),
                                    message: format!("Expected delimiter, got {token:?}"),
                                });
                            }
                        };
                        // Skip namespace extension data up to the pair close.
                        let mut depth = 0usize;
                        loop {
                            match lexer.advance() {
                                Some(b'(') => depth += 1,
                                Some(b')') if depth == 0 => break,
                                Some(b')') => depth -= 1,
                                Some(_) => {}
                                None => break,
                            }
                        }
                        prefixes.push(NamespacePrefix { prefix, delimiter });
                    }
                    _ => break,
                }
            }

            Ok(Some(prefixes))
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected namespace slot, got {token:?}"),
        }),
    }
}

/// Parses an ID response: NIL or `(key value ...)` with keys lowercased.
pub fn parse_id_response(lexer: &mut Lexer<'_>) -> Result<Option<Vec<(String, String)>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let mut params = Vec::new();

            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => continue,
                    Token::QuotedString(key) => {
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        params.push((key.to_lowercase(), value));
                    }
                    Token::Literal(key) => {
                        let key = String::from_utf8_lossy(&key).to_lowercase();
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        params.push((key, value));
                    }
                    token => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("Unexpected token in ID params: {token:?}"),
                        });
                    }
                }
            }

            Ok(Some(params))
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected ID data, got {token:?}"),
        }),
    }
}

/// Reads text until CRLF (or end of input).
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();

    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.skip(2);
    }

    String::from_utf8_lossy(&remaining[..end]).to_string()
}
