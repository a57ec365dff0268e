//! IMAP response parser.
//!
//! Parses one complete server response (a CRLF-terminated line plus any
//! embedded literals) into a typed [`Response`].

#![allow(clippy::missing_errors_doc)]

mod body;
mod fetch;
mod helpers;
mod types;

pub use types::{Address, BodyStructure, Envelope, FetchField, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_capability_data, parse_flag_list, parse_id_response, parse_list_response,
    parse_namespace_response, parse_response_code, parse_search_response, read_text_until_crlf,
};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data after `+`.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Self::parse_continuation(&mut lexer),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::Parse {
                position: 0,
                message: format!("Expected *, +, or tag, got {token:?}"),
            }),
        }
    }

    /// Parses a tagged response.
    fn parse_tagged(lexer: &mut Lexer<'_>, tag_str: &str) -> Result<Response> {
        lexer.expect_space()?;

        let status = Self::parse_status(lexer)?;
        lexer.expect_space()?;

        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag_str),
            status,
            code,
            text,
        })
    }

    /// Parses an untagged response.
    #[allow(clippy::too_many_lines)]
    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let token = lexer.next_token()?;

        match token {
            Token::Atom(s) => {
                let upper = s.to_uppercase();
                match upper.as_str() {
                    "OK" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Ok { code, text }))
                    }
                    "NO" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::No { code, text }))
                    }
                    "BAD" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Bad { code, text }))
                    }
                    "PREAUTH" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::PreAuth { code, text }))
                    }
                    "BYE" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Bye { code, text }))
                    }
                    "CAPABILITY" => {
                        let caps = parse_capability_data(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Capability(caps)))
                    }
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Flags(flags)))
                    }
                    "LIST" => {
                        lexer.expect_space()?;
                        let item = parse_list_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::List(item)))
                    }
                    "LSUB" => {
                        lexer.expect_space()?;
                        let item = parse_list_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Lsub(item)))
                    }
                    "SEARCH" => {
                        let nums = parse_search_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Search(nums)))
                    }
                    "NAMESPACE" => {
                        lexer.expect_space()?;
                        let ns = parse_namespace_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Namespace(ns)))
                    }
                    "ID" => {
                        lexer.expect_space()?;
                        let id = parse_id_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Id(id)))
                    }
                    _ => Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("Unknown untagged response: {s}"),
                    }),
                }
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;
                let upper = keyword.to_uppercase();
                let n32 = u32::try_from(n).map_err(|_| Error::Parse {
                    position: lexer.position(),
                    message: format!("Message number out of range: {n}"),
                })?;

                match upper.as_str() {
                    "EXISTS" => Ok(Response::Untagged(UntaggedResponse::Exists(n32))),
                    "RECENT" => Ok(Response::Untagged(UntaggedResponse::Recent(n32))),
                    "EXPUNGE" => {
                        let seq = SeqNum::new(n32).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "Invalid sequence number 0".to_string(),
                        })?;
                        Ok(Response::Untagged(UntaggedResponse::Expunge(seq)))
                    }
                    "FETCH" => {
                        let seq = SeqNum::new(n32).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "Invalid sequence number 0".to_string(),
                        })?;
                        lexer.expect_space()?;
                        let fields = fetch::parse_fetch_fields(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Fetch { seq, fields }))
                    }
                    _ => Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("Unknown message data: {keyword}"),
                    }),
                }
            }
            _ => Err(Error::Parse {
                position: lexer.position(),
                message: format!("Unexpected token in untagged response: {token:?}"),
            }),
        }
    }

    /// Parses a continuation response.
    fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<Response> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Ok(Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        })
    }

    /// Parses a status keyword.
    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(Error::Parse {
                position: lexer.position(),
                message: format!("Invalid status: {s}"),
            }),
        }
    }

    /// Parses response text with optional leading response code.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Ok((code, text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::{Capability, Flag};

    use super::*;

    #[test]
    fn test_parse_greeting_with_capability_code() {
        let input = b"* OK [CAPABILITY IMAP4rev1 IDLE AUTH=XOAUTH2] ready\r\n";
        let response = ResponseParser::parse(input).unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                match code {
                    Some(ResponseCode::Capability(caps)) => {
                        assert!(caps.contains(&Capability::Idle));
                        assert!(caps.contains(&Capability::Auth("XOAUTH2".to_string())));
                    }
                    other => panic!("Expected capability code, got {other:?}"),
                }
                assert_eq!(text, "ready");
            }
            _ => panic!("Expected untagged OK"),
        }
    }

    #[test]
    fn test_parse_tagged_no_with_code() {
        let input = b"W0003 NO [NONEXISTENT] Unknown Mailbox\r\n";
        let response = ResponseParser::parse(input).unwrap();

        match response {
            Response::Tagged {
                tag,
                status,
                code,
                text,
            } => {
                assert_eq!(tag.as_str(), "W0003");
                assert_eq!(status, Status::No);
                assert_eq!(
                    code,
                    Some(ResponseCode::Unknown("NONEXISTENT".to_string()))
                );
                assert_eq!(text, "Unknown Mailbox");
            }
            _ => panic!("Expected tagged response"),
        }
    }

    #[test]
    fn test_parse_capability_line() {
        let input = b"* CAPABILITY IMAP4rev1 IDLE NAMESPACE UIDPLUS\r\n";
        let response = ResponseParser::parse(input).unwrap();

        match response {
            Response::Untagged(UntaggedResponse::Capability(caps)) => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::Idle));
                assert!(caps.contains(&Capability::UidPlus));
            }
            _ => panic!("Expected capability response"),
        }
    }

    #[test]
    fn test_parse_exists_and_expunge() {
        match ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap() {
            Response::Untagged(UntaggedResponse::Exists(n)) => assert_eq!(n, 23),
            other => panic!("Expected EXISTS, got {other:?}"),
        }
        match ResponseParser::parse(b"* 3 EXPUNGE\r\n").unwrap() {
            Response::Untagged(UntaggedResponse::Expunge(seq)) => assert_eq!(seq.get(), 3),
            other => panic!("Expected EXPUNGE, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_flags_line() {
        let input = b"* FLAGS (\\Answered \\Flagged)\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Flags(flags)) => {
                assert!(flags.contains(&Flag::Answered));
                assert!(flags.contains(&Flag::Flagged));
            }
            other => panic!("Expected FLAGS, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_and_lsub() {
        let input = b"* LIST (\\HasChildren) \"/\" \"INBOX\"\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::List(item)) => {
                assert_eq!(item.delimiter, Some('/'));
                assert_eq!(item.mailbox.as_str(), "INBOX");
            }
            other => panic!("Expected LIST, got {other:?}"),
        }

        let input = b"* LSUB () \"/\" \"Sent\"\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Lsub(item)) => {
                assert_eq!(item.mailbox.as_str(), "Sent");
            }
            other => panic!("Expected LSUB, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_line() {
        let input = b"* SEARCH 5 7\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Search(nums)) => {
                assert_eq!(nums, vec![5, 7]);
            }
            other => panic!("Expected SEARCH, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_search() {
        match ResponseParser::parse(b"* SEARCH\r\n").unwrap() {
            Response::Untagged(UntaggedResponse::Search(nums)) => assert!(nums.is_empty()),
            other => panic!("Expected SEARCH, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_namespace_line() {
        let input = b"* NAMESPACE ((\"\" \"/\")) NIL ((\"Shared/\" \"/\"))\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Namespace(ns)) => {
                let personal = ns.personal.unwrap();
                assert_eq!(personal[0].prefix, "");
                assert_eq!(personal[0].delimiter, Some('/'));
                assert!(ns.users.is_none());
                let shared = ns.shared.unwrap();
                assert_eq!(shared[0].prefix, "Shared/");
            }
            other => panic!("Expected NAMESPACE, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_id_line() {
        let input = b"* ID (\"Name\" \"Dovecot\" \"version\" \"2.3\")\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Id(Some(params))) => {
                assert_eq!(params[0], ("name".to_string(), "Dovecot".to_string()));
                assert_eq!(params[1], ("version".to_string(), "2.3".to_string()));
            }
            other => panic!("Expected ID, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_id_nil() {
        match ResponseParser::parse(b"* ID NIL\r\n").unwrap() {
            Response::Untagged(UntaggedResponse::Id(None)) => {}
            other => panic!("Expected ID NIL, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_continuation() {
        match ResponseParser::parse(b"+ Ready for literal\r\n").unwrap() {
            Response::Continuation { text } => {
                assert_eq!(text.as_deref(), Some("Ready for literal"));
            }
            other => panic!("Expected continuation, got {other:?}"),
        }

        match ResponseParser::parse(b"+ \r\n").unwrap() {
            Response::Continuation { text } => assert!(text.is_none()),
            other => panic!("Expected continuation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_fetch_with_literal() {
        let input = b"* 12 FETCH (UID 100 BODY[TEXT] {5}\r\nhello)\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Fetch { seq, fields }) => {
                assert_eq!(seq.get(), 12);
                assert!(fields.iter().any(|f| matches!(f, FetchField::Uid(u) if u.get() == 100)));
                assert!(fields.iter().any(|f| matches!(
                    f,
                    FetchField::Data { key, value: Some(v) } if key == "body[text]" && v == "hello"
                )));
            }
            other => panic!("Expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_highestmodseq_code() {
        let input = b"* OK [HIGHESTMODSEQ 3682918] Highest\r\n";
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Ok {
                code: Some(ResponseCode::HighestModSeq(n)),
                ..
            }) => assert_eq!(n, 3_682_918),
            other => panic!("Expected HIGHESTMODSEQ, got {other:?}"),
        }
    }
}
