//! Encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded-word decoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    decode_qp_bytes(text, false).and_then(|bytes| String::from_utf8(bytes).map_err(Into::into))
}

/// Decodes Quoted-Printable to raw bytes.
///
/// When `q_encoding` is set, underscores decode to spaces as required by
/// the RFC 2047 Q encoding.
fn decode_qp_bytes(text: &str, q_encoding: bool) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '=' => {
                // Soft line break
                if chars.peek() == Some(&'\r') {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        continue;
                    }
                } else if chars.peek() == Some(&'\n') {
                    chars.next();
                    continue;
                }

                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() == 2 {
                    let byte = u8::from_str_radix(&hex, 16)
                        .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                    result.push(byte);
                } else {
                    return Err(Error::InvalidEncoding(
                        "Incomplete escape sequence".to_string(),
                    ));
                }
            }
            '_' if q_encoding => result.push(b' '),
            _ => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    Ok(result)
}

/// Decodes RFC 2047 encoded words in a header value.
///
/// Recognizes `=?charset?B?...?=` and `=?charset?Q?...?=` tokens and
/// replaces each with its decoded text. Whitespace between two adjacent
/// encoded words is dropped per RFC 2047 §6.2; all other text is kept as
/// is. Malformed tokens and unknown charsets are passed through verbatim,
/// so this function never fails.
#[must_use]
pub fn decode_rfc2047(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    let mut pending_ws: Option<&str> = None;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        // Whitespace is buffered only when it follows an encoded word; it
        // is dropped iff the next token is also an encoded word.
        if !before.is_empty() {
            if last_was_encoded && before.chars().all(char::is_whitespace) {
                pending_ws = Some(before);
            } else {
                result.push_str(before);
                last_was_encoded = false;
            }
        }

        match parse_encoded_word(candidate) {
            Some((decoded, consumed)) => {
                pending_ws = None;
                last_was_encoded = true;
                result.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                if let Some(ws) = pending_ws.take() {
                    result.push_str(ws);
                }
                last_was_encoded = false;
                result.push_str("=?");
                rest = &candidate[2..];
            }
        }
    }

    if let Some(ws) = pending_ws {
        result.push_str(ws);
    }
    result.push_str(rest);
    result
}

/// Parses a single encoded word at the start of the input.
///
/// Returns the decoded text and the number of input bytes consumed, or
/// `None` when the input does not start with a well-formed encoded word.
fn parse_encoded_word(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix("=?")?;

    let charset_end = body.find('?')?;
    let charset = &body[..charset_end];

    let enc_body = &body[charset_end + 1..];
    let enc_end = enc_body.find('?')?;
    let encoding = &enc_body[..enc_end];

    let data_body = &enc_body[enc_end + 1..];
    let data_end = data_body.find("?=")?;
    let data = &data_body[..data_end];

    // An encoded word may not contain whitespace.
    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || data.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(data).ok()?,
        "Q" | "q" => decode_qp_bytes(data, true).ok()?,
        _ => return None,
    };

    let decoded = decode_charset(charset, &bytes)?;
    let consumed = 2 + charset_end + 1 + enc_end + 1 + data_end + 2;
    Some((decoded, consumed))
}

/// Decodes bytes in the named charset.
///
/// Covers the charsets that actually occur in mail headers this client
/// sees; anything else falls back to lossy UTF-8.
fn decode_charset(charset: &str, bytes: &[u8]) -> Option<String> {
    let normalized = charset
        .split('*')
        .next()
        .unwrap_or(charset)
        .to_ascii_lowercase();
    match normalized.as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8(bytes.to_vec()).ok(),
        "iso-8859-1" | "latin1" | "windows-1252" | "cp1252" => {
            Some(bytes.iter().map(|&b| char::from(b)).collect())
        }
        _ => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}
