//! Modified UTF-7 for IMAP mailbox names (RFC 3501 §5.1.3).
//!
//! Mailbox names on the wire encode non-ASCII text inside `&...-` shifts
//! using a base64 variant (`,` instead of `/`, no padding) over UTF-16BE
//! code units. A literal `&` is written `&-`.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Base64 engine with the IMAP modified-UTF-7 alphabet and no padding.
const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &IMAP_MUTF7,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Decodes a modified UTF-7 mailbox name.
///
/// Undecodable shift sequences are kept verbatim instead of failing, so
/// this always returns a usable name for display.
#[must_use]
pub fn decode_utf7_imap(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.char_indices();

    while let Some((start, ch)) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        // Collect the shifted section up to the terminating '-'.
        let mut end = None;
        for (i, c) in chars.by_ref() {
            if c == '-' {
                end = Some(i);
                break;
            }
        }

        let Some(end) = end else {
            // Unterminated shift; keep the tail as is.
            result.push_str(&input[start..]);
            break;
        };

        let section = &input[start + 1..end];
        if section.is_empty() {
            result.push('&');
        } else if let Some(decoded) = decode_shift(section) {
            result.push_str(&decoded);
        } else {
            result.push_str(&input[start..=end]);
        }
    }

    result
}

/// Decodes one base64 shift section into text.
fn decode_shift(section: &str) -> Option<String> {
    let bytes = MUTF7.decode(section).ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).ok()
}

/// Encodes a mailbox name as modified UTF-7.
#[must_use]
pub fn encode_utf7_imap(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut shifted = String::new();

    for ch in input.chars() {
        if ch == '&' {
            flush_shift(&mut result, &mut shifted);
            result.push_str("&-");
        } else if (' '..='~').contains(&ch) {
            flush_shift(&mut result, &mut shifted);
            result.push(ch);
        } else {
            shifted.push(ch);
        }
    }

    flush_shift(&mut result, &mut shifted);
    result
}

/// Emits a pending non-ASCII run as a `&...-` shift.
fn flush_shift(result: &mut String, shifted: &mut String) {
    if shifted.is_empty() {
        return;
    }

    let mut bytes = Vec::with_capacity(shifted.len() * 2);
    for unit in shifted.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }

    result.push('&');
    result.push_str(&MUTF7.encode(&bytes));
    result.push('-');
    shifted.clear();
}
