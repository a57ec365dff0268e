//! SASL helpers for AUTHENTICATE.
//!
//! Only the mechanisms the session negotiates live here: XOAUTH2
//! (Google/Microsoft proprietary OAuth2 bearer mechanism). LOGIN goes
//! through the plain LOGIN command and needs no SASL encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Builds the XOAUTH2 initial response.
///
/// Format: base64 of `user=<user>\x01auth=Bearer <token>\x01\x01`.
#[must_use]
pub fn xoauth2_token(user: &str, access_token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {access_token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

/// Decodes an XOAUTH2 error continuation payload.
///
/// On authentication failure the server sends a `+ <base64 JSON>`
/// continuation describing the error. Anything that does not decode as
/// base64 JSON yields `None`; the payload is informational only.
#[must_use]
pub fn decode_continuation(payload: &str) -> Option<serde_json::Value> {
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_xoauth2_token_vector() {
        assert_eq!(
            xoauth2_token("user@host", "abcde"),
            "dXNlcj11c2VyQGhvc3QBYXV0aD1CZWFyZXIgYWJjZGUBAQ=="
        );
    }

    #[test]
    fn test_xoauth2_token_round_trip() {
        let token = xoauth2_token("test@example.com", "ya29.token");
        let decoded = STANDARD.decode(&token).unwrap();
        let decoded = String::from_utf8(decoded).unwrap();
        assert_eq!(decoded, "user=test@example.com\x01auth=Bearer ya29.token\x01\x01");
    }

    #[test]
    fn test_decode_continuation() {
        // base64 of {"status":"401","schemes":"bearer"}
        let payload = STANDARD.encode(br#"{"status":"401","schemes":"bearer"}"#);
        let value = decode_continuation(&payload).unwrap();
        assert_eq!(value["status"], "401");
        assert_eq!(value["schemes"], "bearer");
    }

    #[test]
    fn test_decode_continuation_garbage() {
        assert!(decode_continuation("not base64 at all!!!").is_none());
        let not_json = STANDARD.encode(b"plain text");
        assert!(decode_continuation(&not_json).is_none());
    }
}
