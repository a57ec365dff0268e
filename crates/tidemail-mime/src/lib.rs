//! # tidemail-mime
//!
//! Character-set helpers for the tidemail IMAP client.
//!
//! ## Features
//!
//! - **RFC 2047 encoded words**: Tolerant decoding of `=?charset?B|Q?...?=`
//!   tokens in header values (envelope subjects, display names)
//! - **Modified UTF-7**: RFC 3501 §5.1.3 mailbox-name encoding
//! - **Encoding primitives**: Base64 and Quoted-Printable
//!
//! ## Quick Start
//!
//! ```
//! use tidemail_mime::encoding::decode_rfc2047;
//! use tidemail_mime::utf7::decode_utf7_imap;
//!
//! assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
//! assert_eq!(decode_utf7_imap("Entw&APw-rfe"), "Entwürfe");
//! ```
//!
//! Decoding in this crate is deliberately tolerant: malformed input is
//! passed through verbatim rather than rejected, because header values and
//! mailbox names arrive from servers the client does not control.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;

pub mod encoding;
pub mod utf7;

pub use encoding::{decode_base64, decode_quoted_printable, decode_rfc2047, encode_base64};
pub use error::{Error, Result};
pub use utf7::{decode_utf7_imap, encode_utf7_imap};
