//! # tidemail-imap
//!
//! A high-level IMAP4rev1 (RFC 3501) client core: an authenticated
//! session with a mailbox-oriented API on top of a serial command
//! pipeline and a transparent server-push listener.
//!
//! ## Features
//!
//! - **Session state machine**: connecting → not-authenticated →
//!   authenticated → selected → logout, with observer callbacks on every
//!   transition that matters
//! - **Transparent keep-alive**: IDLE (RFC 2177) entered whenever the
//!   command pipeline drains and broken before any foreground command;
//!   NOOP polling on servers without IDLE
//! - **Capability-driven negotiation**: UIDPLUS, MOVE, CONDSTORE,
//!   NAMESPACE, ID, SPECIAL-USE and XOAUTH2 are used when advertised,
//!   with documented fall-backs otherwise
//! - **Tolerant response parsing**: ENVELOPE, BODYSTRUCTURE, NAMESPACE
//!   and friends decode what the server actually sent; absent optional
//!   fields stay absent instead of failing the command
//! - **TLS via rustls**: implicit TLS or plaintext, chosen up front
//!
//! ## Quick Start
//!
//! ```ignore
//! use tidemail_imap::{Auth, LoggingObserver, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> tidemail_imap::Result<()> {
//!     let config = SessionConfig::new("imap.example.com")
//!         .auth(Auth::password("user@example.com", "password"));
//!
//!     let session = Session::connect(config, LoggingObserver).await?;
//!
//!     let mailboxes = session.list_mailboxes().await?;
//!     for mailbox in &mailboxes.children {
//!         println!("{} ({})", mailbox.name, mailbox.path);
//!     }
//!
//!     let info = session
//!         .select_mailbox("INBOX", &Default::default())
//!         .await?;
//!     println!("{} messages", info.exists);
//!
//!     let messages = session
//!         .list_messages(
//!             &"1:10".parse()?,
//!             tidemail_imap::FetchItems::from_strings(&["uid", "envelope"]),
//!             &Default::default(),
//!         )
//!         .await?;
//!     for message in &messages {
//!         if let Some(envelope) = &message.envelope {
//!             println!("{:?}", envelope.subject);
//!         }
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders (FETCH items, SEARCH criteria, flag
//!   mutations) and serialization
//! - [`connection`]: streams, framing, configuration
//! - [`parser`]: lexer and response grammar
//! - [`protocol`]: sans-I/O pipeline and untagged demultiplexer
//! - [`session`]: the session driver and public API
//! - [`mailboxes`]: mailbox tree and special-use detection
//! - [`types`]: core IMAP types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
mod handler;
pub mod mailboxes;
mod message;
pub mod parser;
pub mod protocol;
mod sasl;
pub mod session;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction};
pub use connection::{
    Auth, FramedStream, ImapStream, Security, SessionConfig, TIMEOUT_CONNECTION, TIMEOUT_IDLE,
    TIMEOUT_NOOP,
};
pub use error::{Error, Result};
pub use handler::{
    CollectingObserver, LoggingObserver, NoopObserver, SessionEvent, SessionObserver,
};
pub use mailboxes::MailboxNode;
pub use message::{Message, parse_fetch_records};
pub use parser::{
    Address, BodyStructure, Envelope, FetchField, Response, ResponseParser, UntaggedResponse,
};
pub use protocol::{CommandOutcome, Protocol, ProtocolEvent, SessionState};
pub use sasl::xoauth2_token;
pub use session::{FetchOptions, SearchOptions, SelectOptions, Session, StoreOptions};
pub use types::{
    Capability, Flag, Flags, ListItem, Mailbox, MailboxAttribute, MailboxInfo, Namespace,
    NamespacePrefix, ResponseCode, SeqNum, SequenceSet, Status, Tag, Uid, UidValidity,
};
