//! Connection management: streams, framing, and configuration.

mod config;
mod framed;
mod stream;

pub use config::{
    Auth, Security, SessionConfig, TIMEOUT_CONNECTION, TIMEOUT_IDLE, TIMEOUT_NOOP,
};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect_plain, connect_tls};
