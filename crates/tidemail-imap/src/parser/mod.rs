//! IMAP wire parsing.
//!
//! The [`lexer`] tokenizes raw response bytes; [`response`] assembles the
//! tokens into typed responses for the protocol layer.

pub mod lexer;
mod response;

pub use response::{
    Address, BodyStructure, Envelope, FetchField, Response, ResponseParser, UntaggedResponse,
};
