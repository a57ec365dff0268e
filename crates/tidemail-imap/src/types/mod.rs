//! Core IMAP types.
//!
//! Fundamental types used throughout the client, following RFC 3501
//! (`IMAP4rev1`) and the extensions the session negotiates (RFC 2177 IDLE,
//! RFC 2342 NAMESPACE, RFC 2971 ID, RFC 4315 UIDPLUS, RFC 6851 MOVE,
//! RFC 7162 CONDSTORE, RFC 6154 SPECIAL-USE).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListItem, Mailbox, MailboxAttribute, MailboxInfo, Namespace, NamespacePrefix};
pub use response_code::ResponseCode;
pub use sequence::SequenceSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_new() {
        assert!(SeqNum::new(0).is_none());
        assert_eq!(SeqNum::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_capability_round_trip() {
        for name in ["IDLE", "NAMESPACE", "UIDPLUS", "MOVE", "CONDSTORE"] {
            assert_eq!(Capability::parse(name).to_string(), name);
        }
    }

    #[test]
    fn test_flag_parse() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("$Junk"), Flag::Keyword("$Junk".to_string()));
    }

    #[test]
    fn test_sequence_set_display() {
        assert_eq!(SequenceSet::single(1).unwrap().to_string(), "1");
        assert_eq!(SequenceSet::All.to_string(), "*");
    }
}
