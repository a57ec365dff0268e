//! Bracketed response codes (`[CODE ...]`) from OK/NO/BAD responses.

use super::{Capability, Flags, SeqNum, Uid, UidValidity};

/// Response code from a tagged or untagged status response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseCode {
    /// ALERT: text must be shown to the user.
    Alert,
    /// PARSE: the server had trouble parsing a message.
    Parse,
    /// Mailbox was opened read-only.
    ReadOnly,
    /// Mailbox was opened read-write.
    ReadWrite,
    /// Target mailbox does not exist but may be created.
    TryCreate,
    /// The mailbox does not support mod-sequences (CONDSTORE).
    NoModSeq,
    /// UIDNEXT value.
    UidNext(Uid),
    /// UIDVALIDITY value.
    UidValidity(UidValidity),
    /// First unseen message.
    Unseen(SeqNum),
    /// Highest mod-sequence in the mailbox (CONDSTORE).
    HighestModSeq(u64),
    /// Capability list embedded in the response.
    Capability(Vec<Capability>),
    /// Flags that can be stored permanently.
    PermanentFlags(Flags),
    /// Unrecognized response code atom.
    Unknown(String),
}

impl ResponseCode {
    /// Returns the response-code atom, as surfaced on command errors.
    #[must_use]
    pub fn atom(&self) -> &str {
        match self {
            Self::Alert => "ALERT",
            Self::Parse => "PARSE",
            Self::ReadOnly => "READ-ONLY",
            Self::ReadWrite => "READ-WRITE",
            Self::TryCreate => "TRYCREATE",
            Self::NoModSeq => "NOMODSEQ",
            Self::UidNext(_) => "UIDNEXT",
            Self::UidValidity(_) => "UIDVALIDITY",
            Self::Unseen(_) => "UNSEEN",
            Self::HighestModSeq(_) => "HIGHESTMODSEQ",
            Self::Capability(_) => "CAPABILITY",
            Self::PermanentFlags(_) => "PERMANENTFLAGS",
            Self::Unknown(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_names() {
        assert_eq!(ResponseCode::ReadOnly.atom(), "READ-ONLY");
        assert_eq!(ResponseCode::HighestModSeq(1).atom(), "HIGHESTMODSEQ");
        assert_eq!(
            ResponseCode::Unknown("NONEXISTENT".to_string()).atom(),
            "NONEXISTENT"
        );
    }
}
