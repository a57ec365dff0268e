//! IMAP command builder.
//!
//! High-level arguments (sequence sets, fetch items, search trees, flag
//! mutations) are synthesized into wire bytes here; the session only ever
//! hands serialized commands to the socket.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

use serialize::{
    write_astring, write_fetch_items, write_mailbox, write_search_criteria, write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any state
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not authenticated
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE command.
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Initial response on the command line, if any.
        initial_response: Option<String>,
    },

    // Authenticated
    /// ID command (RFC 2971).
    Id {
        /// Client identification field/value pairs; `None` sends `ID NIL`.
        parameters: Option<Vec<(String, String)>>,
    },
    /// NAMESPACE command (RFC 2342).
    Namespace,
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// LSUB command.
    Lsub {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
        /// Append `(CONDSTORE)`.
        condstore: bool,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
        /// Append `(CONDSTORE)`.
        condstore: bool,
    },

    // Selected
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
        /// Use UIDs.
        uid: bool,
        /// Append `(CHANGEDSINCE n)` (CONDSTORE).
        changed_since: Option<u64>,
    },
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UIDs.
        uid: bool,
    },
    /// STORE command.
    Store {
        /// Sequence set.
        sequence: SequenceSet,
        /// Flag mutation.
        action: StoreAction,
        /// Use UIDs.
        uid: bool,
        /// Suppress the FETCH responses (`.SILENT`).
        silent: bool,
    },
    /// COPY command.
    Copy {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UIDs.
        uid: bool,
    },
    /// MOVE command (RFC 6851).
    Move {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UIDs.
        uid: bool,
    },
    /// EXPUNGE command.
    Expunge,
    /// UID EXPUNGE command (RFC 4315 UIDPLUS).
    UidExpunge {
        /// UIDs to expunge.
        uids: SequenceSet,
    },
    /// IDLE command (RFC 2177).
    Idle,
}

impl Command {
    /// Serializes the command to wire bytes with the given tag.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTHENTICATE ");
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }

            Self::Id { parameters } => {
                buf.extend_from_slice(b"ID ");
                if let Some(params) = parameters {
                    buf.push(b'(');
                    for (i, (key, value)) in params.iter().enumerate() {
                        if i > 0 {
                            buf.push(b' ');
                        }
                        write_astring(&mut buf, key);
                        buf.push(b' ');
                        write_astring(&mut buf, value);
                    }
                    buf.push(b')');
                } else {
                    buf.extend_from_slice(b"NIL");
                }
            }

            Self::Namespace => buf.extend_from_slice(b"NAMESPACE"),

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Lsub { reference, pattern } => {
                buf.extend_from_slice(b"LSUB ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Select { mailbox, condstore } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
                if *condstore {
                    buf.extend_from_slice(b" (CONDSTORE)");
                }
            }

            Self::Examine { mailbox, condstore } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
                if *condstore {
                    buf.extend_from_slice(b" (CONDSTORE)");
                }
            }

            Self::Fetch {
                sequence,
                items,
                uid,
                changed_since,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
                if let Some(modseq) = changed_since {
                    buf.extend_from_slice(format!(" (CHANGEDSINCE {modseq})").as_bytes());
                }
            }

            Self::Search { criteria, uid } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::Store {
                sequence,
                action,
                uid,
                silent,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"STORE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }

            Self::Copy {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"COPY ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
            }

            Self::Move {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"MOVE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_mailbox(&mut buf, mailbox);
            }

            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),

            Self::UidExpunge { uids } => {
                buf.extend_from_slice(b"UID EXPUNGE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
            }

            Self::Idle => buf.extend_from_slice(b"IDLE"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn seq(s: &str) -> SequenceSet {
        s.parse().unwrap()
    }

    #[test]
    fn test_capability_command() {
        assert_eq!(Command::Capability.serialize("W0001"), b"W0001 CAPABILITY\r\n");
    }

    #[test]
    fn test_login_command() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 LOGIN user pass\r\n");
    }

    #[test]
    fn test_login_quoted() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 LOGIN user@example.com \"pass word\"\r\n"
        );
    }

    #[test]
    fn test_authenticate_with_initial_response() {
        let cmd = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some("dG9rZW4=".to_string()),
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 AUTHENTICATE XOAUTH2 dG9rZW4=\r\n"
        );
    }

    #[test]
    fn test_id_nil() {
        assert_eq!(
            Command::Id { parameters: None }.serialize("W0001"),
            b"W0001 ID NIL\r\n"
        );
    }

    #[test]
    fn test_id_with_params() {
        let cmd = Command::Id {
            parameters: Some(vec![
                ("name".to_string(), "tidemail".to_string()),
                ("version".to_string(), "0.1.0".to_string()),
            ]),
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 ID (name tidemail version 0.1.0)\r\n"
        );
    }

    #[test]
    fn test_select_condstore() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: true,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 SELECT INBOX (CONDSTORE)\r\n");
    }

    #[test]
    fn test_examine() {
        let cmd = Command::Examine {
            mailbox: Mailbox::new("Archive 2024"),
            condstore: false,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 EXAMINE \"Archive 2024\"\r\n");
    }

    #[test]
    fn test_uid_fetch_macro() {
        // S1: buildFETCH("1:*", "all", {byUid: true})
        let cmd = Command::Fetch {
            sequence: seq("1:*"),
            items: FetchItems::from_strings(&["all"]),
            uid: true,
            changed_since: None,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 UID FETCH 1:* ALL\r\n");
    }

    #[test]
    fn test_fetch_modseq_item() {
        // S2: a single complex item is emitted unbracketed
        let cmd = Command::Fetch {
            sequence: seq("1:*"),
            items: FetchItems::from_strings(&["modseq (1234567)"]),
            uid: false,
            changed_since: None,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 FETCH 1:* MODSEQ (1234567)\r\n");
    }

    #[test]
    fn test_fetch_body_section_list() {
        let cmd = Command::Fetch {
            sequence: seq("1"),
            items: FetchItems::from_strings(&["uid", "body.peek[header.fields (date subject)]<0.256>"]),
            uid: false,
            changed_since: None,
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 FETCH 1 (UID BODY.PEEK[HEADER.FIELDS (DATE SUBJECT)]<0.256>)\r\n"
        );
    }

    #[test]
    fn test_fetch_changed_since() {
        let cmd = Command::Fetch {
            sequence: seq("1:*"),
            items: FetchItems::Fast,
            uid: true,
            changed_since: Some(12345),
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 UID FETCH 1:* FAST (CHANGEDSINCE 12345)\r\n"
        );
    }

    #[test]
    fn test_search_composite() {
        // S3: key order is preserved, strings are quoted, dates use D-Mon-YYYY
        let cmd = Command::Search {
            criteria: SearchCriteria::And(vec![
                SearchCriteria::Unseen,
                SearchCriteria::Header("subject".to_string(), "hello world".to_string()),
                SearchCriteria::Or(
                    Box::new(SearchCriteria::Unseen),
                    Box::new(SearchCriteria::Seen),
                ),
                SearchCriteria::Not(Box::new(SearchCriteria::Seen)),
                SearchCriteria::SentBefore(NaiveDate::from_ymd_opt(2011, 2, 3).unwrap()),
                SearchCriteria::Since(NaiveDate::from_ymd_opt(2011, 12, 23).unwrap()),
                SearchCriteria::Uid(seq("1:*")),
            ]),
            uid: false,
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 SEARCH UNSEEN HEADER \"subject\" \"hello world\" OR UNSEEN SEEN NOT SEEN SENTBEFORE \"3-Feb-2011\" SINCE \"23-Dec-2011\" UID 1:*\r\n"
                .as_slice()
        );
    }

    #[test]
    fn test_uid_search() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Unseen,
            uid: true,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 UID SEARCH UNSEEN\r\n");
    }

    #[test]
    fn test_store_remove_silent() {
        // S4
        let cmd = Command::Store {
            sequence: seq("1,2,3"),
            action: StoreAction::remove(&["a", "b"]),
            uid: false,
            silent: true,
        };
        assert_eq!(
            cmd.serialize("W0001"),
            b"W0001 STORE 1,2,3 -FLAGS.SILENT (a b)\r\n"
        );
    }

    #[test]
    fn test_store_set() {
        let cmd = Command::Store {
            sequence: seq("1"),
            action: StoreAction::set(&["\\Seen"]),
            uid: true,
            silent: false,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 UID STORE 1 FLAGS (\\Seen)\r\n");
    }

    #[test]
    fn test_copy_and_move() {
        let cmd = Command::Copy {
            sequence: seq("1:5"),
            mailbox: Mailbox::new("Archive"),
            uid: true,
        };
        assert_eq!(cmd.serialize("W0001"), b"W0001 UID COPY 1:5 Archive\r\n");

        let cmd = Command::Move {
            sequence: seq("1:5"),
            mailbox: Mailbox::new("Trash"),
            uid: false,
        };
        assert_eq!(cmd.serialize("W0002"), b"W0002 MOVE 1:5 Trash\r\n");
    }

    #[test]
    fn test_uid_expunge() {
        let cmd = Command::UidExpunge { uids: seq("100:200") };
        assert_eq!(cmd.serialize("W0001"), b"W0001 UID EXPUNGE 100:200\r\n");
    }

    #[test]
    fn test_idle() {
        assert_eq!(Command::Idle.serialize("W0001"), b"W0001 IDLE\r\n");
    }
}
