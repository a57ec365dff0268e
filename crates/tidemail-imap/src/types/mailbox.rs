//! Mailbox types.

use super::{Flags, Uid, UidValidity};

/// Mailbox name as it appears on the wire (modified UTF-7 encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox (case-insensitive per RFC).
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the mailbox name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox information from a SELECT/EXAMINE completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxInfo {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Flags that can be permanently stored, if announced.
    pub permanent_flags: Option<Flags>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// Highest mod-sequence (CONDSTORE).
    pub highest_modseq: Option<u64>,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
}

/// One LIST or LSUB response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name (wire form).
    pub mailbox: Mailbox,
}

/// Mailbox attributes from LIST responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    // SPECIAL-USE mailbox attributes (RFC 6154)
    /// All messages (virtual mailbox).
    All,
    /// Mailbox is the archive folder.
    Archive,
    /// Mailbox is the drafts folder.
    Drafts,
    /// Flagged/starred messages (virtual mailbox).
    Flagged,
    /// Mailbox is the junk/spam folder.
    Junk,
    /// Mailbox is the sent folder.
    Sent,
    /// Mailbox is the trash folder.
    Trash,
    /// Unknown attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns the wire spelling of the attribute.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSelect => "\\Noselect",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::HasChildren => "\\HasChildren",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::All => "\\All",
            Self::Archive => "\\Archive",
            Self::Drafts => "\\Drafts",
            Self::Flagged => "\\Flagged",
            Self::Junk => "\\Junk",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Unknown(s) => s,
        }
    }
}

/// One namespace entry: prefix plus hierarchy delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePrefix {
    /// Mailbox-name prefix for this namespace.
    pub prefix: String,
    /// Hierarchy delimiter, if the server announced one.
    pub delimiter: Option<char>,
}

/// NAMESPACE response (RFC 2342).
///
/// Each class is `None` when the server does not advertise it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    /// Personal namespaces.
    pub personal: Option<Vec<NamespacePrefix>>,
    /// Other-users namespaces.
    pub users: Option<Vec<NamespacePrefix>>,
    /// Shared namespaces.
    pub shared: Option<Vec<NamespacePrefix>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox() {
        assert_eq!(Mailbox::inbox().as_str(), "INBOX");
        assert_eq!(Mailbox::new("Sent").to_string(), "Sent");
    }

    #[test]
    fn test_mailbox_info_default() {
        let info = MailboxInfo::default();
        assert_eq!(info.exists, 0);
        assert!(info.permanent_flags.is_none());
        assert!(!info.read_only);
    }

    #[test]
    fn test_attribute_parse() {
        assert_eq!(
            MailboxAttribute::parse("\\NoSelect"),
            MailboxAttribute::NoSelect
        );
        assert_eq!(MailboxAttribute::parse("\\Spam"), MailboxAttribute::Junk);
        assert_eq!(
            MailboxAttribute::parse("\\Custom"),
            MailboxAttribute::Unknown("\\Custom".to_string())
        );
    }

    #[test]
    fn test_namespace_default_is_unadvertised() {
        let ns = Namespace::default();
        assert!(ns.personal.is_none());
        assert!(ns.users.is_none());
        assert!(ns.shared.is_none());
    }
}
