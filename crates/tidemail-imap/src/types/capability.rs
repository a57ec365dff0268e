//! Server capabilities and response status.

/// Response status from a tagged response or greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability atom.
///
/// Capability names are case-insensitive; parsing normalizes them and
/// `Display` renders the canonical spelling. The whole set is replaced
/// wholesale on every negotiated update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// IDLE command support (RFC 2177)
    Idle,
    /// NAMESPACE command support (RFC 2342)
    Namespace,
    /// ID extension (RFC 2971)
    Id,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MOVE extension (RFC 6851)
    Move,
    /// CONDSTORE (RFC 7162)
    CondStore,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IDLE" => Self::Idle,
            "NAMESPACE" => Self::Namespace,
            "ID" => Self::Id,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "CONDSTORE" => Self::CondStore,
            "SPECIAL-USE" => Self::SpecialUse,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(upper[5..].to_string()),
            _ => Self::Unknown(upper),
        }
    }

    /// Case-insensitive match against a capability name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(name)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Idle => write!(f, "IDLE"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::Id => write!(f, "ID"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Capability::parse("idle"), Capability::Idle);
        assert_eq!(Capability::parse("IdLe"), Capability::Idle);
        assert_eq!(Capability::parse("special-use"), Capability::SpecialUse);
    }

    #[test]
    fn test_parse_auth_mechanism() {
        assert_eq!(
            Capability::parse("AUTH=XOAUTH2"),
            Capability::Auth("XOAUTH2".to_string())
        );
        assert_eq!(
            Capability::parse("auth=plain"),
            Capability::Auth("PLAIN".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_uppercased() {
        assert_eq!(
            Capability::parse("x-gm-ext-1"),
            Capability::Unknown("X-GM-EXT-1".to_string())
        );
    }

    #[test]
    fn test_matches() {
        assert!(Capability::Idle.matches("idle"));
        assert!(Capability::Auth("XOAUTH2".into()).matches("auth=xoauth2"));
        assert!(!Capability::Idle.matches("MOVE"));
    }
}
