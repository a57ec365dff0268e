//! Session state machine.
//!
//! The session walks Connecting → NotAuthenticated → Authenticated ↔
//! Selected, with Logout reachable from anywhere. A selected mailbox
//! exists exactly while the state is `Selected`.

/// Session protocol state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// TCP/TLS connect issued, greeting not yet received.
    #[default]
    Connecting,

    /// Greeting received, waiting for credentials.
    NotAuthenticated,

    /// LOGIN/AUTHENTICATE succeeded.
    Authenticated,

    /// A mailbox is open.
    Selected(SelectedState),

    /// LOGOUT issued or connection torn down.
    Logout,
}

impl SessionState {
    /// Returns true once the session is authenticated (or further).
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Selected(_))
    }

    /// Returns true while a mailbox is open.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Returns the selected mailbox path, if any.
    #[must_use]
    pub fn selected_mailbox(&self) -> Option<&str> {
        match self {
            Self::Selected(state) => Some(&state.mailbox),
            _ => None,
        }
    }
}

/// State carried while a mailbox is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedState {
    /// Wire path of the open mailbox.
    pub mailbox: String,
    /// Opened via EXAMINE.
    pub read_only: bool,
}
