//! Sans-I/O protocol core: command correlation and untagged routing.
//!
//! The [`Protocol`] owns the session state machine, the capability set,
//! and the single in-flight command slot. The driver feeds it complete
//! responses; it hands back events: the greeting, command completions
//! (with the untagged records the command opted into), continuation
//! requests, and unsolicited updates for the session observers.
//!
//! At most one command is in flight at a time. Untagged responses that
//! arrive inside a command window are appended to that command's payload
//! when their kind is on the command's accept list, and are always
//! surfaced as [`ProtocolEvent::Unsolicited`] as well, in arrival order.

mod state;

pub use state::{SelectedState, SessionState};

use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status, Tag};
use crate::{Error, Result};

/// Result of a completed command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Completion status.
    pub status: Status,
    /// Response code on the tagged line, if any.
    pub code: Option<ResponseCode>,
    /// Human-readable completion text.
    pub text: String,
    /// Untagged records collected for this command, in arrival order.
    /// Only kinds on the command's accept list are present.
    pub payload: Vec<UntaggedResponse>,
}

impl CommandOutcome {
    /// Classifies the completion, turning NO/BAD/BYE into errors that
    /// carry the human-readable text and the response-code atom.
    ///
    /// # Errors
    ///
    /// [`Error::No`], [`Error::Bad`] or [`Error::Bye`] per the completion
    /// status.
    pub fn check(self) -> Result<Self> {
        match self.status {
            Status::Ok | Status::PreAuth => Ok(self),
            status => Err(Error::from_completion(
                status,
                &self.text,
                self.code.as_ref().map(|c| c.atom().to_string()),
            )),
        }
    }
}

/// Events produced while feeding responses into the protocol.
#[derive(Debug)]
pub enum ProtocolEvent {
    /// Server greeting (first response on the connection).
    Greeting {
        /// Greeting status; BYE means the server refused the connection.
        status: Status,
        /// Greeting text.
        text: String,
    },
    /// The in-flight command completed.
    CommandComplete(CommandOutcome),
    /// Continuation request (`+ ...`).
    Continuation {
        /// Text after the `+`, if any.
        text: Option<String>,
    },
    /// An untagged response, for session observers.
    Unsolicited(UntaggedResponse),
    /// Server is closing the connection.
    Bye {
        /// BYE text.
        text: String,
    },
}

/// One command awaiting its tagged completion.
struct PendingCommand {
    tag: Tag,
    accept: Vec<&'static str>,
    payload: Vec<UntaggedResponse>,
}

/// Sans-I/O protocol state.
pub struct Protocol {
    state: SessionState,
    tag_gen: TagGenerator,
    capabilities: Vec<Capability>,
    pending: Option<PendingCommand>,
    idle_tag: Option<Tag>,
    greeting_received: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol {
    /// Creates a protocol in the connecting state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            tag_gen: TagGenerator::default(),
            capabilities: Vec::new(),
            pending: None,
            idle_tag: None,
            greeting_received: false,
        }
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Replaces the session state.
    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Returns the negotiated capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Replaces the capability set wholesale.
    pub fn set_capabilities(&mut self, caps: Vec<Capability>) {
        self.capabilities = caps;
    }

    /// Case-insensitive capability lookup.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.matches(name))
    }

    /// Returns true while a command (or IDLE) is in flight.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true while IDLE is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle_tag.is_some()
    }

    /// Starts a command: assigns a tag, registers the accept list, and
    /// returns the bytes to write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if a command is already in flight; the
    /// pipeline must drain the previous completion first.
    pub fn start_command(
        &mut self,
        command: &Command,
        accept: &[&'static str],
    ) -> Result<Vec<u8>> {
        if self.pending.is_some() {
            return Err(Error::InvalidState(
                "a command is already in flight".to_string(),
            ));
        }

        let tag = self.tag_gen.next();
        let bytes = command.serialize(&tag);

        self.pending = Some(PendingCommand {
            tag: Tag::new(tag),
            accept: accept.to_vec(),
            payload: Vec::new(),
        });

        if matches!(command, Command::Idle) {
            self.idle_tag = self
                .pending
                .as_ref()
                .map(|pending| pending.tag.clone());
        }

        Ok(bytes)
    }

    /// Drops the in-flight slot, e.g. when the connection died before the
    /// completion arrived.
    pub fn abort_in_flight(&mut self) {
        self.pending = None;
        self.idle_tag = None;
    }

    /// Feeds one complete response into the protocol.
    ///
    /// Responses that fail to parse are dropped with a log record;
    /// tolerating unknown lines keeps the session alive on servers that
    /// send nonstandard data.
    pub fn handle_response(&mut self, raw: &[u8]) -> Option<ProtocolEvent> {
        let response = match ResponseParser::parse(raw) {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, "dropping unparsable response");
                return None;
            }
        };

        match response {
            Response::Tagged {
                tag,
                status,
                code,
                text,
            } => self.handle_tagged(&tag, status, code, text),
            Response::Untagged(untagged) => self.handle_untagged(untagged),
            Response::Continuation { text } => Some(ProtocolEvent::Continuation { text }),
        }
    }

    fn handle_tagged(
        &mut self,
        tag: &Tag,
        status: Status,
        code: Option<ResponseCode>,
        text: String,
    ) -> Option<ProtocolEvent> {
        if self.idle_tag.as_ref() == Some(tag) {
            self.idle_tag = None;
        }

        // Tagged completions may carry a fresh capability set.
        if let Some(ResponseCode::Capability(caps)) = &code {
            self.capabilities.clone_from(caps);
        }

        match self.pending.take() {
            Some(pending) if pending.tag == *tag => {
                Some(ProtocolEvent::CommandComplete(CommandOutcome {
                    status,
                    code,
                    text,
                    payload: pending.payload,
                }))
            }
            Some(pending) => {
                tracing::warn!(
                    got = tag.as_str(),
                    expected = pending.tag.as_str(),
                    "tagged response for unexpected tag"
                );
                self.pending = Some(pending);
                None
            }
            None => {
                tracing::warn!(tag = tag.as_str(), "tagged response with no command in flight");
                None
            }
        }
    }

    fn handle_untagged(&mut self, untagged: UntaggedResponse) -> Option<ProtocolEvent> {
        // Greeting: the first response on the connection.
        if !self.greeting_received {
            if let UntaggedResponse::Ok { code, text }
            | UntaggedResponse::PreAuth { code, text }
            | UntaggedResponse::Bye { code, text } = &untagged
            {
                let status = match &untagged {
                    UntaggedResponse::PreAuth { .. } => Status::PreAuth,
                    UntaggedResponse::Bye { .. } => Status::Bye,
                    _ => Status::Ok,
                };
                if let Some(ResponseCode::Capability(caps)) = code {
                    self.capabilities.clone_from(caps);
                }
                self.greeting_received = true;
                return Some(ProtocolEvent::Greeting {
                    status,
                    text: text.clone(),
                });
            }
        }

        // Session-level capability refresh happens for every command
        // window and outside them.
        match &untagged {
            UntaggedResponse::Capability(caps) => {
                self.capabilities.clone_from(caps);
            }
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Capability(caps)),
                ..
            } => {
                self.capabilities.clone_from(caps);
            }
            UntaggedResponse::Bye { text, .. } => {
                return Some(ProtocolEvent::Bye { text: text.clone() });
            }
            _ => {}
        }

        // Per-command payload collection, for opted-in kinds only.
        if let Some(pending) = &mut self.pending
            && pending.accept.contains(&untagged.kind())
        {
            pending.payload.push(untagged.clone());
        }

        Some(ProtocolEvent::Unsolicited(untagged))
    }
}

impl std::fmt::Debug for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protocol")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("in_flight", &self.pending.is_some())
            .field("is_idle", &self.idle_tag.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn greeted() -> Protocol {
        let mut protocol = Protocol::new();
        let event = protocol.handle_response(b"* OK ready\r\n");
        assert!(matches!(event, Some(ProtocolEvent::Greeting { .. })));
        protocol
    }

    fn start(protocol: &mut Protocol, command: &Command, accept: &[&'static str]) -> String {
        let bytes = protocol.start_command(command, accept).unwrap();
        let line = String::from_utf8(bytes).unwrap();
        line.split(' ').next().unwrap().to_string()
    }

    #[test]
    fn test_greeting_seeds_capabilities() {
        let mut protocol = Protocol::new();
        let event = protocol.handle_response(b"* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n");
        assert!(matches!(
            event,
            Some(ProtocolEvent::Greeting {
                status: Status::Ok,
                ..
            })
        ));
        assert!(protocol.has_capability("IDLE"));
        assert!(protocol.has_capability("idle"));
    }

    #[test]
    fn test_bye_greeting() {
        let mut protocol = Protocol::new();
        let event = protocol.handle_response(b"* BYE overloaded\r\n");
        assert!(matches!(
            event,
            Some(ProtocolEvent::Greeting {
                status: Status::Bye,
                ..
            })
        ));
    }

    #[test]
    fn test_command_completion_and_classification() {
        let mut protocol = greeted();
        let tag = start(&mut protocol, &Command::Noop, &[]);
        assert!(protocol.in_flight());

        let response = format!("{tag} OK NOOP completed\r\n");
        match protocol.handle_response(response.as_bytes()) {
            Some(ProtocolEvent::CommandComplete(outcome)) => {
                assert!(outcome.check().is_ok());
            }
            other => panic!("Expected completion, got {other:?}"),
        }
        assert!(!protocol.in_flight());
    }

    #[test]
    fn test_no_completion_becomes_error_with_code() {
        let mut protocol = greeted();
        let tag = start(&mut protocol, &Command::Noop, &[]);

        let response = format!("{tag} NO [NONEXISTENT] gone\r\n");
        match protocol.handle_response(response.as_bytes()) {
            Some(ProtocolEvent::CommandComplete(outcome)) => {
                let err = outcome.check().unwrap_err();
                assert_eq!(err.code(), Some("NONEXISTENT"));
                assert!(err.to_string().contains("gone"));
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_no_text_fallback() {
        let mut protocol = greeted();
        let tag = start(&mut protocol, &Command::Noop, &[]);

        let response = format!("{tag} NO \r\n");
        match protocol.handle_response(response.as_bytes()) {
            Some(ProtocolEvent::CommandComplete(outcome)) => {
                let err = outcome.check().unwrap_err();
                assert!(err.to_string().contains("Error"));
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_collection_is_opt_in() {
        let mut protocol = greeted();
        let tag = start(
            &mut protocol,
            &Command::Search {
                criteria: crate::command::SearchCriteria::Unseen,
                uid: false,
            },
            &["search"],
        );

        // Collected: on the accept list
        protocol.handle_response(b"* SEARCH 5 7\r\n");
        // Not collected, still surfaced as unsolicited
        let event = protocol.handle_response(b"* 9 EXISTS\r\n");
        assert!(matches!(
            event,
            Some(ProtocolEvent::Unsolicited(UntaggedResponse::Exists(9)))
        ));

        let response = format!("{tag} OK done\r\n");
        match protocol.handle_response(response.as_bytes()) {
            Some(ProtocolEvent::CommandComplete(outcome)) => {
                assert_eq!(outcome.payload.len(), 1);
                assert!(matches!(
                    outcome.payload[0],
                    UntaggedResponse::Search(ref nums) if *nums == vec![5, 7]
                ));
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_second_command_rejected_while_in_flight() {
        let mut protocol = greeted();
        let _ = start(&mut protocol, &Command::Noop, &[]);
        assert!(matches!(
            protocol.start_command(&Command::Noop, &[]),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_capability_refresh_from_tagged_code() {
        let mut protocol = greeted();
        let tag = start(&mut protocol, &Command::Noop, &[]);

        let response = format!("{tag} OK [CAPABILITY IMAP4rev1 MOVE UIDPLUS] done\r\n");
        protocol.handle_response(response.as_bytes());
        assert!(protocol.has_capability("MOVE"));
        assert!(protocol.has_capability("UIDPLUS"));
        assert!(!protocol.has_capability("IDLE"));
    }

    #[test]
    fn test_untagged_capability_replaces_wholesale() {
        let mut protocol = greeted();
        protocol.set_capabilities(vec![Capability::Idle]);
        protocol.handle_response(b"* CAPABILITY IMAP4rev1 NAMESPACE\r\n");
        assert!(!protocol.has_capability("IDLE"));
        assert!(protocol.has_capability("NAMESPACE"));
    }

    #[test]
    fn test_idle_lifecycle() {
        let mut protocol = greeted();
        let tag = start(&mut protocol, &Command::Idle, &[]);
        assert!(protocol.is_idle());

        // Updates flow while idling
        let event = protocol.handle_response(b"* 3 EXPUNGE\r\n");
        assert!(matches!(
            event,
            Some(ProtocolEvent::Unsolicited(UntaggedResponse::Expunge(_)))
        ));

        // DONE was written; the tagged completion ends idle
        let response = format!("{tag} OK IDLE terminated\r\n");
        match protocol.handle_response(response.as_bytes()) {
            Some(ProtocolEvent::CommandComplete(_)) => {}
            other => panic!("Expected completion, got {other:?}"),
        }
        assert!(!protocol.is_idle());
        assert!(!protocol.in_flight());
    }

    #[test]
    fn test_bye_event() {
        let mut protocol = greeted();
        let event = protocol.handle_response(b"* BYE shutting down\r\n");
        assert!(matches!(event, Some(ProtocolEvent::Bye { .. })));
    }

    #[test]
    fn test_unparsable_line_dropped() {
        let mut protocol = greeted();
        assert!(protocol.handle_response(b"* BOGUS stuff\r\n").is_none());
    }
}
