//! Session observers for server-push updates.
//!
//! IMAP servers may send EXISTS, EXPUNGE and FETCH responses at any time
//! after authentication, inside or outside a command window. Implement
//! [`SessionObserver`] to receive them alongside the session lifecycle
//! events. Observers run on the session driver task and must not block.

use crate::Error;
use crate::message::Message;
use crate::types::MailboxInfo;

/// Handler for session lifecycle events and unsolicited server updates.
///
/// All methods default to no-ops, so implementations only override what
/// they care about.
pub trait SessionObserver: Send {
    /// Called when the session finishes its login handshake.
    fn on_authenticated(&mut self) {}

    /// Called when the message count changes (EXISTS response).
    fn on_exists(&mut self, count: u32) {
        let _ = count;
    }

    /// Called when a message is expunged (EXPUNGE response).
    ///
    /// The sequence number refers to the message's position before
    /// removal; subsequent messages shift down by one.
    fn on_expunge(&mut self, seq: u32) {
        let _ = seq;
    }

    /// Called for FETCH responses, typically flag changes made by another
    /// client.
    fn on_fetch(&mut self, message: &Message) {
        let _ = message;
    }

    /// Called after a mailbox was opened.
    fn on_mailbox_selected(&mut self, path: &str, info: &MailboxInfo) {
        let _ = (path, info);
    }

    /// Called exactly once whenever the session leaves a selected
    /// mailbox, with the path that was open.
    fn on_mailbox_closed(&mut self, path: &str) {
        let _ = path;
    }

    /// Called when the connection is gone, for any reason.
    fn on_closed(&mut self) {}

    /// Called for fatal session errors (connect timeout, handshake
    /// failure, lost connection).
    fn on_error(&mut self, error: &Error) {
        let _ = error;
    }
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// An observer that logs events through tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn on_authenticated(&mut self) {
        tracing::info!("session authenticated");
    }

    fn on_exists(&mut self, count: u32) {
        tracing::debug!(count, "EXISTS");
    }

    fn on_expunge(&mut self, seq: u32) {
        tracing::debug!(seq, "EXPUNGE");
    }

    fn on_fetch(&mut self, message: &Message) {
        tracing::debug!(seq = message.seq, "FETCH update");
    }

    fn on_mailbox_selected(&mut self, path: &str, info: &MailboxInfo) {
        tracing::info!(path, exists = info.exists, "mailbox selected");
    }

    fn on_mailbox_closed(&mut self, path: &str) {
        tracing::info!(path, "mailbox closed");
    }

    fn on_closed(&mut self) {
        tracing::info!("session closed");
    }

    fn on_error(&mut self, error: &Error) {
        tracing::error!(%error, "session error");
    }
}

/// An observer that records events for later inspection. Used by tests.
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    /// Recorded events, in arrival order.
    pub events: Vec<SessionEvent>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// An event recorded by [`CollectingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Login handshake finished.
    Authenticated,
    /// EXISTS update.
    Exists(u32),
    /// EXPUNGE update.
    Expunge(u32),
    /// FETCH update.
    Fetch(Message),
    /// Mailbox opened.
    MailboxSelected(String),
    /// Mailbox left.
    MailboxClosed(String),
    /// Connection gone.
    Closed,
}

impl SessionObserver for CollectingObserver {
    fn on_authenticated(&mut self) {
        self.events.push(SessionEvent::Authenticated);
    }

    fn on_exists(&mut self, count: u32) {
        self.events.push(SessionEvent::Exists(count));
    }

    fn on_expunge(&mut self, seq: u32) {
        self.events.push(SessionEvent::Expunge(seq));
    }

    fn on_fetch(&mut self, message: &Message) {
        self.events.push(SessionEvent::Fetch(message.clone()));
    }

    fn on_mailbox_selected(&mut self, path: &str, _info: &MailboxInfo) {
        self.events
            .push(SessionEvent::MailboxSelected(path.to_string()));
    }

    fn on_mailbox_closed(&mut self, path: &str) {
        self.events
            .push(SessionEvent::MailboxClosed(path.to_string()));
    }

    fn on_closed(&mut self) {
        self.events.push(SessionEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer() {
        let mut observer = NoopObserver;
        observer.on_exists(100);
        observer.on_expunge(1);
        observer.on_closed();
    }

    #[test]
    fn test_collecting_observer() {
        let mut observer = CollectingObserver::new();
        observer.on_exists(50);
        observer.on_expunge(3);
        observer.on_closed();

        assert_eq!(
            observer.events,
            vec![
                SessionEvent::Exists(50),
                SessionEvent::Expunge(3),
                SessionEvent::Closed,
            ]
        );
    }
}
