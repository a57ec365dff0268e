//! Session driver task.
//!
//! The driver owns the socket and the protocol state. It pulls commands
//! off the session queue one at a time, which makes the queue itself the
//! pipeline gate: the next command is not written until the previous
//! completion has been delivered to its submitter. Whenever the queue is
//! empty it keeps the connection listening for server pushes, via IDLE
//! when advertised and NOOP polling otherwise, and tears that down before
//! any foreground command touches the wire.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};

use crate::command::Command;
use crate::connection::FramedStream;
use crate::message::Message;
use crate::parser::UntaggedResponse;
use crate::protocol::{CommandOutcome, Protocol, ProtocolEvent, SelectedState, SessionState};
use crate::types::ResponseCode;
use crate::{Error, Result, SessionObserver};

use super::{Shared, parse_select_info};

/// The raw bytes that terminate an IDLE interval, written as one buffer.
const DONE: &[u8] = b"DONE\r\n";

/// Shared observer slot; the driver and the session handle both fire
/// events through it.
pub(crate) type ObserverHandle = Arc<Mutex<Box<dyn SessionObserver>>>;

/// How the driver answers a `+` continuation for this command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContinuationAction {
    /// No continuation expected; log and keep waiting.
    Ignore,
    /// XOAUTH2 error challenge: decode and log the payload, then
    /// acknowledge with an empty line.
    XOAuth2,
}

/// One queued command submission.
pub(crate) struct Submission {
    pub(crate) command: Command,
    pub(crate) accept: Vec<&'static str>,
    pub(crate) continuation: ContinuationAction,
    pub(crate) reply: oneshot::Sender<Result<CommandOutcome>>,
}

/// What ended a keep-alive wait.
enum Wake {
    Submission(Option<Submission>),
    Push(Result<Vec<u8>>),
    Tick,
}

pub(crate) struct Driver<S> {
    framed: FramedStream<S>,
    protocol: Protocol,
    shared: Arc<Mutex<Shared>>,
    observer: ObserverHandle,
    cmd_rx: mpsc::Receiver<Submission>,
    noop_interval: Duration,
    idle_interval: Duration,
    closing: bool,
}

impl<S> Driver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(
        framed: FramedStream<S>,
        protocol: Protocol,
        shared: Arc<Mutex<Shared>>,
        observer: ObserverHandle,
        cmd_rx: mpsc::Receiver<Submission>,
        noop_interval: Duration,
        idle_interval: Duration,
    ) -> Self {
        Self {
            framed,
            protocol,
            shared,
            observer,
            cmd_rx,
            noop_interval,
            idle_interval,
            closing: false,
        }
    }

    pub(crate) async fn run(mut self) {
        while !self.closing {
            // Foreground commands drain first.
            match self.cmd_rx.try_recv() {
                Ok(submission) => {
                    self.run_command(submission).await;
                    continue;
                }
                Err(mpsc::error::TryRecvError::Disconnected) => break,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            // The pipeline is drained: listen for server pushes.
            let result = if !self.protocol.state().is_authenticated() {
                self.wait_plain().await
            } else if self.protocol.has_capability("IDLE") {
                self.idle_wait().await
            } else {
                self.noop_wait().await
            };

            if let Err(error) = result {
                self.observer().on_error(&error);
                break;
            }
        }

        self.shutdown();
    }

    /// Runs one submitted command to its tagged completion.
    async fn run_command(&mut self, submission: Submission) {
        let Submission {
            command,
            accept,
            continuation,
            reply,
        } = submission;

        let bytes = match self.protocol.start_command(&command, &accept) {
            Ok(bytes) => bytes,
            Err(error) => {
                let _ = reply.send(Err(error));
                return;
            }
        };

        if let Err(error) = self.framed.write_command(&bytes).await {
            self.fail(reply, error);
            return;
        }

        loop {
            let raw = match self.framed.read_response().await {
                Ok(raw) => raw,
                Err(error) => {
                    self.fail(reply, error);
                    return;
                }
            };

            match self.protocol.handle_response(&raw) {
                Some(ProtocolEvent::CommandComplete(outcome)) => {
                    self.apply_transition(&command, &outcome);
                    self.sync_shared();
                    // A dropped receiver is a fire-and-forget command;
                    // its errors are nobody's business but the log's.
                    let _ = reply.send(Ok(outcome));
                    return;
                }
                Some(ProtocolEvent::Continuation { text }) => {
                    if let Err(error) = self.answer_continuation(continuation, text.as_deref()).await
                    {
                        self.fail(reply, error);
                        return;
                    }
                }
                Some(event) => self.dispatch(event),
                None => {}
            }
        }
    }

    /// Waits for work while unauthenticated: no keep-alive yet.
    async fn wait_plain(&mut self) -> Result<()> {
        let wake = tokio::select! {
            submission = self.cmd_rx.recv() => Wake::Submission(submission),
            raw = self.framed.read_response() => Wake::Push(raw),
        };
        self.handle_wake(wake).await
    }

    /// NOOP polling: wake up periodically to give the server a window to
    /// deliver pending updates.
    async fn noop_wait(&mut self) -> Result<()> {
        let wake = tokio::select! {
            submission = self.cmd_rx.recv() => Wake::Submission(submission),
            raw = self.framed.read_response() => Wake::Push(raw),
            () = tokio::time::sleep(self.noop_interval) => Wake::Tick,
        };
        self.handle_wake(wake).await
    }

    async fn handle_wake(&mut self, wake: Wake) -> Result<()> {
        match wake {
            Wake::Submission(Some(submission)) => self.run_command(submission).await,
            Wake::Submission(None) => self.closing = true,
            Wake::Push(raw) => {
                let raw = raw?;
                if let Some(event) = self.protocol.handle_response(&raw) {
                    self.dispatch(event);
                }
            }
            Wake::Tick => {
                tracing::debug!("keep-alive NOOP");
                let (reply, _discard) = oneshot::channel();
                self.run_command(Submission {
                    command: Command::Noop,
                    accept: Vec::new(),
                    continuation: ContinuationAction::Ignore,
                    reply,
                })
                .await;
            }
        }
        Ok(())
    }

    /// One IDLE interval: enter, listen, and leave again for a command
    /// submission, the renewal timer, or shutdown.
    async fn idle_wait(&mut self) -> Result<()> {
        let bytes = match self.protocol.start_command(&Command::Idle, &[]) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(()),
        };
        tracing::debug!("entering idle");
        self.framed.write_command(&bytes).await?;

        // The server confirms idle with a continuation.
        loop {
            let raw = self.framed.read_response().await?;
            match self.protocol.handle_response(&raw) {
                Some(ProtocolEvent::Continuation { .. }) => break,
                Some(ProtocolEvent::CommandComplete(outcome)) => {
                    tracing::warn!(text = %outcome.text, "IDLE rejected, falling back to NOOP");
                    return self.noop_wait().await;
                }
                Some(event) => self.dispatch(event),
                None => {}
            }
            if self.closing {
                return Ok(());
            }
        }

        let sleep = tokio::time::sleep(self.idle_interval);
        tokio::pin!(sleep);

        let wake = loop {
            let wake = tokio::select! {
                submission = self.cmd_rx.recv() => Wake::Submission(submission),
                raw = self.framed.read_response() => Wake::Push(raw),
                () = &mut sleep => Wake::Tick,
            };

            match wake {
                Wake::Push(raw) => {
                    let raw = raw?;
                    if let Some(event) = self.protocol.handle_response(&raw) {
                        self.dispatch(event);
                    }
                    if self.closing {
                        return Ok(());
                    }
                }
                other => break other,
            }
        };

        // Idle must be fully torn down before anything else is written.
        self.break_idle().await?;

        match wake {
            Wake::Submission(Some(submission)) => self.run_command(submission).await,
            Wake::Submission(None) => self.closing = true,
            // Timer expiry: the outer loop re-enters idle immediately.
            Wake::Tick => tracing::debug!("renewing idle"),
            Wake::Push(_) => {}
        }

        Ok(())
    }

    /// Ends the active IDLE interval: writes `DONE` as a single raw
    /// buffer and drains responses until the IDLE completion arrives, so
    /// the next command's bytes always follow the DONE on the wire.
    async fn break_idle(&mut self) -> Result<()> {
        if !self.protocol.is_idle() {
            return Ok(());
        }
        tracing::debug!("breaking idle");
        self.framed.write_raw(DONE).await?;

        while self.protocol.in_flight() {
            let raw = self.framed.read_response().await?;
            match self.protocol.handle_response(&raw) {
                Some(ProtocolEvent::CommandComplete(_)) => break,
                Some(event) => self.dispatch(event),
                None => {}
            }
        }

        Ok(())
    }

    /// Answers a `+` continuation according to the command's declared
    /// expectation.
    async fn answer_continuation(
        &mut self,
        action: ContinuationAction,
        text: Option<&str>,
    ) -> Result<()> {
        match action {
            ContinuationAction::XOAuth2 => {
                if let Some(payload) = text
                    && let Some(details) = crate::sasl::decode_continuation(payload)
                {
                    tracing::debug!(%details, "xoauth2 challenge");
                }
                self.framed.write_raw(b"\r\n").await
            }
            ContinuationAction::Ignore => {
                tracing::debug!(?text, "unexpected continuation");
                Ok(())
            }
        }
    }

    /// State transitions driven by command completions, with their
    /// observer events.
    fn apply_transition(&mut self, command: &Command, outcome: &CommandOutcome) {
        let ok = outcome.status.is_ok();

        match command {
            Command::Login { .. } | Command::Authenticate { .. } if ok => {
                self.protocol.set_state(SessionState::Authenticated);
                self.observer().on_authenticated();
            }

            Command::Select { mailbox, .. } | Command::Examine { mailbox, .. } => {
                let previous = self
                    .protocol
                    .state()
                    .selected_mailbox()
                    .map(str::to_string);

                let read_only = matches!(command, Command::Examine { .. })
                    || matches!(outcome.code, Some(ResponseCode::ReadOnly));

                if ok {
                    self.protocol.set_state(SessionState::Selected(SelectedState {
                        mailbox: mailbox.as_str().to_string(),
                        read_only,
                    }));
                } else if previous.is_some() {
                    // A failed SELECT leaves no mailbox selected.
                    self.protocol.set_state(SessionState::Authenticated);
                }

                if let Some(previous) = previous
                    && (!ok || previous != mailbox.as_str())
                {
                    self.observer().on_mailbox_closed(&previous);
                }

                if ok {
                    let info = parse_select_info(outcome, read_only);
                    self.observer().on_mailbox_selected(mailbox.as_str(), &info);
                }
            }

            Command::Logout => {
                if let Some(previous) = self
                    .protocol
                    .state()
                    .selected_mailbox()
                    .map(str::to_string)
                {
                    self.observer().on_mailbox_closed(&previous);
                }
                self.protocol.set_state(SessionState::Logout);
                self.closing = true;
            }

            _ => {}
        }
    }

    /// Routes a protocol event to the session observers.
    fn dispatch(&mut self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::Unsolicited(untagged) => match untagged {
                UntaggedResponse::Exists(count) => self.observer().on_exists(count),
                UntaggedResponse::Expunge(seq) => self.observer().on_expunge(seq.get()),
                UntaggedResponse::Fetch { seq, fields } => {
                    let message = Message::from_fields(seq.get(), fields);
                    self.observer().on_fetch(&message);
                }
                UntaggedResponse::Capability(_) | UntaggedResponse::Ok { .. } => {
                    self.sync_shared();
                }
                _ => {}
            },
            ProtocolEvent::Bye { text } => {
                tracing::info!(text, "server closing connection");
                self.closing = true;
            }
            ProtocolEvent::Continuation { text } => {
                tracing::debug!(?text, "continuation outside a command window");
            }
            ProtocolEvent::Greeting { .. } | ProtocolEvent::CommandComplete(_) => {}
        }
    }

    /// Fails the in-flight command on a dead connection.
    fn fail(&mut self, reply: oneshot::Sender<Result<CommandOutcome>>, error: Error) {
        self.protocol.abort_in_flight();
        self.closing = true;
        self.observer().on_error(&error);
        let _ = reply.send(Err(error));
    }

    /// Mirrors protocol state into the shared snapshot the session handle
    /// reads from.
    fn sync_shared(&self) {
        let mut shared = lock(&self.shared);
        shared.state = self.protocol.state().clone();
        shared.capabilities = self.protocol.capabilities().to_vec();
    }

    fn observer(&self) -> MutexGuard<'_, Box<dyn SessionObserver>> {
        lock(&self.observer)
    }

    fn shutdown(&mut self) {
        self.protocol.abort_in_flight();

        if let Some(previous) = self
            .protocol
            .state()
            .selected_mailbox()
            .map(str::to_string)
        {
            self.observer().on_mailbox_closed(&previous);
        }
        self.protocol.set_state(SessionState::Logout);
        self.sync_shared();

        self.observer().on_closed();

        // Anything still queued will never run.
        self.cmd_rx.close();
        while let Ok(submission) = self.cmd_rx.try_recv() {
            let _ = submission
                .reply
                .send(Err(Error::ConnectionLost("session closed".to_string())));
        }

        tracing::debug!("session driver stopped");
    }
}

/// Locks a mutex, recovering from poisoning; observer panics must not
/// wedge the session.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
