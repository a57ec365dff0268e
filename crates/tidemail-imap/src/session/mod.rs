//! High-level IMAP session.
//!
//! [`Session`] is a cheap handle onto a background driver task that owns
//! the connection. All commands funnel through a serial queue; between
//! commands the driver keeps the connection in IDLE (or NOOP polling) so
//! server pushes reach the [`SessionObserver`] at any time.
//!
//! ## Example
//!
//! ```ignore
//! use tidemail_imap::{Auth, NoopObserver, SearchCriteria, Session, SessionConfig};
//!
//! let config = SessionConfig::new("imap.example.com")
//!     .auth(Auth::password("user@example.com", "password"));
//! let session = Session::connect(config, NoopObserver).await?;
//!
//! let mailboxes = session.list_mailboxes().await?;
//! let info = session.select_mailbox("INBOX", &Default::default()).await?;
//! println!("{} messages", info.exists);
//!
//! let unseen = session.search(&SearchCriteria::Unseen, &Default::default()).await?;
//! session.close().await?;
//! ```

mod driver;

pub(crate) use driver::lock;
use driver::{ContinuationAction, Driver, ObserverHandle, Submission};

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::command::{Command, FetchItems, SearchCriteria, StoreAction};
use crate::connection::{Auth, FramedStream, ImapStream, Security, SessionConfig};
use crate::mailboxes::{MailboxNode, check_special_use, ensure_path};
use crate::message::{Message, parse_fetch_records};
use crate::parser::UntaggedResponse;
use crate::protocol::{CommandOutcome, Protocol, ProtocolEvent, SessionState};
use crate::sasl::xoauth2_token;
use crate::types::{
    Capability, Mailbox, MailboxInfo, Namespace, ResponseCode, SequenceSet, Status,
};
use crate::{Error, Result, SessionObserver};

/// Command queue depth; submitters back off once this many commands wait.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// Options for [`Session::select_mailbox`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    /// Open via EXAMINE (read-only).
    pub read_only: bool,
    /// Request CONDSTORE tracking for the mailbox.
    pub condstore: bool,
}

/// Options for [`Session::list_messages`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Address messages by UID instead of sequence number.
    pub by_uid: bool,
    /// Only messages changed since this mod-sequence (CONDSTORE).
    pub changed_since: Option<u64>,
}

/// Options for [`Session::search`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Return UIDs instead of sequence numbers.
    pub by_uid: bool,
}

/// Options for [`Session::set_flags`] and the message-removal calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Address messages by UID instead of sequence number.
    pub by_uid: bool,
    /// Suppress the untagged FETCH echoes (`.SILENT`).
    pub silent: bool,
}

/// Session state snapshot shared between the driver and the handle.
pub(crate) struct Shared {
    pub(crate) state: SessionState,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) server_id: Option<Vec<(String, String)>>,
}

/// A connected IMAP session.
pub struct Session {
    shared: Arc<Mutex<Shared>>,
    observer: ObserverHandle,
    cmd_tx: mpsc::Sender<Submission>,
}

impl Session {
    /// Connects, reads the greeting, and runs the handshake: capability
    /// negotiation, client identification, then login.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached, does not greet within the
    /// configured deadline, or rejects authentication. Handshake failures
    /// are reported to the observer and followed by a best-effort LOGOUT.
    pub async fn connect(
        config: SessionConfig,
        observer: impl SessionObserver + 'static,
    ) -> Result<Self> {
        let deadline = config.connection_timeout;
        let connect = async {
            match config.security {
                Security::Tls => crate::connection::connect_tls(&config.host, config.port).await,
                Security::Plain => {
                    crate::connection::connect_plain(&config.host, config.port).await
                }
            }
        };

        let stream: ImapStream = timeout(deadline, connect)
            .await
            .map_err(|_| Error::Timeout(deadline))??;

        Self::from_stream(stream, config, observer).await
    }

    /// Runs a session over an already-connected stream.
    ///
    /// This is the seam the integration tests use with in-memory streams;
    /// [`Session::connect`] goes through it too.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::connect`], minus the TCP/TLS
    /// setup.
    pub async fn from_stream<S>(
        stream: S,
        config: SessionConfig,
        observer: impl SessionObserver + 'static,
    ) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let observer: ObserverHandle = Arc::new(Mutex::new(Box::new(observer)));
        let mut framed = FramedStream::new(stream);
        let mut protocol = Protocol::new();

        // The connection timer covers the greeting; it is disarmed the
        // moment the greeting parses.
        let deadline = config.connection_timeout;
        let greeting = match timeout(deadline, framed.read_response()).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => {
                lock(&observer).on_error(&error);
                return Err(error);
            }
            Err(_) => {
                let error = Error::Timeout(deadline);
                lock(&observer).on_error(&error);
                return Err(error);
            }
        };

        match protocol.handle_response(&greeting) {
            Some(ProtocolEvent::Greeting {
                status: Status::Bye,
                text,
            }) => {
                let error = Error::Bye(text);
                lock(&observer).on_error(&error);
                return Err(error);
            }
            Some(ProtocolEvent::Greeting { .. }) => {}
            _ => {
                let error = Error::Protocol("expected server greeting".to_string());
                lock(&observer).on_error(&error);
                return Err(error);
            }
        }
        tracing::debug!("greeting received");
        protocol.set_state(SessionState::NotAuthenticated);

        let shared = Arc::new(Mutex::new(Shared {
            state: SessionState::NotAuthenticated,
            capabilities: protocol.capabilities().to_vec(),
            server_id: None,
        }));

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let driver = Driver::new(
            framed,
            protocol,
            Arc::clone(&shared),
            Arc::clone(&observer),
            cmd_rx,
            config.noop_interval,
            config.idle_interval,
        );
        tokio::spawn(driver.run());

        let session = Self {
            shared,
            observer,
            cmd_tx,
        };

        if let Err(error) = session.handshake(&config).await {
            lock(&session.observer).on_error(&error);
            let _ = session.close().await;
            return Err(error);
        }

        Ok(session)
    }

    /// The serial post-connect handshake.
    async fn handshake(&self, config: &SessionConfig) -> Result<()> {
        self.update_capability(false).await?;
        self.update_id(config.id.clone()).await?;
        if let Some(auth) = &config.auth {
            self.login(auth).await?;
        }
        Ok(())
    }

    /// Submits a command and waits for its tagged completion.
    async fn exec(
        &self,
        command: Command,
        accept: &[&'static str],
        continuation: ContinuationAction,
    ) -> Result<CommandOutcome> {
        let (reply, completion) = oneshot::channel();

        self.cmd_tx
            .send(Submission {
                command,
                accept: accept.to_vec(),
                continuation,
                reply,
            })
            .await
            .map_err(|_| Error::ConnectionLost("session driver gone".to_string()))?;

        completion
            .await
            .map_err(|_| Error::ConnectionLost("connection closed during command".to_string()))?
    }

    // === Session state ===

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        lock(&self.shared).state.clone()
    }

    /// Returns the selected mailbox path, if a mailbox is open.
    #[must_use]
    pub fn selected_mailbox(&self) -> Option<String> {
        lock(&self.shared).state.selected_mailbox().map(String::from)
    }

    /// Case-insensitive capability lookup.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        lock(&self.shared)
            .capabilities
            .iter()
            .any(|c| c.matches(name))
    }

    /// Returns the negotiated capability set.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        lock(&self.shared).capabilities.clone()
    }

    /// Returns the server identification received via ID, if any.
    #[must_use]
    pub fn server_id(&self) -> Option<Vec<(String, String)>> {
        lock(&self.shared).server_id.clone()
    }

    // === Protocol operations ===

    /// Refreshes the capability set.
    ///
    /// Returns `false` without touching the wire when capabilities are
    /// already cached and `forced` is unset; `true` when CAPABILITY ran.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected CAPABILITY command.
    pub async fn update_capability(&self, forced: bool) -> Result<bool> {
        if !forced && !lock(&self.shared).capabilities.is_empty() {
            return Ok(false);
        }

        self.exec(Command::Capability, &["capability"], ContinuationAction::Ignore)
            .await?
            .check()?;
        Ok(true)
    }

    /// Exchanges client/server identification (RFC 2971).
    ///
    /// Returns `None` when the server does not advertise `ID`; otherwise
    /// the server's identification pairs, keys lowercased.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected ID command.
    pub async fn update_id(
        &self,
        params: Option<Vec<(String, String)>>,
    ) -> Result<Option<Vec<(String, String)>>> {
        if !self.has_capability("ID") {
            return Ok(None);
        }

        let outcome = self
            .exec(
                Command::Id { parameters: params },
                &["id"],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        let id = outcome
            .payload
            .iter()
            .find_map(|record| match record {
                UntaggedResponse::Id(id) => Some(id.clone()),
                _ => None,
            })
            .flatten();

        tracing::debug!(?id, "server id");
        lock(&self.shared).server_id = id.clone();
        Ok(id)
    }

    /// Authenticates the session.
    ///
    /// XOAUTH2 is used iff the server advertises `AUTH=XOAUTH2` and a
    /// token is present; LOGIN otherwise. On success the capability set
    /// is refreshed from the completion, or re-fetched if the server did
    /// not volunteer one.
    ///
    /// # Errors
    ///
    /// `No`/`Bad` for rejected credentials; `InvalidState` when the auth
    /// material has no usable mechanism.
    pub async fn login(&self, auth: &Auth) -> Result<()> {
        let outcome = if self.has_capability("AUTH=XOAUTH2")
            && let Some(access_token) = &auth.xoauth2
        {
            tracing::debug!(user = %auth.user, "authenticating via XOAUTH2");
            self.exec(
                Command::Authenticate {
                    mechanism: "XOAUTH2".to_string(),
                    initial_response: Some(xoauth2_token(&auth.user, access_token)),
                },
                &["capability"],
                ContinuationAction::XOAuth2,
            )
            .await?
        } else if let Some(pass) = &auth.pass {
            tracing::debug!(user = %auth.user, "authenticating via LOGIN");
            self.exec(
                Command::Login {
                    username: auth.user.clone(),
                    password: pass.clone(),
                },
                &["capability"],
                ContinuationAction::Ignore,
            )
            .await?
        } else {
            return Err(Error::InvalidState(
                "no usable authentication mechanism".to_string(),
            ));
        };

        // Capability refresh priority: the tagged [CAPABILITY ...] code,
        // an untagged CAPABILITY in the payload, else ask explicitly.
        let volunteered = matches!(outcome.code, Some(ResponseCode::Capability(_)))
            || outcome
                .payload
                .iter()
                .any(|r| matches!(r, UntaggedResponse::Capability(_)));

        outcome.check()?;

        if !volunteered {
            self.update_capability(true).await?;
        }

        Ok(())
    }

    /// Ends the session with LOGOUT.
    ///
    /// Completion of the LOGOUT command (success or error, either way)
    /// finishes the close; a dead connection is already closed.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for teardown
    /// diagnostics.
    pub async fn close(&self) -> Result<()> {
        let _ = self
            .exec(Command::Logout, &[], ContinuationAction::Ignore)
            .await;
        Ok(())
    }

    // === Mailbox operations ===

    /// Lists namespaces (RFC 2342).
    ///
    /// Returns `None` when the server does not advertise `NAMESPACE` or
    /// sent no namespace payload.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected NAMESPACE command.
    pub async fn list_namespaces(&self) -> Result<Option<Namespace>> {
        if !self.has_capability("NAMESPACE") {
            return Ok(None);
        }

        let outcome = self
            .exec(Command::Namespace, &["namespace"], ContinuationAction::Ignore)
            .await?
            .check()?;

        Ok(outcome.payload.into_iter().find_map(|record| match record {
            UntaggedResponse::Namespace(ns) => Some(ns),
            _ => None,
        }))
    }

    /// Lists all mailboxes as a tree rooted at an anonymous node.
    ///
    /// LIST supplies the structure and attributes, LSUB marks
    /// subscriptions, and each listed node gets special-use detection
    /// (LIST attributes when SPECIAL-USE is advertised, localized-name
    /// heuristics otherwise).
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected LIST; LSUB failures are
    /// tolerated.
    pub async fn list_mailboxes(&self) -> Result<MailboxNode> {
        let mut tree = MailboxNode::root();
        let special_use = self.has_capability("SPECIAL-USE");

        let outcome = self
            .exec(
                Command::List {
                    reference: String::new(),
                    pattern: "*".to_string(),
                },
                &["list"],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        for record in outcome.payload {
            if let UntaggedResponse::List(item) = record {
                let delimiter = item.delimiter.map(String::from).unwrap_or_default();
                let branch = ensure_path(&mut tree, item.mailbox.as_str(), &delimiter);
                branch.flags = item.attributes;
                branch.listed = true;
                check_special_use(branch, special_use);
            }
        }

        // Some servers reject LSUB outright; the tree is still useful.
        match self
            .exec(
                Command::Lsub {
                    reference: String::new(),
                    pattern: "*".to_string(),
                },
                &["lsub"],
                ContinuationAction::Ignore,
            )
            .await
            .and_then(CommandOutcome::check)
        {
            Ok(outcome) => {
                for record in outcome.payload {
                    if let UntaggedResponse::Lsub(item) = record {
                        let delimiter = item.delimiter.map(String::from).unwrap_or_default();
                        let branch = ensure_path(&mut tree, item.mailbox.as_str(), &delimiter);
                        branch.subscribed = true;
                    }
                }
            }
            Err(error) => tracing::warn!(%error, "LSUB failed"),
        }

        Ok(tree)
    }

    /// Opens a mailbox with SELECT (or EXAMINE when read-only).
    ///
    /// The observer sees `on_mailbox_closed` for a previously open path
    /// and `on_mailbox_selected` for the new one.
    ///
    /// # Errors
    ///
    /// Returns the server's error when the mailbox cannot be opened; the
    /// session then has no mailbox selected.
    pub async fn select_mailbox(&self, path: &str, options: &SelectOptions) -> Result<MailboxInfo> {
        let condstore = options.condstore && self.has_capability("CONDSTORE");
        let mailbox = Mailbox::new(path);

        let command = if options.read_only {
            Command::Examine { mailbox, condstore }
        } else {
            Command::Select { mailbox, condstore }
        };

        let outcome = self
            .exec(command, &["exists", "flags", "ok"], ContinuationAction::Ignore)
            .await?
            .check()?;

        Ok(parse_select_info(&outcome, options.read_only))
    }

    // === Message operations ===

    /// Fetches message data for a sequence set.
    ///
    /// `items` defaults to the FAST macro; see
    /// [`FetchItems::from_strings`] for item expressions.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected FETCH.
    pub async fn list_messages(
        &self,
        sequence: &SequenceSet,
        items: FetchItems,
        options: &FetchOptions,
    ) -> Result<Vec<Message>> {
        let changed_since = options
            .changed_since
            .filter(|_| self.has_capability("CONDSTORE"));

        let outcome = self
            .exec(
                Command::Fetch {
                    sequence: sequence.clone(),
                    items,
                    uid: options.by_uid,
                    changed_since,
                },
                &["fetch"],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        Ok(parse_fetch_records(&outcome.payload))
    }

    /// Searches the selected mailbox.
    ///
    /// The result is a sorted, deduplicated list of message numbers (or
    /// UIDs with [`SearchOptions::by_uid`]), however the server split or
    /// ordered its SEARCH responses.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected SEARCH.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        options: &SearchOptions,
    ) -> Result<Vec<u32>> {
        let outcome = self
            .exec(
                Command::Search {
                    criteria: criteria.clone(),
                    uid: options.by_uid,
                },
                &["search"],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        let mut results: Vec<u32> = outcome
            .payload
            .iter()
            .flat_map(|record| match record {
                UntaggedResponse::Search(nums) => nums.as_slice(),
                _ => &[],
            })
            .copied()
            .collect();

        results.sort_unstable();
        results.dedup();
        Ok(results)
    }

    /// Applies a flag mutation to a sequence set.
    ///
    /// Returns the FETCH echoes, which are empty in silent mode.
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected STORE.
    pub async fn set_flags(
        &self,
        sequence: &SequenceSet,
        action: StoreAction,
        options: &StoreOptions,
    ) -> Result<Vec<Message>> {
        let outcome = self
            .exec(
                Command::Store {
                    sequence: sequence.clone(),
                    action,
                    uid: options.by_uid,
                    silent: options.silent,
                },
                &["fetch"],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        Ok(parse_fetch_records(&outcome.payload))
    }

    /// Deletes messages: marks them `\Deleted`, then expunges.
    ///
    /// With UIDPLUS and [`StoreOptions::by_uid`] only the addressed
    /// messages are expunged (UID EXPUNGE); otherwise a full EXPUNGE
    /// runs. The result lists the expunged sequence numbers exactly as
    /// the server reported them, unsorted and with duplicates kept.
    ///
    /// # Errors
    ///
    /// Returns the server's error from the STORE or EXPUNGE step.
    pub async fn delete_messages(
        &self,
        sequence: &SequenceSet,
        options: &StoreOptions,
    ) -> Result<Vec<u32>> {
        self.set_flags(
            sequence,
            StoreAction::Add(vec![crate::types::Flag::Deleted]),
            &StoreOptions {
                by_uid: options.by_uid,
                silent: true,
            },
        )
        .await?;

        let command = if options.by_uid && self.has_capability("UIDPLUS") {
            Command::UidExpunge {
                uids: sequence.clone(),
            }
        } else {
            Command::Expunge
        };

        let outcome = self
            .exec(command, &["expunge"], ContinuationAction::Ignore)
            .await?
            .check()?;

        Ok(collect_expunged(&outcome))
    }

    /// Copies messages to another mailbox.
    ///
    /// Returns the server's human-readable completion text (which carries
    /// COPYUID details on UIDPLUS servers).
    ///
    /// # Errors
    ///
    /// Returns the server's error for a rejected COPY.
    pub async fn copy_messages(
        &self,
        sequence: &SequenceSet,
        destination: &str,
        options: &StoreOptions,
    ) -> Result<String> {
        let outcome = self
            .exec(
                Command::Copy {
                    sequence: sequence.clone(),
                    mailbox: Mailbox::new(destination),
                    uid: options.by_uid,
                },
                &[],
                ContinuationAction::Ignore,
            )
            .await?
            .check()?;

        Ok(outcome.text)
    }

    /// Moves messages to another mailbox.
    ///
    /// Uses server-side MOVE when advertised; otherwise falls back to
    /// COPY plus delete. Either way the result lists the expunged
    /// sequence numbers in arrival order.
    ///
    /// # Errors
    ///
    /// Returns the server's error from the MOVE (or fall-back) steps.
    pub async fn move_messages(
        &self,
        sequence: &SequenceSet,
        destination: &str,
        options: &StoreOptions,
    ) -> Result<Vec<u32>> {
        if self.has_capability("MOVE") {
            let outcome = self
                .exec(
                    Command::Move {
                        sequence: sequence.clone(),
                        mailbox: Mailbox::new(destination),
                        uid: options.by_uid,
                    },
                    &["expunge"],
                    ContinuationAction::Ignore,
                )
                .await?
                .check()?;

            return Ok(collect_expunged(&outcome));
        }

        self.copy_messages(sequence, destination, options).await?;
        self.delete_messages(sequence, options).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = lock(&self.shared);
        f.debug_struct("Session")
            .field("state", &shared.state)
            .field("capabilities", &shared.capabilities)
            .finish_non_exhaustive()
    }
}

/// Extracts mailbox information from a SELECT/EXAMINE completion.
pub(crate) fn parse_select_info(outcome: &CommandOutcome, examine: bool) -> MailboxInfo {
    let mut info = MailboxInfo {
        read_only: examine,
        ..MailboxInfo::default()
    };

    for record in &outcome.payload {
        match record {
            UntaggedResponse::Exists(n) => info.exists = *n,
            UntaggedResponse::Flags(flags) => info.flags = flags.clone(),
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::PermanentFlags(flags) => info.permanent_flags = Some(flags.clone()),
                ResponseCode::UidValidity(v) => info.uid_validity = Some(*v),
                ResponseCode::UidNext(v) => info.uid_next = Some(*v),
                ResponseCode::HighestModSeq(v) => info.highest_modseq = Some(*v),
                _ => {}
            },
            _ => {}
        }
    }

    if matches!(outcome.code, Some(ResponseCode::ReadOnly)) {
        info.read_only = true;
    }

    info
}

/// Collects EXPUNGE numbers from a completion payload, in arrival order.
/// Deliberately neither sorted nor deduplicated.
fn collect_expunged(outcome: &CommandOutcome) -> Vec<u32> {
    outcome
        .payload
        .iter()
        .filter_map(|record| match record {
            UntaggedResponse::Expunge(seq) => Some(seq.get()),
            _ => None,
        })
        .collect()
}
