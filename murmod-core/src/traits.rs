// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{Acl, ChannelId, ModuleEvent, ServerId, ServerScope, SessionId, User, UserState};

/// Channel through which the hosting transport delivers lifecycle events to
/// a subscribed module.
pub type EventSender = mpsc::Sender<ModuleEvent>;

/// Error surface of the hosting runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The server disappeared between enumeration and query.
    #[error("virtual server {0} is not booted")]
    ServerGone(ServerId),

    /// No connected user with the given session id.
    #[error("no connected user with session {0}")]
    UnknownSession(SessionId),

    /// The access control list could not be retrieved.
    #[error("access control list of channel {0} is unavailable")]
    AclUnavailable(ChannelId),

    /// Failure in the transport layer between module and runtime.
    #[error("runtime transport error: {0}")]
    Transport(String),
}

/// One virtual server instance of the hosting runtime.
///
/// All methods are synchronous queries into the runtime; they are expected
/// to return quickly and must not block on network round-trips of their own.
pub trait VirtualServer {
    fn id(&self) -> ServerId;

    /// All currently connected users, keyed by session id.
    fn users(&self) -> Result<HashMap<SessionId, User>, RuntimeError>;

    /// Access control list of the given channel.
    fn acl(&self, channel: ChannelId) -> Result<Acl, RuntimeError>;

    /// Current state of one connected user.
    fn user_state(&self, session: SessionId) -> Result<UserState, RuntimeError>;

    /// Writes a user state back to the server, committing any rename.
    fn set_user_state(&self, state: UserState) -> Result<(), RuntimeError>;
}

/// Process-level surface of the hosting runtime.
pub trait Runtime: Send + 'static {
    type Server: VirtualServer;

    /// All virtual servers currently booted.
    fn booted_servers(&self) -> Result<Vec<Self::Server>, RuntimeError>;

    /// Looks up one server by id; `Ok(None)` if it is not booted right now.
    fn server(&self, id: ServerId) -> Result<Option<Self::Server>, RuntimeError>;

    /// Registers the module for server- and meta-level notifications within
    /// `scope`. Events are delivered through `events` until the receiving
    /// half is dropped.
    fn subscribe(&self, scope: &ServerScope, events: EventSender) -> Result<(), RuntimeError>;
}
