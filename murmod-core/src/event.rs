// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{ChannelId, ServerId, SessionId, User};

/// Lifecycle notifications delivered to a module by the hosting transport.
///
/// Server-level events carry the id of the originating virtual server; the
/// last two variants are meta-level (process-wide) events. Modules receive
/// every variant for the servers they subscribed to and are expected to
/// ignore the ones they do not care about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModuleEvent {
    UserConnected {
        server: ServerId,
        user: User,
    },
    UserDisconnected {
        server: ServerId,
        user: User,
    },
    UserStateChanged {
        server: ServerId,
        user: User,
    },
    TextMessage {
        server: ServerId,
        session: SessionId,
        message: String,
    },
    ChannelCreated {
        server: ServerId,
        channel: ChannelId,
    },
    ChannelRemoved {
        server: ServerId,
        channel: ChannelId,
    },
    ChannelStateChanged {
        server: ServerId,
        channel: ChannelId,
    },
    ServerStarted {
        server: ServerId,
    },
    ServerStopped {
        server: ServerId,
    },
}

impl ModuleEvent {
    /// Id of the virtual server this event originated from.
    pub fn server(&self) -> ServerId {
        match self {
            ModuleEvent::UserConnected { server, .. }
            | ModuleEvent::UserDisconnected { server, .. }
            | ModuleEvent::UserStateChanged { server, .. }
            | ModuleEvent::TextMessage { server, .. }
            | ModuleEvent::ChannelCreated { server, .. }
            | ModuleEvent::ChannelRemoved { server, .. }
            | ModuleEvent::ChannelStateChanged { server, .. }
            | ModuleEvent::ServerStarted { server }
            | ModuleEvent::ServerStopped { server } => *server,
        }
    }
}

/// The set of virtual servers a subscription applies to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ServerScope {
    /// All servers booted now or in the future.
    #[default]
    All,

    /// Only the listed servers.
    Ids(Vec<ServerId>),
}

impl ServerScope {
    /// An empty id list is the "all booted servers" sentinel.
    pub fn from_ids(ids: &[ServerId]) -> Self {
        if ids.is_empty() {
            ServerScope::All
        } else {
            ServerScope::Ids(ids.to_vec())
        }
    }

    pub fn contains(&self, server: ServerId) -> bool {
        match self {
            ServerScope::All => true,
            ServerScope::Ids(ids) => ids.contains(&server),
        }
    }
}
