// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{AccountId, SessionId};

/// A user currently connected to a virtual server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Connection-scoped session id.
    pub session: SessionId,

    /// Stable account id, `-1` for unregistered users.
    pub account: AccountId,

    /// Display name as currently shown to other users.
    pub name: String,
}

/// Mutable slice of server-side user state.
///
/// Retrieved with [`VirtualServer::user_state`] and written back with
/// [`VirtualServer::set_user_state`], which is how a rename is committed.
///
/// [`VirtualServer::user_state`]: crate::VirtualServer::user_state
/// [`VirtualServer::set_user_state`]: crate::VirtualServer::set_user_state
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub session: SessionId,
    pub name: String,
}
