// SPDX-License-Identifier: MIT OR Apache-2.0

mod acl;
mod event;
#[cfg(feature = "test_utils")]
pub mod test_utils;
mod traits;
mod user;

pub use acl::{Acl, AclGroup};
pub use event::{ModuleEvent, ServerScope};
pub use traits::{EventSender, Runtime, RuntimeError, VirtualServer};
pub use user::{User, UserState};

/// Stable identifier of a virtual server instance.
pub type ServerId = u64;

/// Identifier of a single user connection.
///
/// A session id is unique only while the connection is alive; the server is
/// free to hand it out again after the user disconnects.
pub type SessionId = u32;

/// Stable identifier of a registered account.
///
/// Unlike a session id this survives reconnects, which makes it the key used
/// for group membership tests. By convention `-1` marks an unregistered
/// (anonymous) user.
pub type AccountId = i64;

/// Identifier of a channel on a virtual server.
pub type ChannelId = u64;

/// The root channel, which carries the server-wide access control list.
pub const ROOT_CHANNEL: ChannelId = 0;
