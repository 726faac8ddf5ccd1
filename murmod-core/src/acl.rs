// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A permission group as declared in a channel's access control list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AclGroup {
    /// Group name, unique within one ACL.
    pub name: String,

    /// Account ids of the group members.
    pub members: HashSet<AccountId>,
}

/// Access control list of a single channel.
///
/// Group order is preserved as reported by the server.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Acl {
    pub groups: Vec<AclGroup>,

    /// Whether the channel inherits ACL entries from its parent.
    pub inherit: bool,
}
