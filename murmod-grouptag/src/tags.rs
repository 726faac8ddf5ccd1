// SPDX-License-Identifier: MIT OR Apache-2.0

use murmod_core::{ROOT_CHANNEL, RuntimeError, User, VirtualServer};
use tracing::{info, warn};

use crate::config::RuleSet;

/// One `group:tag` mapping rule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
    pub group: String,
    pub tag: String,
}

impl Rule {
    /// Splits a raw groupmap entry into its group and tag parts.
    ///
    /// Pieces past the second are ignored; an entry without a `:` separator
    /// is malformed and yields `None`.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut pieces = entry.split(':');
        let group = pieces.next()?;
        let tag = pieces.next()?;
        Some(Self {
            group: group.to_string(),
            tag: tag.to_string(),
        })
    }
}

/// Whether `user` is a member of the named group in the server's root
/// channel ACL.
///
/// An unavailable ACL propagates as an error; it is never treated as "not a
/// member", since that would silently strip tags the user is entitled to.
pub fn is_member<S: VirtualServer>(
    server: &S,
    user: &User,
    group_name: &str,
) -> Result<bool, RuntimeError> {
    let acl = server.acl(ROOT_CHANNEL)?;
    Ok(acl
        .groups
        .iter()
        .any(|group| group.name == group_name && group.members.contains(&user.account)))
}

/// Collects the display tags applying to `user` under the given rules.
///
/// The groupmap is scanned in reverse order and the result keeps first
/// discovery order, deduplicated by tag text. When two groups map to the
/// same tag, the later entry is the one that contributes it. A malformed
/// entry is skipped with a warning and never aborts the scan.
pub fn compute_tags<S: VirtualServer>(
    server: &S,
    user: &User,
    rules: &RuleSet,
) -> Result<Vec<String>, RuntimeError> {
    let mut tags: Vec<String> = Vec::new();

    for (index, entry) in rules.groupmap.iter().enumerate().rev() {
        let Some(rule) = Rule::parse(entry) else {
            warn!(
                "incomplete groupmap entry {} on server {}, ignored",
                index,
                server.id()
            );
            continue;
        };

        if is_member(server, user, &rule.group)? && !tags.contains(&rule.tag) {
            info!(
                "adding tag {} to user {} on server {}",
                rule.tag,
                user.name,
                server.id()
            );
            tags.push(rule.tag);
        }
    }

    Ok(tags)
}
