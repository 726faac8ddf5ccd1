// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};

use murmod_core::{ServerId, SessionId};

/// Per-server bookkeeping of the sessions covered by evaluation passes.
///
/// Owned exclusively by the scheduler actor; all mutation happens on its
/// task, which is what makes the shared-state discipline of the map a
/// structural property instead of a locking convention.
#[derive(Debug, Default)]
pub(crate) struct AffectedSessions {
    by_server: HashMap<ServerId, HashSet<SessionId>>,
}

impl AffectedSessions {
    /// Ensures a tracking set exists for this server.
    pub(crate) fn track(&mut self, server: ServerId) {
        self.by_server.entry(server).or_default();
    }

    /// Drops one session; no-op when the session or server is unknown.
    pub(crate) fn remove(&mut self, server: ServerId, session: SessionId) {
        if let Some(sessions) = self.by_server.get_mut(&server) {
            sessions.remove(&session);
        }
    }

    /// Resets a server's tracking set to empty.
    pub(crate) fn reset(&mut self, server: ServerId) {
        self.by_server.insert(server, HashSet::new());
    }

    /// Drops all bookkeeping, across every server.
    pub(crate) fn clear(&mut self) {
        self.by_server.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::AffectedSessions;

    #[test]
    fn remove_only_touches_the_one_session() {
        let mut affected = AffectedSessions::default();
        affected.by_server.insert(1, HashSet::from([10, 11]));
        affected.by_server.insert(2, HashSet::from([10]));

        affected.remove(1, 10);

        assert_eq!(affected.by_server[&1], HashSet::from([11]));
        assert_eq!(affected.by_server[&2], HashSet::from([10]));
    }

    #[test]
    fn remove_is_a_noop_for_unknown_targets() {
        let mut affected = AffectedSessions::default();
        affected.by_server.insert(1, HashSet::from([10]));

        affected.remove(1, 99);
        affected.remove(7, 10);

        assert_eq!(affected.by_server[&1], HashSet::from([10]));
        assert!(!affected.by_server.contains_key(&7));
    }

    #[test]
    fn reset_empties_a_single_server() {
        let mut affected = AffectedSessions::default();
        affected.by_server.insert(1, HashSet::from([10]));
        affected.by_server.insert(2, HashSet::from([20]));

        affected.reset(1);

        assert!(affected.by_server[&1].is_empty());
        assert_eq!(affected.by_server[&2], HashSet::from([20]));
    }

    #[test]
    fn track_never_clobbers_an_existing_set() {
        let mut affected = AffectedSessions::default();
        affected.by_server.insert(1, HashSet::from([10]));

        affected.track(1);
        affected.track(2);

        assert_eq!(affected.by_server[&1], HashSet::from([10]));
        assert!(affected.by_server[&2].is_empty());
    }
}
