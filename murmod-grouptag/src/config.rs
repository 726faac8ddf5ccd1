// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::time::Duration;

use murmod_core::{ServerId, ServerScope};
use serde::{Deserialize, Serialize};

/// Default number of seconds between two evaluation passes.
pub const DEFAULT_INTERVAL: u64 = 10;

/// Configuration of the grouptag module.
///
/// The hosting framework is responsible for loading and validating this
/// structure; the module only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTagConfig {
    /// Seconds between two evaluation passes.
    pub interval: u64,

    /// Servers to manage. An empty list means all booted servers.
    pub servers: Vec<ServerId>,

    /// Rule set applied to every server without an override.
    pub all: RuleSet,

    /// Per-server override rule sets.
    pub server_rules: HashMap<ServerId, RuleSet>,
}

impl Default for GroupTagConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            servers: Vec::new(),
            all: RuleSet::default(),
            server_rules: HashMap::new(),
        }
    }
}

impl GroupTagConfig {
    /// The rule set applicable to `server`: its override if one is
    /// configured, otherwise the default set.
    pub fn rule_set(&self, server: ServerId) -> &RuleSet {
        self.server_rules.get(&server).unwrap_or(&self.all)
    }

    /// Subscription scope derived from the configured server list.
    pub fn scope(&self) -> ServerScope {
        ServerScope::from_ids(&self.servers)
    }

    /// Pass interval as a duration. Tokio rejects zero-length timer periods,
    /// so the floor is one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }
}

/// An ordered sequence of `group:tag` mapping entries.
///
/// Entries stay raw strings here; they are split at evaluation time so that
/// a malformed entry degrades to a logged warning instead of failing the
/// whole configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub groupmap: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            groupmap: vec!["admin:admin".to_string()],
        }
    }
}
