// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodically inspects the users connected to one or more virtual voice
//! servers and rewrites their display names to carry tags derived from
//! permission group membership.
//!
//! The module is a reactive polling add-on: a recurring timer drives full
//! re-evaluation passes over all managed servers, and a user connecting
//! triggers an immediate off-cycle pass. Which tag a group maps to is
//! controlled by ordered `group:tag` rules, with an optional per-server
//! override of the default rule set.

mod actor;
mod config;
mod module;
mod name;
mod sessions;
mod tags;

pub use config::{DEFAULT_INTERVAL, GroupTagConfig, RuleSet};
pub use module::{GroupTag, GroupTagError};
pub use name::rewrite_name;
pub use tags::{Rule, compute_tags, is_member};
