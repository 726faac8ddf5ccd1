// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory runtime for exercising modules without a live server process.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::{
    AccountId, Acl, AclGroup, ChannelId, EventSender, ModuleEvent, Runtime, RuntimeError, ServerId,
    ServerScope, SessionId, User, UserState, VirtualServer,
};

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

#[derive(Debug, Default)]
struct ServerEntry {
    users: HashMap<SessionId, User>,
    acl: Acl,
    committed: Vec<UserState>,
    fail_next_acl: bool,
}

#[derive(Debug, Default)]
struct Inner {
    servers: BTreeMap<ServerId, ServerEntry>,
    subscription: Option<(ServerScope, EventSender)>,
}

/// Cloneable in-memory stand-in for the hosting runtime.
///
/// Tests mutate servers, users and groups through the handle while a module
/// under test queries them through the [`Runtime`] / [`VirtualServer`]
/// traits. Committed renames are recorded per server and applied to the
/// stored users, so a later evaluation pass observes them like it would on a
/// live server.
#[derive(Clone, Debug, Default)]
pub struct MemoryRuntime {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_server(&self, id: ServerId) {
        let mut inner = self.inner.lock().unwrap();
        inner.servers.entry(id).or_default();
    }

    pub fn remove_server(&self, id: ServerId) {
        let mut inner = self.inner.lock().unwrap();
        inner.servers.remove(&id);
    }

    pub fn add_user(&self, server: ServerId, session: SessionId, account: AccountId, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.servers.entry(server).or_default();
        entry.users.insert(
            session,
            User {
                session,
                account,
                name: name.to_string(),
            },
        );
    }

    pub fn add_group(&self, server: ServerId, name: &str, members: &[AccountId]) {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.servers.entry(server).or_default();
        entry.acl.groups.push(AclGroup {
            name: name.to_string(),
            members: members.iter().copied().collect::<HashSet<_>>(),
        });
    }

    /// Makes the next `acl()` query against this server fail once.
    pub fn fail_next_acl(&self, server: ServerId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.servers.get_mut(&server) {
            entry.fail_next_acl = true;
        }
    }

    /// All renames committed against this server so far, in commit order.
    pub fn committed(&self, server: ServerId) -> Vec<UserState> {
        let inner = self.inner.lock().unwrap();
        inner
            .servers
            .get(&server)
            .map(|entry| entry.committed.clone())
            .unwrap_or_default()
    }

    /// Current display name of a connected user.
    pub fn user_name(&self, server: ServerId, session: SessionId) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .servers
            .get(&server)?
            .users
            .get(&session)
            .map(|user| user.name.clone())
    }

    /// Scope the module subscribed with, if it subscribed at all.
    pub fn subscribed_scope(&self) -> Option<ServerScope> {
        let inner = self.inner.lock().unwrap();
        inner
            .subscription
            .as_ref()
            .map(|(scope, _)| scope.clone())
    }

    /// Delivers an event through the channel captured at subscribe time.
    ///
    /// Events originating outside the subscribed scope are dropped, like the
    /// hosting transport would drop them.
    pub async fn emit(&self, event: ModuleEvent) {
        let sender = {
            let inner = self.inner.lock().unwrap();
            let (scope, sender) = inner
                .subscription
                .as_ref()
                .expect("no module subscribed to this runtime");
            if !scope.contains(event.server()) {
                return;
            }
            sender.clone()
        };
        sender.send(event).await.expect("module event channel closed");
    }
}

impl Runtime for MemoryRuntime {
    type Server = MemoryServer;

    fn booted_servers(&self) -> Result<Vec<MemoryServer>, RuntimeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .servers
            .keys()
            .map(|id| MemoryServer {
                id: *id,
                inner: self.inner.clone(),
            })
            .collect())
    }

    fn server(&self, id: ServerId) -> Result<Option<MemoryServer>, RuntimeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.servers.contains_key(&id).then(|| MemoryServer {
            id,
            inner: self.inner.clone(),
        }))
    }

    fn subscribe(&self, scope: &ServerScope, events: EventSender) -> Result<(), RuntimeError> {
        let mut inner = self.inner.lock().unwrap();
        inner.subscription = Some((scope.clone(), events));
        Ok(())
    }
}

/// Server handle returned by [`MemoryRuntime`].
#[derive(Clone, Debug)]
pub struct MemoryServer {
    id: ServerId,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryServer {
    fn with_entry<T>(
        &self,
        f: impl FnOnce(&mut ServerEntry) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .servers
            .get_mut(&self.id)
            .ok_or(RuntimeError::ServerGone(self.id))?;
        f(entry)
    }
}

impl VirtualServer for MemoryServer {
    fn id(&self) -> ServerId {
        self.id
    }

    fn users(&self) -> Result<HashMap<SessionId, User>, RuntimeError> {
        self.with_entry(|entry| Ok(entry.users.clone()))
    }

    fn acl(&self, channel: ChannelId) -> Result<Acl, RuntimeError> {
        self.with_entry(|entry| {
            if entry.fail_next_acl {
                entry.fail_next_acl = false;
                return Err(RuntimeError::AclUnavailable(channel));
            }
            Ok(entry.acl.clone())
        })
    }

    fn user_state(&self, session: SessionId) -> Result<UserState, RuntimeError> {
        self.with_entry(|entry| {
            entry
                .users
                .get(&session)
                .map(|user| UserState {
                    session,
                    name: user.name.clone(),
                })
                .ok_or(RuntimeError::UnknownSession(session))
        })
    }

    fn set_user_state(&self, state: UserState) -> Result<(), RuntimeError> {
        self.with_entry(|entry| {
            let user = entry
                .users
                .get_mut(&state.session)
                .ok_or(RuntimeError::UnknownSession(state.session))?;
            user.name = state.name.clone();
            entry.committed.push(state);
            Ok(())
        })
    }
}
