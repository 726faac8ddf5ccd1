// SPDX-License-Identifier: MIT OR Apache-2.0

use murmod_core::{ModuleEvent, Runtime, RuntimeError, User, VirtualServer};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::GroupTagConfig;
use crate::name::rewrite_name;
use crate::sessions::AffectedSessions;
use crate::tags::compute_tags;

/// Control messages accepted by the scheduler actor.
#[derive(Debug)]
pub(crate) enum ToGroupTagActor {
    Connect { reply: oneshot::Sender<()> },
    Disconnect { reply: oneshot::Sender<()> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Drives the periodic re-evaluation of user tags.
///
/// The actor is the sole owner of all module state. Timer ticks and incoming
/// lifecycle events are serialized through one `select!` loop, so a pass in
/// progress is never raced by a disconnect or another pass.
pub(crate) struct GroupTagActor<R: Runtime> {
    runtime: R,
    config: GroupTagConfig,
    inbox: mpsc::Receiver<ToGroupTagActor>,
    events_tx: mpsc::Sender<ModuleEvent>,
    events_rx: mpsc::Receiver<ModuleEvent>,
    affected: AffectedSessions,
    connected: bool,
}

impl<R: Runtime> GroupTagActor<R> {
    pub(crate) fn new(
        runtime: R,
        config: GroupTagConfig,
        inbox: mpsc::Receiver<ToGroupTagActor>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            runtime,
            config,
            inbox,
            events_tx,
            events_rx,
            affected: AffectedSessions::default(),
            connected: false,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut ticker = interval(self.config.interval());
        // a pass overrunning the interval delays the next tick instead of
        // bursting to catch up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                msg = self.inbox.recv() => {
                    match msg {
                        Some(ToGroupTagActor::Connect { reply }) => {
                            self.on_connect(&mut ticker);
                            reply.send(()).ok();
                        }
                        Some(ToGroupTagActor::Disconnect { reply }) => {
                            self.on_disconnect();
                            reply.send(()).ok();
                        }
                        Some(ToGroupTagActor::Shutdown { reply }) => {
                            reply.send(()).ok();
                            break;
                        }
                        None => break,
                    }
                }
                Some(event) = self.events_rx.recv(), if self.connected => {
                    self.on_event(event);
                }
                _ = ticker.tick(), if self.connected => {
                    self.run_pass();
                }
            }
        }
    }

    /// Arms the timer and registers for runtime callbacks. A second connect
    /// while already connected leaves the running timer alone.
    fn on_connect(&mut self, ticker: &mut Interval) {
        if self.connected {
            debug!("already connected, timer stays armed");
            return;
        }

        self.affected.clear();

        debug!("registering for server and meta callbacks");
        let scope = self.config.scope();
        if let Err(err) = self.runtime.subscribe(&scope, self.events_tx.clone()) {
            // the timer still drives passes, only off-cycle reactions are lost
            warn!("callback subscription failed: {err}");
        }

        // first pass runs one full interval from now
        ticker.reset();
        self.connected = true;
    }

    fn on_disconnect(&mut self) {
        self.affected.clear();
        self.connected = false;
    }

    fn on_event(&mut self, event: ModuleEvent) {
        match event {
            ModuleEvent::UserConnected { server, user } => {
                debug!("user {} connected to server {}", user.name, server);
                self.run_pass();
            }
            ModuleEvent::UserDisconnected { server, user } => {
                self.affected.remove(server, user.session);
            }
            ModuleEvent::ServerStarted { server } => {
                debug!("handling server {}", server);
                self.affected.reset(server);
            }
            ModuleEvent::ServerStopped { server } => {
                debug!("server {} gone", server);
                self.affected.reset(server);
            }
            // delivered but carrying no work for this module
            ModuleEvent::UserStateChanged { .. }
            | ModuleEvent::TextMessage { .. }
            | ModuleEvent::ChannelCreated { .. }
            | ModuleEvent::ChannelRemoved { .. }
            | ModuleEvent::ChannelStateChanged { .. } => {}
        }
    }

    /// One full evaluation pass. Failures abort the remainder of the pass
    /// but never the actor loop, so the next tick always comes.
    fn run_pass(&mut self) {
        if let Err(err) = self.refresh_all() {
            warn!("tag refresh pass aborted: {err}");
        }
    }

    fn refresh_all(&mut self) -> Result<(), RuntimeError> {
        for server in self.managed_servers()? {
            let server_id = server.id();
            self.affected.track(server_id);

            for user in server.users()?.into_values() {
                self.refresh_user(&server, &user)?;
            }
        }
        Ok(())
    }

    /// The configured servers, or all booted ones when none are configured.
    /// A configured server that is not booted right now is skipped.
    fn managed_servers(&self) -> Result<Vec<R::Server>, RuntimeError> {
        if self.config.servers.is_empty() {
            return self.runtime.booted_servers();
        }

        let mut servers = Vec::with_capacity(self.config.servers.len());
        for id in &self.config.servers {
            match self.runtime.server(*id)? {
                Some(server) => servers.push(server),
                None => debug!("server {} is not booted, skipping", id),
            }
        }
        Ok(servers)
    }

    /// Recomputes one user's tags and commits the rename when the resulting
    /// display name differs from the current one.
    fn refresh_user(&self, server: &R::Server, user: &User) -> Result<(), RuntimeError> {
        let rules = self.config.rule_set(server.id());
        let tags = compute_tags(server, user, rules)?;

        let new_name = rewrite_name(&user.name, &tags);
        if new_name == user.name {
            return Ok(());
        }

        let mut state = server.user_state(user.session)?;
        state.name = new_name;
        info!(
            "setting tags {:?} on user {} on server {}",
            tags,
            user.name,
            server.id()
        );
        server.set_user_state(state)?;
        Ok(())
    }
}
