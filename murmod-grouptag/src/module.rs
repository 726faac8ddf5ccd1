// SPDX-License-Identifier: MIT OR Apache-2.0

use murmod_core::Runtime;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actor::{GroupTagActor, ToGroupTagActor};
use crate::config::GroupTagConfig;

#[derive(Debug, Error)]
pub enum GroupTagError {
    /// The scheduler actor has terminated and no longer accepts commands.
    #[error("grouptag scheduler has terminated")]
    ActorClosed,
}

/// Handle to a running grouptag module.
///
/// `spawn` starts the scheduler actor on a background task; the module stays
/// passive until [`connect`](GroupTag::connect) arms the timer and registers
/// for runtime callbacks.
#[derive(Debug)]
pub struct GroupTag {
    actor_tx: mpsc::Sender<ToGroupTagActor>,
    task: JoinHandle<()>,
}

impl GroupTag {
    pub fn spawn<R: Runtime>(runtime: R, config: GroupTagConfig) -> Self {
        let (actor_tx, inbox) = mpsc::channel(64);
        let actor = GroupTagActor::new(runtime, config, inbox);
        let task = tokio::task::spawn(actor.run());
        Self { actor_tx, task }
    }

    /// Arms the periodic timer and subscribes to runtime callbacks. The
    /// first evaluation pass runs one full interval later. Connecting twice
    /// is a no-op; the timer is never armed twice.
    pub async fn connect(&self) -> Result<(), GroupTagError> {
        self.request(|reply| ToGroupTagActor::Connect { reply })
            .await
    }

    /// Disarms the timer and drops all per-server bookkeeping. A pass
    /// already in progress completes.
    pub async fn disconnect(&self) -> Result<(), GroupTagError> {
        self.request(|reply| ToGroupTagActor::Disconnect { reply })
            .await
    }

    /// Stops the scheduler actor and waits for it to wind down.
    pub async fn shutdown(self) -> Result<(), GroupTagError> {
        self.request(|reply| ToGroupTagActor::Shutdown { reply })
            .await?;
        self.task.await.map_err(|_| GroupTagError::ActorClosed)
    }

    /// Sends a control message and waits for the actor to acknowledge it.
    async fn request(
        &self,
        msg: impl FnOnce(oneshot::Sender<()>) -> ToGroupTagActor,
    ) -> Result<(), GroupTagError> {
        let (reply, done) = oneshot::channel();
        self.actor_tx
            .send(msg(reply))
            .await
            .map_err(|_| GroupTagError::ActorClosed)?;
        done.await.map_err(|_| GroupTagError::ActorClosed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use murmod_core::test_utils::{MemoryRuntime, setup_logging};
    use murmod_core::{ModuleEvent, ServerScope, User};
    use tokio::time::sleep;

    use crate::config::{GroupTagConfig, RuleSet};

    use super::GroupTag;

    fn runtime_with_admin(server: u64) -> MemoryRuntime {
        let runtime = MemoryRuntime::new();
        runtime.add_server(server);
        runtime.add_user(server, 10, 100, "alice");
        runtime.add_group(server, "admin", &[100]);
        runtime
    }

    fn config(interval: u64) -> GroupTagConfig {
        GroupTagConfig {
            interval,
            ..Default::default()
        }
    }

    fn connected(server: u64, session: u32, account: i64, name: &str) -> ModuleEvent {
        ModuleEvent::UserConnected {
            server,
            user: User {
                session,
                account,
                name: name.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn periodic_pass_applies_tags() {
        setup_logging();
        let runtime = runtime_with_admin(1);
        let module = GroupTag::spawn(runtime.clone(), config(1));
        module.connect().await.unwrap();

        assert_eq!(runtime.subscribed_scope(), Some(ServerScope::All));

        // nothing happens before the first interval elapses
        sleep(Duration::from_millis(300)).await;
        assert!(runtime.committed(1).is_empty());

        sleep(Duration::from_millis(1000)).await;
        assert_eq!(runtime.user_name(1, 10).unwrap(), "alice [ admin ]");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn connecting_user_triggers_off_cycle_pass() {
        let runtime = runtime_with_admin(1);
        // interval far in the future, only the event can cause the rename
        let module = GroupTag::spawn(runtime.clone(), config(3600));
        module.connect().await.unwrap();

        runtime.emit(connected(1, 10, 100, "alice")).await;

        sleep(Duration::from_millis(100)).await;
        assert_eq!(runtime.user_name(1, 10).unwrap(), "alice [ admin ]");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn unchanged_name_is_not_recommitted() {
        let runtime = runtime_with_admin(1);
        let module = GroupTag::spawn(runtime.clone(), config(3600));
        module.connect().await.unwrap();

        runtime.emit(connected(1, 10, 100, "alice")).await;
        sleep(Duration::from_millis(100)).await;
        runtime.emit(connected(1, 10, 100, "alice [ admin ]")).await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(runtime.committed(1).len(), 1);

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn lost_membership_strips_the_tag() {
        let runtime = MemoryRuntime::new();
        runtime.add_server(1);
        // name still carries a suffix from an earlier pass, but the user is
        // in no group anymore
        runtime.add_user(1, 10, 100, "bob [ admin ]");
        runtime.add_group(1, "admin", &[999]);

        let module = GroupTag::spawn(runtime.clone(), config(3600));
        module.connect().await.unwrap();

        runtime.emit(connected(1, 10, 100, "bob [ admin ]")).await;

        sleep(Duration::from_millis(100)).await;
        assert_eq!(runtime.user_name(1, 10).unwrap(), "bob");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn disconnect_disarms_the_timer() {
        let runtime = runtime_with_admin(1);
        let module = GroupTag::spawn(runtime.clone(), config(1));
        module.connect().await.unwrap();
        module.disconnect().await.unwrap();

        sleep(Duration::from_millis(1300)).await;
        assert!(runtime.committed(1).is_empty());

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_pass_leaves_the_timer_armed() {
        let runtime = runtime_with_admin(1);
        runtime.fail_next_acl(1);
        let module = GroupTag::spawn(runtime.clone(), config(1));
        module.connect().await.unwrap();

        // first pass hits the ACL failure and aborts without committing
        sleep(Duration::from_millis(1300)).await;
        assert!(runtime.committed(1).is_empty());

        // the next tick still fires and completes the refresh
        sleep(Duration::from_secs(1)).await;
        assert_eq!(runtime.user_name(1, 10).unwrap(), "alice [ admin ]");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn override_rules_apply_next_to_the_fallback() {
        let runtime = MemoryRuntime::new();
        runtime.add_server(1);
        runtime.add_server(2);
        runtime.add_user(1, 10, 100, "alice");
        runtime.add_user(2, 20, 100, "alice");
        runtime.add_group(1, "admin", &[100]);
        runtime.add_group(2, "staff", &[100]);

        let mut config = config(3600);
        config.server_rules.insert(
            2,
            RuleSet {
                groupmap: vec!["staff:crew".to_string()],
            },
        );

        let module = GroupTag::spawn(runtime.clone(), config);
        module.connect().await.unwrap();

        // the pass covers every booted server, whichever one the user
        // connected to
        runtime.emit(connected(1, 10, 100, "alice")).await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(runtime.user_name(1, 10).unwrap(), "alice [ admin ]");
        assert_eq!(runtime.user_name(2, 20).unwrap(), "alice [ crew ]");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn vanished_configured_server_is_skipped() {
        let runtime = runtime_with_admin(1);
        runtime.add_server(2);
        let module = GroupTag::spawn(
            runtime.clone(),
            GroupTagConfig {
                interval: 3600,
                servers: vec![1, 2],
                ..Default::default()
            },
        );
        module.connect().await.unwrap();

        // server 2 goes down between configuration and the next pass
        runtime.remove_server(2);
        runtime.emit(connected(1, 10, 100, "alice")).await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(runtime.user_name(1, 10).unwrap(), "alice [ admin ]");

        module.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn configured_server_list_scopes_the_subscription() {
        let runtime = runtime_with_admin(5);
        let module = GroupTag::spawn(
            runtime.clone(),
            GroupTagConfig {
                interval: 3600,
                servers: vec![5],
                ..Default::default()
            },
        );
        module.connect().await.unwrap();

        assert_eq!(runtime.subscribed_scope(), Some(ServerScope::Ids(vec![5])));

        module.shutdown().await.unwrap();
    }
}
