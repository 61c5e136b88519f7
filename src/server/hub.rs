//! Broadcast hub for chat lines.
//!
//! One task owns the map from session id to that session's [`Outbox`]. Register,
//! unregister and publish requests all arrive on a single channel and are handled
//! one at a time, so the map never needs a lock. Publishing only tries to enqueue into
//! each bounded outbox: a full one loses that message, a closed one is removed, and
//! neither stalls the hub.
//!
//! The sender of a chat line is registered like everyone else and receives its own
//! message back.

use log::{debug, trace};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::commands::Broadcast;
use crate::game::output::{Outbox, Undelivered, LINE_END};
use crate::metrics;

pub type SessionId = Uuid;

pub enum HubCommand {
    Register { id: SessionId, outbox: Outbox },
    Unregister { id: SessionId, done: oneshot::Sender<()> },
    Publish(String),
    Snapshot(oneshot::Sender<HubStats>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    pub registered: usize,
    pub published_total: u64,
    pub delivered_total: u64,
    pub dropped_total: u64,
}

#[derive(Clone, Debug)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn register(&self, id: SessionId, outbox: Outbox) {
        let _ = self.tx.send(HubCommand::Register { id, outbox });
    }

    /// Remove a session; resolves once the hub has dropped its outbox.
    pub async fn unregister(&self, id: SessionId) {
        let (done, rx) = oneshot::channel();
        if self.tx.send(HubCommand::Unregister { id, done }).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn publish(&self, message: impl Into<String>) {
        let _ = self.tx.send(HubCommand::Publish(message.into()));
    }

    pub async fn snapshot(&self) -> Option<HubStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(HubCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(HubCommand::Shutdown(tx));
        let _ = rx.await;
    }
}

impl Broadcast for HubHandle {
    fn publish(&self, message: String) {
        HubHandle::publish(self, message);
    }
}

/// Spawn the hub task and return a handle to it.
pub fn start_hub() -> HubHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<HubCommand>();
    let handle = HubHandle { tx };

    tokio::spawn(async move {
        let mut sessions: HashMap<SessionId, Outbox> = HashMap::new();
        let mut stats = HubStats::default();
        while let Some(cmd) = rx.recv().await {
            match cmd {
                HubCommand::Register { id, outbox } => {
                    sessions.insert(id, outbox);
                    debug!("hub: registered {} ({} live)", id, sessions.len());
                }
                HubCommand::Unregister { id, done } => {
                    if sessions.remove(&id).is_some() {
                        debug!("hub: unregistered {} ({} live)", id, sessions.len());
                    }
                    let _ = done.send(());
                }
                HubCommand::Publish(message) => {
                    stats.published_total += 1;
                    metrics::inc_broadcasts();
                    let framed = format!("{message}{LINE_END}");
                    let mut delivered = 0u64;
                    sessions.retain(|id, outbox| match outbox.try_write(framed.clone()) {
                        Ok(()) => {
                            delivered += 1;
                            true
                        }
                        Err(Undelivered::Full) => {
                            trace!("hub: outbox {} is full, message dropped", id);
                            stats.dropped_total += 1;
                            metrics::inc_dropped_deliveries();
                            true
                        }
                        Err(Undelivered::Closed) => {
                            trace!("hub: dropping closed outbox {}", id);
                            stats.dropped_total += 1;
                            metrics::inc_dropped_deliveries();
                            false
                        }
                    });
                    stats.delivered_total += delivered;
                    metrics::add_deliveries(delivered);
                }
                HubCommand::Snapshot(resp) => {
                    let _ = resp.send(HubStats {
                        registered: sessions.len(),
                        ..stats.clone()
                    });
                }
                HubCommand::Shutdown(done) => {
                    let _ = done.send(());
                    break;
                }
            }
        }
        debug!("hub stopped");
    });

    handle
}
