//! One connected player, from registration with the hub to teardown.

use log::{debug, info, warn};
use std::io;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::game::commands::{Dispatcher, Flow};
use crate::game::output::Outbox;
use crate::game::player::Player;
use crate::logutil::escape_log;
use crate::metrics;
use crate::server::hub::{HubHandle, SessionId};
use crate::server::transport::LineReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closed,
}

pub struct Session {
    id: SessionId,
    player: Player,
    state: SessionState,
    dispatcher: Dispatcher,
    hub: HubHandle,
    outbox: Option<Outbox>,
    writer: Option<JoinHandle<()>>,
    write_failed: Option<oneshot::Receiver<io::Error>>,
}

impl Session {
    /// Register with the hub and show the player where they are.
    ///
    /// A player whose stored room no longer exists is moved to the default room first.
    pub async fn start(
        id: SessionId,
        mut player: Player,
        dispatcher: Dispatcher,
        hub: HubHandle,
        outbox: Outbox,
        writer: JoinHandle<()>,
        write_failed: oneshot::Receiver<io::Error>,
    ) -> Self {
        metrics::inc_sessions_opened();
        hub.register(id, outbox.clone());
        info!("session {} started for {}", id, player.nickname);

        let world = dispatcher.world();
        let room = match world.get_room(&player.position) {
            Some(room) => room,
            None => {
                warn!(
                    "{} was in missing room {}; moving to {}",
                    player.nickname,
                    player.position,
                    world.default_key()
                );
                let room = world.default_room();
                player.position = room.key.clone();
                room
            }
        };
        room.on_enter_room(&outbox).await;

        Self {
            id,
            player,
            state: SessionState::Active,
            dispatcher,
            hub,
            outbox: Some(outbox),
            writer: Some(writer),
            write_failed: Some(write_failed),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read and dispatch lines until the player quits or the transport fails, then close.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, lines: &mut LineReader<R>) {
        let mut write_failed = self.write_failed.take();
        while self.state == SessionState::Active {
            let next = match write_failed.as_mut() {
                Some(failed) => tokio::select! {
                    line = lines.next_line() => line,
                    result = failed => {
                        if let Ok(e) = result {
                            warn!("session {}: write failed: {}", self.id, e);
                        }
                        break;
                    }
                },
                None => lines.next_line().await,
            };
            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("session {}: peer closed the connection", self.id);
                    break;
                }
                Err(e) => {
                    warn!("session {}: read failed: {}", self.id, e);
                    break;
                }
            };
            let Some(outbox) = self.outbox.as_ref() else {
                break;
            };
            if !line.trim().is_empty() {
                debug!(
                    "session {} ({}): {}",
                    self.id,
                    self.player.nickname,
                    escape_log(line.trim())
                );
            }
            if self.dispatcher.handle_line(&mut self.player, outbox, &line).await == Flow::Close {
                debug!("session {}: {} quit", self.id, self.player.nickname);
                break;
            }
        }
        self.close().await;
    }

    /// Persist, leave the hub, announce the departure, then release the transport.
    /// Only the first call does anything. Waiting for the writer is bounded by its
    /// write timeout, so a peer that stopped reading cannot hold the close open.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;

        self.dispatcher.persist(&mut self.player);
        self.hub.unregister(self.id).await;
        self.hub
            .publish(format!("User {} left the chat room.", self.player.nickname));

        // the hub dropped its clone on unregister, so this ends the writer
        self.outbox.take();
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                warn!("session {}: writer task ended abnormally: {}", self.id, e);
            }
        }
        metrics::inc_sessions_closed();
        let m = metrics::snapshot();
        info!("session {} closed for {}", self.id, self.player.nickname);
        debug!(
            "sessions active={} commands={} broadcasts={} deliveries={} dropped={}",
            m.sessions_active(),
            m.commands,
            m.broadcasts,
            m.deliveries,
            m.dropped_deliveries
        );
    }
}
