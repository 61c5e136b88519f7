//! # TCP server
//!
//! [`MudServer`] owns the shared pieces (world, player store, broadcast hub) and
//! runs one task per connection:
//!
//! 1. spawn the connection's writer task ([`transport::spawn_writer`])
//! 2. greet, then ask for a nickname until a player is loaded or created
//! 3. hand the player to a [`session::Session`] until quit or disconnect
//!
//! Connections are independent; a failing connection only ends its own task.

pub mod hub;
pub mod session;
pub mod transport;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::config::Config;
use crate::game::commands::Dispatcher;
use crate::game::errors::GameError;
use crate::game::output::{Outbox, LINE_END};
use crate::game::player::Player;
use crate::game::storage::GameStore;
use crate::game::world::World;
use crate::logutil::escape_log;
use crate::validation::validate_nickname;

use hub::{start_hub, HubHandle};
use session::Session;
use transport::{spawn_writer, LineReader};

/// Nicknames with a live session.
#[derive(Clone, Default)]
pub struct ActivePlayers {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActivePlayers {
    /// Mark `nickname` as playing. Returns `None` if it already is.
    ///
    /// Keys fold ASCII case only, so callers pass nicknames that already passed
    /// [`validate_nickname`].
    pub fn claim(&self, nickname: &str) -> Option<PlayerClaim> {
        let key = nickname.to_ascii_lowercase();
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(key.clone()) {
            return None;
        }
        Some(PlayerClaim {
            owner: self.inner.clone(),
            key,
        })
    }

    pub fn is_active(&self, nickname: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&nickname.to_ascii_lowercase())
    }
}

/// Released when dropped.
pub struct PlayerClaim {
    owner: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for PlayerClaim {
    fn drop(&mut self) {
        self.owner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

pub struct MudServer {
    config: Config,
    world: Arc<World>,
    store: GameStore,
    hub: HubHandle,
    active: ActivePlayers,
}

impl MudServer {
    /// Assemble a server around an already loaded world. Starts the hub, so this must
    /// run inside a tokio runtime.
    pub fn new(config: Config, world: World, store: GameStore) -> Self {
        Self {
            config,
            world: Arc::new(world),
            store,
            hub: start_hub(),
            active: ActivePlayers::default(),
        }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.world.clone(), self.store.clone(), Arc::new(self.hub.clone()))
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let bind = self.config.server.bind.clone();
        let listener = TcpListener::bind(&bind)
            .await
            .with_context(|| format!("failed to bind {}", bind))?;
        info!("{} listening on {}", self.config.server.name, bind);
        self.serve(listener).await
    }

    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await.context("accept failed")?;
            info!("connection from {}", peer);
            let server = self.clone();
            tokio::spawn(async move {
                let (reader, writer) = stream.into_split();
                if let Err(e) = server.handle_connection(reader, writer).await {
                    error!("connection {} failed: {:#}", peer, e);
                }
                info!("connection from {} closed", peer);
            });
        }
    }

    /// Drive one connection from greeting to teardown.
    pub async fn handle_connection<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbox, rx) = Outbox::with_capacity(self.config.game.outbox_capacity);
        let (writer_task, write_failed) = spawn_writer(writer, rx, self.config.game.write_timeout());
        let mut lines = LineReader::new(reader, self.config.game.max_line_length);

        outbox.write_line(&format!("Welcome to {}!", self.config.server.name));
        if !self.config.server.motd.is_empty() {
            outbox.write_line(&self.config.server.motd);
        }

        let (player, _claim) = match self.login(&mut lines, &outbox).await {
            Ok(Some(found)) => found,
            other => {
                drop(outbox);
                let _ = writer_task.await;
                return other.map(|_| ());
            }
        };
        outbox.write(format!("Welcome, {}!\n{LINE_END}", player.display_name));

        let mut session = Session::start(
            Uuid::new_v4(),
            player,
            self.dispatcher(),
            self.hub.clone(),
            outbox,
            writer_task,
            write_failed,
        )
        .await;
        session.run(&mut lines).await;
        Ok(())
    }

    /// Prompt until a player is loaded or created. `Ok(None)` when the peer leaves first.
    async fn login<R: AsyncRead + Unpin>(
        &self,
        lines: &mut LineReader<R>,
        out: &Outbox,
    ) -> Result<Option<(Player, Option<PlayerClaim>)>> {
        loop {
            out.write("What is your nick? ");
            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };
            let nickname = line.trim();
            if let Err(e) = validate_nickname(nickname) {
                debug!("rejected nickname {}: {}", escape_log(nickname), e);
                out.write_line(&format!("Invalid nickname: {}", e));
                continue;
            }

            let claim = if self.config.game.single_session {
                match self.active.claim(nickname) {
                    Some(claim) => Some(claim),
                    None => {
                        info!("refused second session for {}", nickname);
                        out.write_line(&format!("{} is already playing.", nickname));
                        continue;
                    }
                }
            } else {
                None
            };

            if let Some(player) = self.store.load_player(nickname) {
                info!("{} logged in", player.nickname);
                return Ok(Some((player, claim)));
            }

            out.write(format!(
                "Player {} does not exist. Create it? (y/n) ",
                nickname
            ));
            let Some(answer) = lines.next_line().await? else {
                return Ok(None);
            };
            if !answer.trim().to_ascii_lowercase().starts_with('y') {
                continue;
            }
            out.write("Display name (blank to use your nick): ");
            let Some(display) = lines.next_line().await? else {
                return Ok(None);
            };
            match self
                .store
                .create_player(nickname, display.trim(), self.world.default_key())
            {
                Ok(player) => {
                    info!("created player {}", player.nickname);
                    return Ok(Some((player, claim)));
                }
                Err(GameError::AlreadyExists(_)) => {
                    warn!("{} was created concurrently; asking again", nickname);
                    continue;
                }
                Err(e) => {
                    out.write_line("Could not create the player, try again later.");
                    return Err(e).context("creating player");
                }
            }
        }
    }
}
