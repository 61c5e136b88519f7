//! Test utilities & fixtures.
//! A small two-room world and an in-memory client that talks to a server over
//! `tokio::io::duplex`.
#![allow(dead_code)] // each test binary uses a different subset

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use berlinmud::config::Config;
use berlinmud::game::dependency::Dependency;
use berlinmud::game::{Action, Direction, GameStore, Level, World};
use berlinmud::server::MudServer;
use tempfile::TempDir;
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn levels_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("levels")
}

/// Room `a` (default) with a locked exit north to `b`; `unlock` opens it.
pub fn two_room_world() -> World {
    World::from_levels(vec![
        Level::new("a", "RoomA")
            .as_default()
            .with_intro("RoomAIntro")
            .with_direction(Direction::new("north", "b").with_dependency(Dependency::action(
                "a:unlock",
                "",
                "The way north is blocked.",
            )))
            .with_action(Action::new("unlock", "Unlocked.")),
        Level::new("b", "RoomB")
            .with_intro("RoomBIntro")
            .with_direction(Direction::new("south", "a")),
    ])
    .expect("world")
}

pub fn test_server(world: World) -> (TempDir, Arc<MudServer>) {
    let dir = TempDir::new().expect("tempdir");
    let store = GameStore::open(dir.path().join("players")).expect("store");
    let mut config = Config::default();
    config.server.motd = "Test MOTD".to_string();
    config.logging.file = None;
    (dir, Arc::new(MudServer::new(config, world, store)))
}

pub struct TestClient {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    pending: Vec<u8>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestClient {
    pub fn connect(server: &Arc<MudServer>) -> Self {
        let (client, remote) = duplex(64 * 1024);
        let (remote_read, remote_write) = split(remote);
        let server = server.clone();
        let task =
            tokio::spawn(async move { server.handle_connection(remote_read, remote_write).await });
        let (reader, writer) = split(client);
        Self {
            reader,
            writer,
            pending: Vec::new(),
            task,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .expect("send");
    }

    /// Read until `needle` shows up; returns everything up to and including it.
    pub async fn expect(&mut self, needle: &str) -> String {
        let needle_bytes = needle.as_bytes();
        loop {
            if let Some(pos) = self
                .pending
                .windows(needle_bytes.len())
                .position(|w| w == needle_bytes)
            {
                let end = pos + needle_bytes.len();
                let taken: Vec<u8> = self.pending.drain(..end).collect();
                return String::from_utf8_lossy(&taken).into_owned();
            }
            let mut chunk = [0u8; 4096];
            let n = tokio::time::timeout(TIMEOUT, self.reader.read(&mut chunk))
                .await
                .unwrap_or_else(|_| {
                    panic!(
                        "timed out waiting for {needle:?}; have {:?}",
                        String::from_utf8_lossy(&self.pending)
                    )
                })
                .expect("read");
            assert!(
                n > 0,
                "connection closed before {needle:?}; have {:?}",
                String::from_utf8_lossy(&self.pending)
            );
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    /// Log in as a new player and wait for the starting room's intro.
    pub async fn create(&mut self, nickname: &str, display: &str, intro: &str) {
        self.expect("What is your nick? ").await;
        self.send(nickname).await;
        self.expect("(y/n) ").await;
        self.send("y").await;
        self.expect("Display name").await;
        self.send(display).await;
        self.expect(&format!(" > {intro}\n\r")).await;
    }

    /// Log in as an existing player and wait for `intro`.
    pub async fn login(&mut self, nickname: &str, intro: &str) {
        self.expect("What is your nick? ").await;
        self.send(nickname).await;
        self.expect(&format!(" > {intro}\n\r")).await;
    }

    /// Everything left until the server closes the connection.
    pub async fn read_to_close(&mut self) -> String {
        let mut rest = Vec::new();
        tokio::time::timeout(TIMEOUT, self.reader.read_to_end(&mut rest))
            .await
            .expect("timed out waiting for close")
            .expect("read");
        let mut all = std::mem::take(&mut self.pending);
        all.extend_from_slice(&rest);
        String::from_utf8_lossy(&all).into_owned()
    }

    /// Hang up from the client side.
    pub async fn hang_up(&mut self) {
        let _ = self.writer.shutdown().await;
    }

    /// Wait for the server side of this connection to finish.
    pub async fn finish(self) -> anyhow::Result<()> {
        tokio::time::timeout(TIMEOUT, self.task)
            .await
            .expect("server task did not finish")
            .expect("server task panicked")
    }
}
