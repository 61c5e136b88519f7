//! # BerlinMUD - a small multi-user text adventure server
//!
//! Players connect over a plain line-oriented TCP connection (telnet, netcat), pick a
//! nickname and walk a graph of rooms loaded from JSON files. Exits and room actions
//! can be gated on what a player has done before, on attribute values, or on the
//! time of day and date. Everyone connected shares one chat channel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use berlinmud::config::Config;
//! use berlinmud::game::{load_world, GameStore};
//! use berlinmud::server::MudServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let world = load_world(config.storage.levels_path())?;
//!     let store = GameStore::open(config.storage.players_path())?;
//!     Arc::new(MudServer::new(config, world, store)).run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - rule engine: players, levels, dependency checks, commands, persistence
//! - [`server`] - TCP accept loop, login prompt, sessions and the broadcast hub
//! - [`config`] - TOML configuration
//! - [`validation`] - nickname rules
//! - [`logutil`] - single-line escaping for user text in logs
//! - [`metrics`] - process-wide counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   TCP server    │ ← accept loop, login, one task per connection
//! └─────────────────┘
//!          │
//! ┌─────────────────┐     ┌───────────────┐
//! │    Sessions     │ ──→ │ Broadcast hub │ ← single task owning all outboxes
//! └─────────────────┘     └───────────────┘
//!          │
//! ┌─────────────────┐
//! │   Rule engine   │ ← world (read-only), dispatcher, sled player store
//! └─────────────────┘
//! ```

pub mod config;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod server;
pub mod validation;
