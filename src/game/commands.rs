//! Line commands and their dispatch against the world.
//!
//! A line is split on its first whitespace into a command token and a free-text
//! remainder. Built-in commands are matched case-sensitively through a small alias
//! table; anything else is tried as an action of the player's current room.

use log::{debug, warn};
use std::sync::Arc;

use crate::game::level::Level;
use crate::game::output::Outbox;
use crate::game::player::Player;
use crate::game::storage::GameStore;
use crate::game::world::World;
use crate::metrics;

/// Canonical built-in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Look,
    Go,
    Say,
    Quit,
}

/// Synonyms resolve to one handler each.
const ALIASES: &[(&str, Builtin)] = &[
    ("look", Builtin::Look),
    ("watch", Builtin::Look),
    ("go", Builtin::Go),
    ("say", Builtin::Say),
    ("quit", Builtin::Quit),
    ("leave", Builtin::Quit),
    ("exit", Builtin::Quit),
];

pub fn resolve_alias(token: &str) -> Option<Builtin> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, builtin)| *builtin)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MudCommand {
    Look(Option<String>),
    Go(String),
    Say(String),
    Quit,
    /// Not a built-in; may name an action of the current room.
    Other(String),
    Empty,
}

/// Parse one raw input line.
pub fn parse_command(line: &str) -> MudCommand {
    let line = line.trim();
    if line.is_empty() {
        return MudCommand::Empty;
    }
    let (token, rest) = match line.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (line, ""),
    };
    match resolve_alias(token) {
        Some(Builtin::Look) if rest.is_empty() => MudCommand::Look(None),
        Some(Builtin::Look) => MudCommand::Look(Some(rest.to_string())),
        Some(Builtin::Go) => MudCommand::Go(rest.to_string()),
        Some(Builtin::Say) => MudCommand::Say(rest.to_string()),
        Some(Builtin::Quit) => MudCommand::Quit,
        None => MudCommand::Other(token.to_string()),
    }
}

/// What the session should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Fan-out target for chat lines.
pub trait Broadcast: Send + Sync {
    fn publish(&self, message: String);
}

/// Executes parsed commands for one player.
#[derive(Clone)]
pub struct Dispatcher {
    world: Arc<World>,
    store: GameStore,
    chat: Arc<dyn Broadcast>,
}

impl Dispatcher {
    pub fn new(world: Arc<World>, store: GameStore, chat: Arc<dyn Broadcast>) -> Self {
        Self { world, store, chat }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// Handle one input line to completion, persistence included.
    pub async fn handle_line(&self, player: &mut Player, out: &Outbox, line: &str) -> Flow {
        let command = parse_command(line);
        if command != MudCommand::Empty {
            metrics::inc_commands();
        }
        match command {
            MudCommand::Empty => Flow::Continue,
            MudCommand::Look(filter) => {
                self.look(player, out, filter.as_deref().unwrap_or(""));
                Flow::Continue
            }
            MudCommand::Go(direction) => {
                self.go(player, out, &direction).await;
                Flow::Continue
            }
            MudCommand::Say(text) => {
                if !text.is_empty() {
                    self.chat.publish(format!("{}: {}", player.display_name, text));
                }
                Flow::Continue
            }
            MudCommand::Quit => {
                self.persist(player);
                out.write_line(&format!("Good bye {}", player.display_name));
                Flow::Close
            }
            MudCommand::Other(name) => {
                self.room_action(player, out, &name);
                Flow::Continue
            }
        }
    }

    fn current_room(&self, player: &Player) -> Option<&Level> {
        let room = self.world.get_room(&player.position);
        if room.is_none() {
            warn!("player {} is in unknown room {}", player.nickname, player.position);
        }
        room
    }

    fn look(&self, player: &Player, out: &Outbox, filter: &str) {
        let Some(room) = self.current_room(player) else {
            return;
        };
        out.write_line(&format!("You are at {}", room.name));
        for direction in &room.directions {
            let Some(target) = self.world.get_room(&direction.target) else {
                continue;
            };
            if room.can_see_direction(direction, player, filter) {
                out.write_line(&format!("You see {} to the {}", target.name, direction.name));
            }
        }
    }

    async fn go(&self, player: &mut Player, out: &Outbox, wanted: &str) {
        let Some(room) = self.current_room(player) else {
            return;
        };
        for direction in room.directions.iter().filter(|d| d.is_named(wanted)) {
            let Some(target) = self.world.get_room(&direction.target) else {
                debug!(
                    "{}: direction {} leads to missing room {}",
                    room.key, direction.name, direction.target
                );
                continue;
            };
            let (allowed, message) = room.can_go_direction(direction, player);
            if !allowed {
                out.write_line(&format!(" > {}", message));
                continue;
            }
            target.on_enter_room(out).await;
            player.position = target.key.clone();
            player.log_action(&target.key);
            self.persist(player);
            debug!("{} moved {} -> {}", player.nickname, room.key, target.key);
            break;
        }
    }

    fn room_action(&self, player: &mut Player, out: &Outbox, name: &str) {
        let Some(room) = self.current_room(player) else {
            return;
        };
        let Some(action) = room.action(name) else {
            return;
        };
        let (allowed, message) = room.can_do_action(action, player);
        out.write_line(&format!(" > {}", message));
        if allowed {
            let token = room.action_token(action);
            player.log_action(&token);
            self.persist(player);
        }
    }

    /// Save the player. A failed save is logged by the store and play goes on.
    pub fn persist(&self, player: &mut Player) -> bool {
        player.touch();
        self.store.save_player(player)
    }
}
