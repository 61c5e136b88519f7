use std::path::Path;

use log::{debug, warn};
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::player::{Player, PLAYER_SCHEMA_VERSION};
use crate::validation::validate_nickname;

const TREE_PLAYERS: &str = "players";

/// Sled-backed persistence for player records.
///
/// Cloning is cheap and every clone shares the same database, so one store can be
/// handed to every session.
#[derive(Clone)]
pub struct GameStore {
    _db: sled::Db,
    players: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        Ok(Self { _db: db, players })
    }

    fn players_key(nickname: &str) -> Vec<u8> {
        format!("players:{}", nickname.to_ascii_lowercase()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a player record.
    pub fn put_player(&self, player: &Player) -> Result<(), GameError> {
        let key = Self::players_key(&player.nickname);
        let bytes = Self::serialize(player)?;
        self.players.insert(key, bytes)?;
        self.players.flush()?;
        Ok(())
    }

    /// Fetch a player record by nickname.
    pub fn get_player(&self, nickname: &str) -> Result<Player, GameError> {
        let key = Self::players_key(nickname);
        let Some(bytes) = self.players.get(&key)? else {
            return Err(GameError::NotFound(format!("player: {}", nickname)));
        };
        let record: Player = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn player_exists(&self, nickname: &str) -> bool {
        self.players
            .contains_key(Self::players_key(nickname))
            .unwrap_or(false)
    }

    /// Load a player, treating any failure as "not available". Errors other than a
    /// missing record are logged.
    pub fn load_player(&self, nickname: &str) -> Option<Player> {
        match self.get_player(nickname) {
            Ok(player) => {
                debug!("loaded player {}", player.nickname);
                Some(player)
            }
            Err(GameError::NotFound(_)) => None,
            Err(e) => {
                warn!("player {} could not be loaded: {}", nickname, e);
                None
            }
        }
    }

    /// Persist a player. Failures are logged and reported as `false`; callers keep going.
    pub fn save_player(&self, player: &Player) -> bool {
        match self.put_player(player) {
            Ok(()) => true,
            Err(e) => {
                warn!("player {} could not be saved: {}", player.nickname, e);
                false
            }
        }
    }

    /// Create and persist a new player positioned at `position`.
    pub fn create_player(
        &self,
        nickname: &str,
        display_name: &str,
        position: &str,
    ) -> Result<Player, GameError> {
        validate_nickname(nickname)?;
        if self.player_exists(nickname) {
            return Err(GameError::AlreadyExists(nickname.to_string()));
        }
        let display_name = if display_name.trim().is_empty() {
            nickname
        } else {
            display_name.trim()
        };
        let player = Player::new(nickname, display_name, position);
        self.put_player(&player)?;
        Ok(player)
    }

    /// List all stored nicknames (lowercased).
    pub fn list_player_ids(&self) -> Result<Vec<String>, GameError> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(nickname) = text.strip_prefix("players:") {
                ids.push(nickname.to_string());
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_player_reads_back_case_insensitively() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let mut player = Player::new("alice", "Alice", "hall");
        player.log_action("hall");
        player.update_attribute("gold", 42);
        store.put_player(&player).expect("put");

        let fetched = store.get_player("ALICE").expect("get");
        assert_eq!(fetched, player);
        assert_eq!(fetched.schema_version, PLAYER_SCHEMA_VERSION);
    }

    #[test]
    fn missing_player_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        assert!(matches!(store.get_player("ghost"), Err(GameError::NotFound(_))));
        assert!(store.load_player("ghost").is_none());
        assert!(!store.player_exists("ghost"));
    }

    #[test]
    fn create_player_validates_and_rejects_duplicates() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");

        let bob = store.create_player("bob", "", "hall").expect("create");
        assert_eq!(bob.display_name, "bob");
        assert_eq!(bob.position, "hall");
        assert!(store.player_exists("bob"));

        assert!(matches!(
            store.create_player("bob", "Bobby", "hall"),
            Err(GameError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create_player("../etc", "x", "hall"),
            Err(GameError::InvalidNickname(_))
        ));
        assert_eq!(store.list_player_ids().expect("ids"), vec!["bob".to_string()]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = GameStore::open(dir.path()).expect("store");
            store.create_player("carol", "Carol", "hall").expect("create");
        }
        let store = GameStore::open(dir.path()).expect("reopen");
        assert_eq!(store.get_player("carol").expect("get").display_name, "Carol");
    }
}
