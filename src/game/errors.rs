use thiserror::Error;

use crate::validation::NicknameError;

/// Errors that can arise while loading the world or touching player persistence.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Level file could not be parsed.
    #[error("level file {path}: {source}")]
    LevelFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Wrapper around IO errors (directory walking, store creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when creating a player whose nickname is already taken.
    #[error("player already exists: {0}")]
    AlreadyExists(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// No level carries the `default` tag; new players would spawn nowhere.
    #[error("no default level defined")]
    NoDefaultRoom,

    /// More than one level carries the `default` tag.
    #[error("multiple default levels defined: {first} and {second}")]
    MultipleDefaultRooms { first: String, second: String },

    #[error("invalid nickname: {0}")]
    InvalidNickname(#[from] NicknameError),
}
