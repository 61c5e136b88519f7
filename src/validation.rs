//! Nickname validation.
//!
//! Nicknames double as storage keys, so they are limited to ASCII letters, digits,
//! `_` and `-`.

use std::collections::BTreeSet;

pub const NICKNAME_MAX_LEN: usize = 40;

/// Nickname validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NicknameError {
    #[error("Nickname is empty")]
    Empty,

    #[error("Nickname is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Nickname contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

fn allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// Validate a nickname, returning it unchanged when acceptable.
pub fn validate_nickname(nickname: &str) -> Result<&str, NicknameError> {
    if nickname.is_empty() {
        return Err(NicknameError::Empty);
    }
    if nickname.chars().count() > NICKNAME_MAX_LEN {
        return Err(NicknameError::TooLong {
            max: NICKNAME_MAX_LEN,
        });
    }
    let invalid: BTreeSet<char> = nickname.chars().filter(|c| !allowed(*c)).collect();
    if !invalid.is_empty() {
        return Err(NicknameError::InvalidCharacters {
            chars: invalid.into_iter().collect(),
        });
    }
    Ok(nickname)
}

pub fn is_valid_nickname(nickname: &str) -> bool {
    validate_nickname(nickname).is_ok()
}
