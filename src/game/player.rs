use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;

/// Persistent per-account game state.
///
/// The action log doubles as visit history and unlock-flag storage: room keys are
/// appended on entry and `"<room>:<action>"` tokens on successful room actions.
/// Tokens are stored lowercase so membership checks are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub nickname: String,
    pub display_name: String,
    pub position: String,
    #[serde(default)]
    pub action_log: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl Player {
    pub fn new(nickname: &str, display_name: &str, position: &str) -> Self {
        let now = Utc::now();
        Self {
            nickname: nickname.to_string(),
            display_name: display_name.to_string(),
            position: position.to_string(),
            action_log: Vec::new(),
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Record an action token. Logging a token that is already present is a no-op.
    pub fn log_action(&mut self, token: &str) {
        let token = token.to_lowercase();
        if !self.action_log.contains(&token) {
            self.action_log.push(token);
        }
    }

    pub fn has_action(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.action_log.iter().any(|logged| *logged == token)
    }

    /// Current value of a named attribute, floored at 0; absent attributes read as 0.
    pub fn attribute(&self, name: &str) -> i64 {
        self.attributes
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(0)
            .max(0)
    }

    /// Add `delta` to a named attribute and return the new (floored) value.
    ///
    /// The map keeps the running sum, so a sequence of updates reads as
    /// `max(0, sum of deltas)` regardless of order.
    pub fn update_attribute(&mut self, name: &str, delta: i64) -> i64 {
        let slot = self.attributes.entry(name.to_lowercase()).or_insert(0);
        *slot = slot.saturating_add(delta);
        (*slot).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_updates_accumulate_and_floor_at_zero() {
        let mut player = Player::new("alice", "Alice", "hall");
        player.update_attribute("test", 10);
        assert_eq!(player.attributes.len(), 1);
        assert_eq!(player.attribute("test"), 10);
        assert_eq!(player.attribute("random"), 0);

        player.update_attribute("test", 10);
        assert_eq!(player.attributes.len(), 1);
        assert_eq!(player.attribute("test"), 20);

        assert_eq!(player.update_attribute("test", -30), 0);
        assert_eq!(player.attributes.len(), 1);
        assert_eq!(player.attribute("test"), 0);
        assert_eq!(player.attribute("random"), 0);

        // the deficit carries over until it is paid back
        assert_eq!(player.update_attribute("test", 5), 0);
        assert_eq!(player.update_attribute("test", 6), 1);
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let mut player = Player::new("alice", "Alice", "hall");
        player.update_attribute("Strength", 3);
        player.update_attribute("STRENGTH", 2);
        assert_eq!(player.attribute("strength"), 5);
        assert_eq!(player.attributes.len(), 1);
    }

    #[test]
    fn two_updates_equal_floored_sum() {
        for (d1, d2) in [(5, -2), (-4, 3), (7, -9), (0, 0), (-1, -1), (3, 4)] {
            let mut player = Player::new("p", "P", "hall");
            player.update_attribute("n", d1);
            player.update_attribute("n", d2);
            let expected = (d1 + d2).max(0);
            assert_eq!(player.attribute("n"), expected, "d1={d1} d2={d2}");
        }
    }

    #[test]
    fn action_log_is_idempotent_and_case_insensitive() {
        let mut player = Player::new("alice", "Alice", "hall");
        player.log_action("test");
        assert_eq!(player.action_log.len(), 1);
        assert!(player.has_action("test"));
        assert!(player.has_action("TEST"));
        assert!(!player.has_action("foo"));

        player.log_action("Test");
        assert_eq!(player.action_log.len(), 1);
    }

    #[test]
    fn lookups_do_not_mutate() {
        let player = Player::new("alice", "Alice", "hall");
        assert!(!player.has_action("anything"));
        assert_eq!(player.attribute("anything"), 0);
        assert!(player.action_log.is_empty());
        assert!(player.attributes.is_empty());
    }
}
