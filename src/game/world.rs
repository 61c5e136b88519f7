//! The room graph: every loaded level keyed by its stable key.

use log::{debug, warn};
use std::collections::HashMap;

use crate::game::errors::GameError;
use crate::game::level::Level;

/// Immutable set of levels with exactly one default (entry) level.
///
/// Built once at startup and then shared behind an `Arc`; there is no mutation API,
/// so readers need no locking.
#[derive(Debug)]
pub struct World {
    levels: HashMap<String, Level>,
    default_key: String,
}

/// A direction whose target key does not resolve to a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingExit {
    pub from: String,
    pub direction: String,
    pub target: String,
}

impl World {
    /// Build the graph. Fails when no level, or more than one, carries the default tag.
    pub fn from_levels(levels: impl IntoIterator<Item = Level>) -> Result<Self, GameError> {
        let mut map = HashMap::new();
        let mut default_key: Option<String> = None;
        for level in levels {
            if level.is_default() {
                if let Some(first) = &default_key {
                    if *first != level.key {
                        return Err(GameError::MultipleDefaultRooms {
                            first: first.clone(),
                            second: level.key.clone(),
                        });
                    }
                }
                debug!("default level loaded: {}", level.key);
                default_key = Some(level.key.clone());
            }
            if let Some(previous) = map.insert(level.key.clone(), level) {
                warn!("level {} defined twice; keeping the later definition", previous.key);
            }
        }
        let default_key = default_key.ok_or(GameError::NoDefaultRoom)?;
        Ok(Self {
            levels: map,
            default_key,
        })
    }

    pub fn get_room(&self, key: &str) -> Option<&Level> {
        self.levels.get(key)
    }

    pub fn default_room(&self) -> &Level {
        // from_levels guarantees the key is present
        &self.levels[&self.default_key]
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    /// Directions pointing at keys that are not loaded. These are legal and only fail
    /// when traversed; the list exists for diagnostics.
    pub fn dangling_exits(&self) -> Vec<DanglingExit> {
        let mut dangling: Vec<DanglingExit> = self
            .levels
            .values()
            .flat_map(|level| {
                level
                    .directions
                    .iter()
                    .filter(|d| !self.levels.contains_key(&d.target))
                    .map(|d| DanglingExit {
                        from: level.key.clone(),
                        direction: d.name.clone(),
                        target: d.target.clone(),
                    })
            })
            .collect();
        dangling.sort_by(|a, b| a.from.cmp(&b.from).then(a.direction.cmp(&b.direction)));
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::Direction;

    #[test]
    fn requires_a_default_level() {
        let err = World::from_levels(vec![Level::new("a", "A")]).unwrap_err();
        assert!(matches!(err, GameError::NoDefaultRoom));

        let err = World::from_levels(Vec::new()).unwrap_err();
        assert!(matches!(err, GameError::NoDefaultRoom));
    }

    #[test]
    fn rejects_two_default_levels() {
        let err = World::from_levels(vec![
            Level::new("a", "A").as_default(),
            Level::new("b", "B").as_default(),
        ])
        .unwrap_err();
        assert!(matches!(err, GameError::MultipleDefaultRooms { .. }));
    }

    #[test]
    fn lookup_and_dangling_edges() {
        let world = World::from_levels(vec![
            Level::new("a", "A")
                .as_default()
                .with_direction(Direction::new("north", "b"))
                .with_direction(Direction::new("down", "nowhere")),
            Level::new("b", "B"),
        ])
        .expect("world");
        assert_eq!(world.len(), 2);
        assert_eq!(world.default_key(), "a");
        assert_eq!(world.default_room().name, "A");
        assert!(world.get_room("b").is_some());
        assert!(world.get_room("nowhere").is_none());

        let dangling = world.dangling_exits();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, "nowhere");
    }
}
