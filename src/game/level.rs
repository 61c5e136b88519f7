//! Levels (rooms), their exits and local actions.
//!
//! Levels are loaded once from data files and shared read-only between sessions.

use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use crate::game::dependency::{evaluate, Dependency};
use crate::game::output::{Outbox, LINE_END};
use crate::game::player::Player;

/// Tag marking the level new players spawn in.
pub const DEFAULT_TAG: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Direction {
    pub name: String,
    #[serde(alias = "station")]
    pub target: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Direction {
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            hidden: false,
            dependencies: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Action {
    pub fn new(name: &str, answer: &str) -> Self {
        Self {
            name: name.to_string(),
            answer: answer.to_string(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// One animation frame, held on screen for `duration` milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Text animation played when a player enters a level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asciimation {
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl Asciimation {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Play every frame into `out`, redrawing each frame over the previous one.
    ///
    /// The height of the first non-empty frame fixes the redraw height; longer frames
    /// are cut to it. Sleeps between frames, which only stalls the calling session.
    pub async fn play(&self, out: &Outbox) {
        let mut height = 0usize;
        let last = self.frames.len().saturating_sub(1);
        for (index, frame) in self.frames.iter().enumerate() {
            if height == 0 {
                height = frame.lines.len();
            }
            for (row, line) in frame.lines.iter().take(height).enumerate() {
                if index > 0 && row == 0 {
                    out.write(format!("\x1b[{height}F\x1b[K{line}{LINE_END}"));
                } else {
                    out.write(format!("\x1b[K{line}{LINE_END}"));
                }
            }
            if index < last {
                tokio::time::sleep(StdDuration::from_millis(frame.duration)).await;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Level {
    pub key: String,
    #[serde(default)]
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub directions: Vec<Direction>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub asciimation: Asciimation,
}

impl Level {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            tag: String::new(),
            name: name.to_string(),
            intro: String::new(),
            directions: Vec::new(),
            actions: Vec::new(),
            asciimation: Asciimation::default(),
        }
    }

    pub fn as_default(mut self) -> Self {
        self.tag = DEFAULT_TAG.to_string();
        self
    }

    pub fn with_intro(mut self, intro: &str) -> Self {
        self.intro = intro.to_string();
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.directions.push(direction);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_asciimation(mut self, asciimation: Asciimation) -> Self {
        self.asciimation = asciimation;
        self
    }

    pub fn is_default(&self) -> bool {
        self.tag.eq_ignore_ascii_case(DEFAULT_TAG)
    }

    /// Find a room action by name, ignoring case the same way direction names do.
    pub fn action(&self, command: &str) -> Option<&Action> {
        let wanted = command.trim().to_lowercase();
        self.actions
            .iter()
            .find(|action| action.name.to_lowercase() == wanted)
    }

    /// Action-log token recorded when `action` succeeds here.
    pub fn action_token(&self, action: &Action) -> String {
        format!("{}:{}", self.key, action.name)
    }

    /// Whether `direction` shows up in a look.
    ///
    /// `filter` is the direction named by `look <direction>`; when present only the
    /// name matters. A blanket look shows open exits, and hidden exits only once the
    /// player has visited the target.
    pub fn can_see_direction(&self, direction: &Direction, player: &Player, filter: &str) -> bool {
        if !filter.trim().is_empty() {
            return direction.is_named(filter);
        }
        !direction.hidden || player.has_action(&direction.target)
    }

    pub fn can_go_direction(&self, direction: &Direction, player: &Player) -> (bool, String) {
        evaluate(&direction.dependencies, player, "")
    }

    pub fn can_do_action(&self, action: &Action, player: &Player) -> (bool, String) {
        evaluate(&action.dependencies, player, &action.answer)
    }

    /// Framed "You are at" banner sized to the level name.
    pub fn banner(&self) -> String {
        let rule = "─".repeat(self.name.chars().count());
        format!(
            "┌────────────{rule}─┐{LINE_END}│ You are at {} │{LINE_END}└────────────{rule}─┘{LINE_END}",
            self.name
        )
    }

    /// Fired after a successful move into this level: banner, animation, intro.
    pub async fn on_enter_room(&self, out: &Outbox) {
        out.write(self.banner());
        if !self.asciimation.is_empty() {
            self.asciimation.play(out).await;
        }
        if !self.intro.is_empty() {
            out.write(format!(" > {}{LINE_END}", self.intro));
        }
    }
}
