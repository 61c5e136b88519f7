//! Dependency evaluation for gated directions and room actions.
//!
//! A dependency is one typed predicate over player state plus the messages shown when
//! it passes or fails. Lists of dependencies are AND-ed in declaration order and stop
//! at the first failure. Malformed bounds never raise errors: time and date windows
//! that cannot be parsed fail closed, attribute bounds that cannot be parsed are
//! ignored, and unknown kinds fail closed.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::game::player::Player;

/// The predicate half of a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Player's action log contains `key`.
    Action { key: String },
    /// Player's attribute `key` lies within the optional bounds.
    Attribute {
        key: String,
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Local time of day (hour:minute) lies within `[min, max]`.
    Time { min: String, max: String },
    /// Local date lies within `[min 00:00:00, max 23:59:59]`.
    Date { min: String, max: String },
    /// A kind this server does not understand. Always fails.
    Unknown { kind: String },
}

/// A typed precondition with its success and failure messages.
///
/// Level files describe dependencies with a loose `type` string; the conversion from
/// [`DependencySeed`] turns that into a [`Check`] once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DependencySeed", into = "DependencySeed")]
pub struct Dependency {
    pub check: Check,
    pub ok_message: String,
    pub fail_message: String,
}

/// On-disk shape of a dependency inside a level file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySeed {
    #[serde(default)]
    pub key: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub min_value: String,
    #[serde(default)]
    pub max_value: String,
    #[serde(default)]
    pub ok_message: String,
    #[serde(default)]
    pub fail_message: String,
}

fn parse_bound(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

impl From<DependencySeed> for Dependency {
    fn from(seed: DependencySeed) -> Self {
        let check = match seed.kind.as_str() {
            "" | "action" => Check::Action { key: seed.key },
            "attribute" => Check::Attribute {
                key: seed.key,
                min: parse_bound(&seed.min_value),
                max: parse_bound(&seed.max_value),
            },
            "time" => Check::Time {
                min: seed.min_value,
                max: seed.max_value,
            },
            "date" => Check::Date {
                min: seed.min_value,
                max: seed.max_value,
            },
            other => Check::Unknown {
                kind: other.to_string(),
            },
        };
        Dependency {
            check,
            ok_message: seed.ok_message,
            fail_message: seed.fail_message,
        }
    }
}

impl From<Dependency> for DependencySeed {
    fn from(dep: Dependency) -> Self {
        let (kind, key, min_value, max_value) = match dep.check {
            Check::Action { key } => ("action".to_string(), key, String::new(), String::new()),
            Check::Attribute { key, min, max } => (
                "attribute".to_string(),
                key,
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default(),
            ),
            Check::Time { min, max } => ("time".to_string(), String::new(), min, max),
            Check::Date { min, max } => ("date".to_string(), String::new(), min, max),
            Check::Unknown { kind } => (kind, String::new(), String::new(), String::new()),
        };
        DependencySeed {
            key,
            kind,
            min_value,
            max_value,
            ok_message: dep.ok_message,
            fail_message: dep.fail_message,
        }
    }
}

impl Dependency {
    /// Action dependency, the kind used when a level file omits `type`.
    pub fn action(key: &str, ok_message: &str, fail_message: &str) -> Self {
        Self {
            check: Check::Action {
                key: key.to_string(),
            },
            ok_message: ok_message.to_string(),
            fail_message: fail_message.to_string(),
        }
    }

    pub fn with_check(check: Check, ok_message: &str, fail_message: &str) -> Self {
        Self {
            check,
            ok_message: ok_message.to_string(),
            fail_message: fail_message.to_string(),
        }
    }

    /// Whether the predicate holds for `player` at local time `now`.
    pub fn is_met(&self, player: &Player, now: NaiveDateTime) -> bool {
        match &self.check {
            Check::Action { key } => player.has_action(key),
            Check::Attribute { key, min, max } => {
                let value = player.attribute(key);
                min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
            }
            Check::Time { min, max } => time_window_contains(min, max, now.time()),
            Check::Date { min, max } => date_window_contains(min, max, now),
            Check::Unknown { .. } => false,
        }
    }
}

/// Parse `HH:MM` into minutes since midnight. Hours above 23 or minutes above 59 are rejected.
fn parse_hour_minute(raw: &str) -> Option<u32> {
    let (hour, minute) = raw.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

fn time_window_contains(min: &str, max: &str, now: NaiveTime) -> bool {
    let (Some(from), Some(to)) = (parse_hour_minute(min), parse_hour_minute(max)) else {
        return false;
    };
    let current = now.hour() * 60 + now.minute();
    from <= current && current <= to
}

fn date_window_contains(min: &str, max: &str, now: NaiveDateTime) -> bool {
    let from = NaiveDate::parse_from_str(min.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0));
    let to = NaiveDate::parse_from_str(max.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59));
    match (from, to) {
        (Some(from), Some(to)) => from <= now && now <= to,
        _ => false,
    }
}

/// Evaluate `dependencies` against `player` using the local wall clock.
pub fn evaluate(dependencies: &[Dependency], player: &Player, default_message: &str) -> (bool, String) {
    evaluate_at(dependencies, player, default_message, Local::now().naive_local())
}

/// Evaluate `dependencies` as of `now`.
///
/// Returns the first failing dependency's fail message, or on success the last
/// dependency's ok message unless `default_message` is non-empty.
pub fn evaluate_at(
    dependencies: &[Dependency],
    player: &Player,
    default_message: &str,
    now: NaiveDateTime,
) -> (bool, String) {
    let mut last_ok = String::new();
    for dependency in dependencies {
        if !dependency.is_met(player, now) {
            return (false, dependency.fail_message.clone());
        }
        last_ok.clone_from(&dependency.ok_message);
    }
    if !default_message.is_empty() {
        return (true, default_message.to_string());
    }
    (true, last_ok)
}
