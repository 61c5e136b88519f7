//! Process-wide counters for sessions, commands and chat fan-out.
use std::sync::atomic::{AtomicU64, Ordering};

static SESSIONS_OPENED: AtomicU64 = AtomicU64::new(0);
static SESSIONS_CLOSED: AtomicU64 = AtomicU64::new(0);
static COMMANDS: AtomicU64 = AtomicU64::new(0);
static BROADCASTS: AtomicU64 = AtomicU64::new(0);
static DELIVERIES: AtomicU64 = AtomicU64::new(0);
static DROPPED_DELIVERIES: AtomicU64 = AtomicU64::new(0);

pub fn inc_sessions_opened() {
    SESSIONS_OPENED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_sessions_closed() {
    SESSIONS_CLOSED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_commands() {
    COMMANDS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_broadcasts() {
    BROADCASTS.fetch_add(1, Ordering::Relaxed);
}
pub fn add_deliveries(n: u64) {
    DELIVERIES.fetch_add(n, Ordering::Relaxed);
}
pub fn inc_dropped_deliveries() {
    DROPPED_DELIVERIES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub commands: u64,
    pub broadcasts: u64,
    pub deliveries: u64,
    pub dropped_deliveries: u64,
}

impl Snapshot {
    /// Sessions opened and not yet closed.
    pub fn sessions_active(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        sessions_opened: SESSIONS_OPENED.load(Ordering::Relaxed),
        sessions_closed: SESSIONS_CLOSED.load(Ordering::Relaxed),
        commands: COMMANDS.load(Ordering::Relaxed),
        broadcasts: BROADCASTS.load(Ordering::Relaxed),
        deliveries: DELIVERIES.load(Ordering::Relaxed),
        dropped_deliveries: DROPPED_DELIVERIES.load(Ordering::Relaxed),
    }
}
