//! Outbound text for one session.
//!
//! Everything a session shows its player, direct replies and hub broadcasts alike,
//! goes through the session's [`Outbox`]. A single writer task drains the paired
//! receiver into the transport, so output order is the order of enqueueing.
//!
//! The mailbox is bounded. Writers never wait: once a client stops reading and the
//! mailbox fills up, further text for it is dropped until the writer catches up.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Terminal line ending used for all emitted lines.
pub const LINE_END: &str = "\n\r";

/// Queued chunks per session before new text is dropped.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Why a chunk did not reach the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undelivered {
    /// The mailbox is full; the session may still recover.
    Full,
    /// The writer side is gone.
    Closed,
}

#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<String>,
}

impl Outbox {
    /// Create an outbox with the default capacity and the receiver its writer drains.
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue raw text without waiting.
    pub fn try_write(&self, text: impl Into<String>) -> Result<(), Undelivered> {
        self.tx.try_send(text.into()).map_err(|e| match e {
            TrySendError::Full(_) => Undelivered::Full,
            TrySendError::Closed(_) => Undelivered::Closed,
        })
    }

    /// Queue raw text. Returns false if it was dropped.
    pub fn write(&self, text: impl Into<String>) -> bool {
        self.try_write(text).is_ok()
    }

    pub fn write_line(&self, text: &str) -> bool {
        self.write(format!("{text}{LINE_END}"))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_end_with_newline_carriage_return() {
        let (out, mut rx) = Outbox::channel();
        assert!(out.write_line("hello"));
        assert!(out.write("raw"));
        assert_eq!(rx.try_recv().unwrap(), "hello\n\r");
        assert_eq!(rx.try_recv().unwrap(), "raw");
    }

    #[test]
    fn write_fails_after_receiver_dropped() {
        let (out, rx) = Outbox::channel();
        drop(rx);
        assert!(out.is_closed());
        assert!(!out.write_line("lost"));
        assert_eq!(out.try_write("lost"), Err(Undelivered::Closed));
    }

    #[test]
    fn full_mailbox_drops_instead_of_growing() {
        let (out, mut rx) = Outbox::with_capacity(2);
        assert_eq!(out.try_write("1"), Ok(()));
        assert_eq!(out.try_write("2"), Ok(()));
        assert_eq!(out.try_write("3"), Err(Undelivered::Full));

        assert_eq!(rx.try_recv().unwrap(), "1");
        assert!(out.write("4"));
        assert_eq!(rx.try_recv().unwrap(), "2");
        assert_eq!(rx.try_recv().unwrap(), "4");
        assert!(rx.try_recv().is_err());
    }
}
