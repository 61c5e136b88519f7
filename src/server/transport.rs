//! Line-oriented transport over any async byte stream.
//!
//! Input is newline-delimited; trailing `\r` and `\n` are stripped and invalid UTF-8 is
//! replaced rather than rejected. Output is whatever the session's outbox carries,
//! written by one task per connection. A peer that stops reading for longer than the
//! write timeout counts as a failed write.

use log::{debug, trace};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub struct LineReader<R> {
    inner: BufReader<R>,
    max_len: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_len: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_len: max_len.max(1),
            buf: Vec::new(),
        }
    }

    /// Read the next line. `Ok(None)` means the peer closed the stream.
    ///
    /// A line longer than the configured maximum is an `InvalidData` error; the rest
    /// of it is not consumed.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let limit = self.max_len as u64 + 2;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
            self.buf.pop();
        }
        if self.buf.len() > self.max_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("input line exceeds {} bytes", self.max_len),
            ));
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Spawn the task that drains `rx` into `writer`.
///
/// The task ends when every sender for `rx` is gone, after flushing what was queued
/// and shutting the writer down. A write error, or a chunk that cannot be written
/// within `write_timeout`, ends it early and is reported once through the returned
/// receiver.
pub fn spawn_writer<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<String>,
    write_timeout: Duration,
) -> (JoinHandle<()>, oneshot::Receiver<io::Error>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (failed_tx, failed_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            trace!("writing {} bytes", chunk.len());
            let write = async {
                match writer.write_all(chunk.as_bytes()).await {
                    Ok(()) => writer.flush().await,
                    Err(e) => Err(e),
                }
            };
            let result = match tokio::time::timeout(write_timeout, write).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("peer did not read for {:?}", write_timeout),
                )),
            };
            if let Err(e) = result {
                debug!("session writer failed: {}", e);
                let _ = failed_tx.send(e);
                return;
            }
        }
        let _ = tokio::time::timeout(write_timeout, writer.shutdown()).await;
    });
    (handle, failed_rx)
}
