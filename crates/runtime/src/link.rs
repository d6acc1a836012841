//! Newline-delimited control stream over an async read/write pair.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::time::timeout;
use tracing::trace;

/// Line-oriented command/response stream for a player control interface.
///
/// Writes are newline-terminated and flushed immediately. Reads drain until
/// the remote stays quiet for one timeout window, the only end-of-response
/// signal the protocol offers.
pub struct ControlStream<R, W> {
	lines: Lines<BufReader<R>>,
	writer: W,
}

impl<R, W> ControlStream<R, W>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	/// Wraps a read/write pair into a control stream.
	pub fn new(reader: R, writer: W) -> Self {
		Self {
			lines: BufReader::new(reader).lines(),
			writer,
		}
	}

	/// Writes `command` with a newline terminator and flushes.
	pub async fn send_line(&mut self, command: &str) -> std::io::Result<()> {
		trace!(target = "vlcrc.link", command, "sending");
		self.writer.write_all(command.as_bytes()).await?;
		self.writer.write_all(b"\n").await?;
		self.writer.flush().await
	}

	/// Reads lines until the remote stays quiet for `per_line` or closes.
	///
	/// Each line gets a fresh timeout window. `next_line` is cancellation
	/// safe, so a window expiring mid-line leaves the partial line buffered
	/// for the next drain instead of losing it.
	pub async fn drain(&mut self, per_line: Duration) -> std::io::Result<Vec<String>> {
		let mut collected = Vec::new();

		loop {
			match timeout(per_line, self.lines.next_line()).await {
				Err(_) => break,
				Ok(Ok(Some(line))) => {
					trace!(target = "vlcrc.link", line = %line, "received");
					collected.push(line);
				}
				Ok(Ok(None)) => break,
				Ok(Err(e)) => return Err(e),
			}
		}

		Ok(collected)
	}

	/// Shuts down the write side, telling the remote we are done.
	pub async fn shutdown(&mut self) -> std::io::Result<()> {
		self.writer.shutdown().await
	}
}
