//! Player session lifecycle and command dispatch.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::Child;
use tracing::{debug, info, warn};
use vlc_rc_runtime::{ConnectRetry, ControlStream, PlayerCommand, connect_control, free_port, spawn_player, terminate_and_reap};

use crate::error::{RcError, Result};

/// Default player binary, resolved via the launch dir or `PATH`.
pub const DEFAULT_PROGRAM: &str = "vlc";

/// Default host the control interface binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default quiet window after which a response is considered complete.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`PlayerSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
	/// Player binary: absolute path, launch-dir-relative name, or bare name on `PATH`.
	pub program: PathBuf,
	/// Directory the player is spawned in; also searched when resolving `program`.
	pub launch_dir: Option<PathBuf>,
	/// Host the control interface binds to.
	pub host: String,
	/// Quiet window bounding each per-line read.
	pub read_timeout: Duration,
	/// Retry policy for the post-spawn control connection.
	pub connect_retry: ConnectRetry,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			program: PathBuf::from(DEFAULT_PROGRAM),
			launch_dir: None,
			host: DEFAULT_HOST.to_string(),
			read_timeout: DEFAULT_READ_TIMEOUT,
			connect_retry: ConnectRetry::default(),
		}
	}
}

impl SessionOptions {
	/// Sets the player binary.
	pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
		self.program = program.into();
		self
	}

	/// Sets the launch directory.
	pub fn with_launch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.launch_dir = Some(dir.into());
		self
	}

	/// Sets the control-interface host.
	pub fn with_host(mut self, host: impl Into<String>) -> Self {
		self.host = host.into();
		self
	}

	/// Sets the per-line read timeout.
	pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout = timeout;
		self
	}

	/// Sets the connect retry policy.
	pub fn with_connect_retry(mut self, retry: ConnectRetry) -> Self {
		self.connect_retry = retry;
		self
	}
}

/// Spawned player plus its live control connection.
///
/// Bundled so the two can only ever be present or absent together.
struct ControlLink {
	child: Child,
	stream: ControlStream<OwnedReadHalf, OwnedWriteHalf>,
}

/// One media player under remote control.
///
/// A session is either closed (no process, no connection) or open (both
/// live); there is no partially-open state. Operations take `&mut self`, so
/// sharing a session across tasks requires external serialization.
pub struct PlayerSession {
	options: SessionOptions,
	link: Option<ControlLink>,
	now_playing: Option<String>,
	history: Vec<String>,
}

impl PlayerSession {
	/// Creates a closed session with default options.
	pub fn new() -> Self {
		Self::with_options(SessionOptions::default())
	}

	/// Creates a closed session with the given options.
	pub fn with_options(options: SessionOptions) -> Self {
		Self {
			options,
			link: None,
			now_playing: None,
			history: Vec::new(),
		}
	}

	/// Returns `true` while a player process and control connection are attached.
	pub fn is_open(&self) -> bool {
		self.link.is_some()
	}

	/// Returns the player's process id while the session is open.
	pub fn pid(&self) -> Option<u32> {
		self.link.as_ref().and_then(|link| link.child.id())
	}

	/// Returns the display name recorded by the last [`play`](Self::play).
	pub fn now_playing(&self) -> Option<&str> {
		self.now_playing.as_deref()
	}

	/// Returns every line ever read from the control connection, oldest first.
	pub fn output_history(&self) -> &[String] {
		&self.history
	}

	/// Launches the player on a freshly allocated control port and connects.
	pub async fn open(&mut self) -> Result<()> {
		if self.is_open() {
			return Err(RcError::AlreadyOpen);
		}

		// Allocated per open: a port that was free at configuration time may
		// long since have been claimed.
		let port = free_port(&self.options.host).await.map_err(RcError::Port)?;
		self.open_on(port).await
	}

	/// Launches the player with its control interface on `port` and connects.
	pub async fn open_on(&mut self, port: u16) -> Result<()> {
		if self.is_open() {
			return Err(RcError::AlreadyOpen);
		}

		let command = PlayerCommand {
			program: self.options.program.clone(),
			launch_dir: self.options.launch_dir.clone(),
			host: self.options.host.clone(),
			port,
		};

		let mut child = spawn_player(&command).map_err(RcError::Launch)?;

		let stream = match connect_control(&self.options.host, port, &mut child, self.options.connect_retry).await {
			Ok(stream) => stream,
			Err(e) => {
				// A spawned but unreachable player must not be left running.
				if let Err(reap) = terminate_and_reap(&mut child).await {
					warn!(target = "vlcrc.session", error = %reap, "failed to reap player after connect failure");
				}
				return Err(RcError::Connect(e));
			}
		};

		let (reader, writer) = stream.into_split();
		self.link = Some(ControlLink {
			child,
			stream: ControlStream::new(reader, writer),
		});

		info!(
			target = "vlcrc.session",
			program = %self.options.program.display(),
			host = %self.options.host,
			port,
			"player session open"
		);
		Ok(())
	}

	/// Terminates the player, reaps it, and closes the control connection.
	///
	/// Returns how the player exited. The output history survives quit so the
	/// full transcript stays inspectable after shutdown.
	pub async fn quit(&mut self) -> Result<ExitStatus> {
		let Some(mut link) = self.link.take() else {
			return Err(RcError::NotOpen);
		};
		self.now_playing = None;

		let status = terminate_and_reap(&mut link.child).await?;

		if let Err(e) = link.stream.shutdown().await {
			debug!(target = "vlcrc.session", error = %e, "control connection already gone");
		}

		info!(target = "vlcrc.session", %status, "player session closed");
		Ok(status)
	}

	/// Sends `command`, discarding any buffered backlog first, and returns
	/// the response lines read until the connection went quiet.
	///
	/// The player's `help` command lists the available vocabulary.
	///
	/// Discarded backlog still lands in the output history; it is only
	/// excluded from this command's returned batch. Use
	/// [`send_command_keeping_backlog`](Self::send_command_keeping_backlog)
	/// to fold the backlog into the response instead.
	pub async fn send_command(&mut self, command: &str) -> Result<Vec<String>> {
		self.dispatch_command(command, true).await
	}

	/// Sends `command` without pre-draining, so lines a previous command left
	/// behind are returned ahead of this command's own response.
	pub async fn send_command_keeping_backlog(&mut self, command: &str) -> Result<Vec<String>> {
		self.dispatch_command(command, false).await
	}

	async fn dispatch_command(&mut self, command: &str, drain_backlog: bool) -> Result<Vec<String>> {
		let per_line = self.options.read_timeout;
		let Some(link) = self.link.as_mut() else {
			return Err(RcError::NotOpen);
		};

		if drain_backlog {
			let stale = drain_into(&mut link.stream, &mut self.history, per_line).await?;
			if !stale.is_empty() {
				warn!(target = "vlcrc.session", lines = stale.len(), "discarded stale backlog before command");
			}
		}

		debug!(target = "vlcrc.session", command, "dispatching");
		link.stream.send_line(command).await?;

		let response = drain_into(&mut link.stream, &mut self.history, per_line).await?;
		debug!(target = "vlcrc.session", command, lines = response.len(), "response drained");
		Ok(response)
	}

	/// Drains whatever the player has written since the last read.
	///
	/// On a closed session this returns an empty batch rather than an error,
	/// so callers can poll without tracking open state.
	pub async fn read_output(&mut self) -> Result<Vec<String>> {
		let per_line = self.options.read_timeout;
		match self.link.as_mut() {
			Some(link) => Ok(drain_into(&mut link.stream, &mut self.history, per_line).await?),
			None => Ok(Vec::new()),
		}
	}

	/// Clears the player queue, enqueues `path`, and records its display name.
	///
	/// Responses are not parsed, so now-playing reflects the request rather
	/// than confirmed playback.
	pub async fn play(&mut self, path: &str) -> Result<Vec<String>> {
		if !self.is_open() {
			return Err(RcError::NotOpen);
		}

		self.now_playing = Some(display_name(path).to_string());
		self.send_command("clear").await?;
		self.send_command(&format!("add {path}")).await
	}

	/// Toggles pause. Playback state is whatever the player reports; none is
	/// tracked locally.
	pub async fn pause(&mut self) -> Result<Vec<String>> {
		self.send_command("pause").await
	}
}

impl Default for PlayerSession {
	fn default() -> Self {
		Self::new()
	}
}

async fn drain_into(
	stream: &mut ControlStream<OwnedReadHalf, OwnedWriteHalf>,
	history: &mut Vec<String>,
	per_line: Duration,
) -> std::io::Result<Vec<String>> {
	let lines = stream.drain(per_line).await?;
	history.extend(lines.iter().cloned());
	Ok(lines)
}

/// Final component of `path` under either separator convention.
///
/// Media paths handed to the player may follow a different platform
/// convention than the host, so both styles are split.
fn display_name(path: &str) -> &str {
	path.rsplit(['/', '\\']).next().unwrap_or(path)
}
