//! Spawning a player with its remote-control interface and connecting to it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::{debug, trace};

use crate::error::{Result, RuntimeError};

/// Launch description for a player with remote control enabled.
#[derive(Debug, Clone)]
pub struct PlayerCommand {
	/// Player binary: absolute path, launch-dir-relative name, or bare name on `PATH`.
	pub program: PathBuf,
	/// Working directory the player is spawned in.
	pub launch_dir: Option<PathBuf>,
	/// Host the control interface binds to.
	pub host: String,
	/// Port the control interface binds to.
	pub port: u16,
}

impl PlayerCommand {
	/// Arguments enabling the remote-control interface on `host:port`.
	pub fn control_args(&self) -> Vec<String> {
		vec!["--extraintf".to_string(), "rc".to_string(), "--rc-host".to_string(), self.control_addr()]
	}

	/// Address string of the control interface.
	pub fn control_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// Retry policy for connecting to a freshly spawned control interface.
#[derive(Debug, Clone, Copy)]
pub struct ConnectRetry {
	/// Maximum connect attempts before failing.
	pub attempts: u32,
	/// Delay before each attempt.
	pub delay: Duration,
}

impl Default for ConnectRetry {
	fn default() -> Self {
		Self {
			attempts: 25,
			delay: Duration::from_millis(200),
		}
	}
}

/// Resolves the player program to a spawnable path.
///
/// Absolute paths are taken as-is. Otherwise a candidate inside `launch_dir`
/// wins over a `PATH` lookup.
pub fn resolve_program(program: &Path, launch_dir: Option<&Path>) -> Result<PathBuf> {
	if program.is_absolute() {
		if program.exists() {
			return Ok(program.to_path_buf());
		}
		return Err(RuntimeError::ProgramNotFound { program: program.to_path_buf() });
	}

	if let Some(dir) = launch_dir {
		let candidate = dir.join(program);
		if candidate.exists() {
			return Ok(candidate);
		}
	}

	which::which(program).map_err(|_| RuntimeError::ProgramNotFound { program: program.to_path_buf() })
}

/// Spawns the player with null stdio and the control interface enabled.
///
/// The child is killed on drop so an unwinding caller cannot strand a live
/// player nobody holds a control connection to.
pub fn spawn_player(command: &PlayerCommand) -> Result<Child> {
	let program = resolve_program(&command.program, command.launch_dir.as_deref())?;

	let mut cmd = Command::new(&program);
	cmd.args(command.control_args())
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.kill_on_drop(true);

	if let Some(dir) = &command.launch_dir {
		cmd.current_dir(dir);
	}

	debug!(target = "vlcrc.launch", program = %program.display(), addr = %command.control_addr(), "spawning player");

	cmd.spawn().map_err(|source| RuntimeError::Spawn { program, source })
}

/// Connects to the control interface of a freshly spawned player.
///
/// Sleeps `retry.delay` before each attempt to give the listener time to come
/// up, and polls the child between attempts so a player that died on startup
/// fails fast with its exit status instead of burning the whole retry window.
pub async fn connect_control(host: &str, port: u16, child: &mut Child, retry: ConnectRetry) -> Result<TcpStream> {
	let addr = format!("{host}:{port}");
	let mut last_error = std::io::Error::new(std::io::ErrorKind::NotConnected, "no connect attempt made");

	for attempt in 1..=retry.attempts {
		tokio::time::sleep(retry.delay).await;

		if let Ok(Some(status)) = child.try_wait() {
			return Err(RuntimeError::EarlyExit { status });
		}

		match TcpStream::connect((host, port)).await {
			Ok(stream) => {
				debug!(target = "vlcrc.launch", %addr, attempt, "control interface connected");
				return Ok(stream);
			}
			Err(e) => {
				trace!(target = "vlcrc.launch", %addr, attempt, error = %e, "control interface not ready");
				last_error = e;
			}
		}
	}

	Err(RuntimeError::Connect {
		addr,
		attempts: retry.attempts,
		source: last_error,
	})
}
