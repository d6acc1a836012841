//! Error types for port allocation, player launch, and teardown.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures raised while bringing a player and its control socket up.
#[derive(Debug, Error)]
pub enum RuntimeError {
	/// Every probed candidate port had a live listener.
	#[error("no free port found after {attempts} probes in the dynamic range")]
	PortsExhausted { attempts: u32 },

	/// The player binary could not be resolved to a spawnable path.
	#[error("player program not found: {}", .program.display())]
	ProgramNotFound { program: PathBuf },

	/// The OS refused to spawn the player.
	#[error("failed to spawn {}: {source}", .program.display())]
	Spawn {
		program: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The player exited before its control interface came up.
	#[error("player exited before its control interface came up ({status})")]
	EarlyExit { status: std::process::ExitStatus },

	/// The control interface never accepted a connection.
	#[error("control interface at {addr} not reachable after {attempts} attempts: {source}")]
	Connect {
		addr: String,
		attempts: u32,
		#[source]
		source: std::io::Error,
	},
}
