//! Session-level error taxonomy.

use thiserror::Error;
use vlc_rc_runtime::RuntimeError;

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, RcError>;

/// Failures surfaced by [`PlayerSession`](crate::PlayerSession) operations.
#[derive(Debug, Error)]
pub enum RcError {
	/// `open` was called while a player is already attached.
	#[error("session already open")]
	AlreadyOpen,

	/// A command or `quit` was issued with no player attached.
	#[error("session not open")]
	NotOpen,

	/// The player binary could not be resolved or spawned.
	#[error("failed to launch player")]
	Launch(#[source] RuntimeError),

	/// The control interface never accepted a connection.
	#[error("failed to connect to player control interface")]
	Connect(#[source] RuntimeError),

	/// No free control port could be found.
	#[error("failed to allocate a control port")]
	Port(#[source] RuntimeError),

	/// A read or write on the control connection failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
