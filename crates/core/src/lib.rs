//! Remote control for a media player over its line-oriented TCP interface.
//!
//! [`PlayerSession`] launches the player with its remote-control interface
//! bound to a local port, connects a client socket, and shuttles
//! newline-terminated commands and responses. Response framing is quiescence
//! based: a read is complete once the player stays quiet for one timeout
//! window, since the protocol has no explicit terminator. Response text is
//! captured raw, never interpreted.
//!
//! ```no_run
//! use vlcrc::PlayerSession;
//!
//! # async fn demo() -> vlcrc::Result<()> {
//! let mut session = PlayerSession::new();
//! session.open().await?;
//! session.play("/home/user/clip.mp4").await?;
//! session.pause().await?;
//! session.quit().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod session;

pub use error::{RcError, Result};
pub use session::{DEFAULT_HOST, DEFAULT_PROGRAM, DEFAULT_READ_TIMEOUT, PlayerSession, SessionOptions};
pub use vlc_rc_runtime::{ConnectRetry, free_port};
