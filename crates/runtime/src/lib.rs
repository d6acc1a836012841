//! Process, port, and control-stream plumbing for driving a media player's
//! remote-control interface.
//!
//! This crate owns the OS-facing pieces: allocating a free control port,
//! resolving and spawning the player binary, connecting to its control
//! listener with bounded retry, tearing the process down without leaving
//! zombies, and shuttling newline-delimited lines over the connection.
//! Session semantics live in the `vlc-rc` crate on top.

pub mod error;
pub mod launch;
pub mod link;
pub mod port;
pub mod process;

pub use error::{Result, RuntimeError};
pub use launch::{ConnectRetry, PlayerCommand, connect_control, resolve_program, spawn_player};
pub use link::ControlStream;
pub use port::{DYNAMIC_PORTS, MAX_PROBES, free_port, listener_accepts};
pub use process::{pid_is_alive, terminate_and_reap};
