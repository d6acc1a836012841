//! Free-port selection in the IANA dynamic range.

use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Result, RuntimeError};

/// IANA dynamic/private port range probed by [`free_port`].
pub const DYNAMIC_PORTS: RangeInclusive<u16> = 49152..=65535;

/// Candidate ports probed before giving up with `PortsExhausted`.
pub const MAX_PROBES: u32 = 128;

const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Returns `true` when a listener on `host:port` accepts a connection.
pub async fn listener_accepts(host: &str, port: u16) -> bool {
	matches!(timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await, Ok(Ok(_)))
}

/// Picks a port in [`DYNAMIC_PORTS`] with no live listener on `host`.
///
/// The draw happens on every call; callers must not cache the result across
/// opens, since another process can claim the port at any time.
pub async fn free_port(host: &str) -> Result<u16> {
	pick_port(|port| listener_accepts(host, port)).await
}

async fn pick_port<F, Fut>(taken: F) -> Result<u16>
where
	F: Fn(u16) -> Fut,
	Fut: Future<Output = bool>,
{
	for attempt in 1..=MAX_PROBES {
		let candidate = rand::thread_rng().gen_range(DYNAMIC_PORTS);
		if !taken(candidate).await {
			debug!(target = "vlcrc.port", port = candidate, attempt, "selected free port");
			return Ok(candidate);
		}
	}

	Err(RuntimeError::PortsExhausted { attempts: MAX_PROBES })
}
