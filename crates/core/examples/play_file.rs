//! Launches a player, plays a file, pauses it, and prints the control
//! traffic along the way.
//!
//! Usage: cargo run -p vlc-rc --example play_file -- /path/to/media.mp4

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vlcrc::PlayerSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let path = std::env::args().nth(1).ok_or_else(|| anyhow::anyhow!("usage: play_file <media-path>"))?;

	let mut session = PlayerSession::new();
	session.open().await?;

	for line in session.play(&path).await? {
		println!("{line}");
	}
	if let Some(name) = session.now_playing() {
		println!("now playing: {name}");
	}

	tokio::time::sleep(Duration::from_secs(5)).await;

	for line in session.pause().await? {
		println!("{line}");
	}

	let status = session.quit().await?;
	println!("player exited: {status}");
	Ok(())
}
