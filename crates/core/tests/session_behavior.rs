#![cfg(unix)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use vlc_rc_runtime::{ConnectRetry, pid_is_alive};
use vlcrc::{PlayerSession, RcError, SessionOptions};

/// Writes a stand-in player that ignores its control args and just stays up.
fn stub_player(dir: &TempDir) -> PathBuf {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.path().join("player");
	std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").expect("stub player should be written");
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("stub player should be executable");
	path
}

struct StubControl {
	port: u16,
	received: Arc<Mutex<Vec<String>>>,
}

/// Serves one control connection: sends `banner` on connect, then echoes
/// every received line back as its acknowledgement while recording it.
async fn start_stub(banner: &[&str]) -> StubControl {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("stub listener should bind");
	let port = listener.local_addr().expect("stub addr should resolve").port();
	let received = Arc::new(Mutex::new(Vec::new()));
	let banner: Vec<String> = banner.iter().map(|line| line.to_string()).collect();

	let sink = Arc::clone(&received);
	tokio::spawn(async move {
		let Ok((stream, _)) = listener.accept().await else {
			return;
		};
		let (reader, mut writer) = stream.into_split();

		for line in &banner {
			let _ = writer.write_all(format!("{line}\n").as_bytes()).await;
		}

		let mut lines = BufReader::new(reader).lines();
		while let Ok(Some(line)) = lines.next_line().await {
			sink.lock().expect("received lines lock").push(line.clone());
			let _ = writer.write_all(format!("{line}\n").as_bytes()).await;
		}
	});

	StubControl { port, received }
}

fn test_session(dir: &TempDir) -> PlayerSession {
	let options = SessionOptions::default()
		.with_program(stub_player(dir))
		.with_launch_dir(dir.path())
		.with_read_timeout(Duration::from_millis(150));
	PlayerSession::with_options(options)
}

#[tokio::test]
async fn play_sends_clear_then_add_and_sets_now_playing() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&[]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	let response = session.play("track.mp3").await?;

	assert_eq!(stub.received.lock().unwrap().as_slice(), ["clear", "add track.mp3"]);
	assert_eq!(session.now_playing(), Some("track.mp3"));
	assert!(response.contains(&"add track.mp3".to_string()));

	session.quit().await?;
	Ok(())
}

#[tokio::test]
async fn quit_reaps_the_player_and_closes_the_session() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&[]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	assert!(session.is_open());
	let pid = session.pid().expect("open session should expose a pid");
	assert!(pid_is_alive(pid));

	let status = session.quit().await?;
	assert!(!session.is_open());
	assert!(session.now_playing().is_none());
	assert!(!pid_is_alive(pid));

	// the sleeper goes down by signal, not by exiting cleanly
	use std::os::unix::process::ExitStatusExt;
	assert!(status.signal().is_some());
	Ok(())
}

#[tokio::test]
async fn open_twice_is_rejected_and_leaves_the_session_usable() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&[]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	let err = session.open().await.unwrap_err();
	assert!(matches!(err, RcError::AlreadyOpen));
	assert!(session.is_open());

	session.pause().await?;
	assert_eq!(stub.received.lock().unwrap().as_slice(), ["pause"]);

	session.quit().await?;
	Ok(())
}

#[tokio::test]
async fn quit_twice_reports_not_open() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&[]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	session.quit().await?;

	let err = session.quit().await.unwrap_err();
	assert!(matches!(err, RcError::NotOpen));
	Ok(())
}

#[tokio::test]
async fn send_command_on_a_closed_session_is_rejected() {
	let mut session = PlayerSession::new();
	let err = session.send_command("pause").await.unwrap_err();
	assert!(matches!(err, RcError::NotOpen));
}

#[tokio::test]
async fn read_output_on_a_closed_session_is_empty() {
	let mut session = PlayerSession::new();
	assert!(session.read_output().await.unwrap().is_empty());
}

#[tokio::test]
async fn play_on_a_closed_session_leaves_state_unchanged() {
	let mut session = PlayerSession::new();
	let err = session.play("track.mp3").await.unwrap_err();
	assert!(matches!(err, RcError::NotOpen));
	assert!(session.now_playing().is_none());
}

#[tokio::test]
async fn read_output_returns_after_one_quiet_window() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&["one", "two", "three"]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;

	let started = std::time::Instant::now();
	let lines = session.read_output().await?;
	let elapsed = started.elapsed();

	assert_eq!(lines, ["one", "two", "three"]);
	assert!(elapsed >= Duration::from_millis(150), "drain returned before the quiet window: {elapsed:?}");
	assert!(elapsed < Duration::from_secs(2), "drain did not stop at quiescence: {elapsed:?}");
	assert_eq!(session.output_history(), ["one", "two", "three"]);

	session.quit().await?;
	Ok(())
}

#[tokio::test]
async fn send_command_excludes_backlog_but_records_it_in_history() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&["status change: ( new input: x.mp3 )"]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	// let the banner arrive so it is backlog rather than in-flight data
	tokio::time::sleep(Duration::from_millis(50)).await;

	let response = session.send_command("pause").await?;
	assert_eq!(response, ["pause"]);

	let history = session.output_history();
	assert!(history.contains(&"status change: ( new input: x.mp3 )".to_string()));
	assert!(history.contains(&"pause".to_string()));

	session.quit().await?;
	Ok(())
}

#[tokio::test]
async fn send_command_keeping_backlog_returns_stale_lines_first() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&["hello"]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	tokio::time::sleep(Duration::from_millis(50)).await;

	let response = session.send_command_keeping_backlog("pause").await?;
	assert_eq!(response, ["hello", "pause"]);

	session.quit().await?;
	Ok(())
}

#[tokio::test]
async fn history_survives_quit() -> Result<()> {
	let dir = TempDir::new()?;
	let stub = start_stub(&[]).await;
	let mut session = test_session(&dir);

	session.open_on(stub.port).await?;
	session.pause().await?;
	session.quit().await?;

	assert_eq!(session.output_history(), ["pause"]);
	Ok(())
}

#[tokio::test]
async fn failed_connect_closes_the_session_and_reaps_the_player() -> Result<()> {
	let dir = TempDir::new()?;
	let port = vlcrc::free_port("127.0.0.1").await?;
	let options = SessionOptions::default()
		.with_program(stub_player(&dir))
		.with_launch_dir(dir.path())
		.with_connect_retry(ConnectRetry {
			attempts: 3,
			delay: Duration::from_millis(50),
		});
	let mut session = PlayerSession::with_options(options);

	let err = session.open_on(port).await.unwrap_err();
	assert!(matches!(err, RcError::Connect(_)));
	assert!(!session.is_open());
	Ok(())
}

#[tokio::test]
async fn player_dying_on_startup_surfaces_a_connect_failure() -> Result<()> {
	use std::os::unix::fs::PermissionsExt;

	let dir = TempDir::new()?;
	let path = dir.path().join("player");
	std::fs::write(&path, "#!/bin/sh\nexit 7\n")?;
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

	let port = vlcrc::free_port("127.0.0.1").await?;
	let options = SessionOptions::default().with_program(path).with_connect_retry(ConnectRetry {
		attempts: 10,
		delay: Duration::from_millis(50),
	});
	let mut session = PlayerSession::with_options(options);

	let err = session.open_on(port).await.unwrap_err();
	assert!(matches!(err, RcError::Connect(_)));
	assert!(!session.is_open());
	Ok(())
}

#[tokio::test]
async fn missing_player_program_fails_launch() {
	let options = SessionOptions::default().with_program("definitely-not-a-real-player-binary");
	let mut session = PlayerSession::with_options(options);

	let err = session.open().await.unwrap_err();
	assert!(matches!(err, RcError::Launch(_)));
	assert!(!session.is_open());
}
