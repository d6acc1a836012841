//! Process teardown and liveness helpers.

use tokio::process::Child;
use tracing::debug;

/// Signals `child` to terminate, then reaps it so no zombie is left behind.
///
/// Failed signal delivery means the process is already gone or going; that
/// race is expected during shutdown and must not abort teardown, so it is
/// absorbed and the reap proceeds.
pub async fn terminate_and_reap(child: &mut Child) -> std::io::Result<std::process::ExitStatus> {
	if let Some(pid) = child.id() {
		if let Err(e) = send_term(pid) {
			debug!(target = "vlcrc.process", pid, error = %e, "termination signal not delivered; player already exiting");
		}
	}

	child.wait().await
}

/// Returns `true` when a process with `pid` still appears alive.
pub fn pid_is_alive(pid: u32) -> bool {
	#[cfg(unix)]
	{
		if pid == 0 {
			return false;
		}

		// output() rather than status() keeps kill's "No such process"
		// complaint off the embedding application's stderr.
		std::path::Path::new("/proc").join(pid.to_string()).exists()
			|| std::process::Command::new("kill")
				.args(["-0", &pid.to_string()])
				.output()
				.map(|output| output.status.success())
				.unwrap_or(false)
	}

	#[cfg(windows)]
	{
		let filter = format!("PID eq {pid}");
		let Ok(output) = std::process::Command::new("tasklist").args(["/FI", &filter, "/FO", "CSV", "/NH"]).output() else {
			return false;
		};

		let pid_str = pid.to_string();
		String::from_utf8_lossy(&output.stdout)
			.lines()
			.filter_map(csv_pid_field)
			.any(|field| field == pid_str)
	}

	#[cfg(not(any(unix, windows)))]
	{
		pid == std::process::id()
	}
}

#[cfg(unix)]
fn send_term(pid: u32) -> std::io::Result<()> {
	let output = std::process::Command::new("kill").args(["-TERM", &pid.to_string()]).output()?;
	if output.status.success() {
		Ok(())
	} else {
		Err(std::io::Error::other(format!("kill -TERM {pid} exited with {}", output.status)))
	}
}

#[cfg(windows)]
fn send_term(pid: u32) -> std::io::Result<()> {
	let output = std::process::Command::new("taskkill").args(["/PID", &pid.to_string(), "/F"]).output()?;
	if output.status.success() {
		Ok(())
	} else {
		Err(std::io::Error::other(format!("taskkill /PID {pid} exited with {}", output.status)))
	}
}

#[cfg(not(any(unix, windows)))]
fn send_term(_pid: u32) -> std::io::Result<()> {
	Err(std::io::Error::other("no termination signal on this platform"))
}

#[cfg(any(test, windows))]
fn csv_pid_field(line: &str) -> Option<String> {
	let trimmed = line.trim();
	trimmed
		.strip_prefix('"')?
		.strip_suffix('"')?
		.split("\",\"")
		.nth(1)
		.map(|field| field.trim().to_string())
}
