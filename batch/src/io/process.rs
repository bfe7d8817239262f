//! Runs one external command to completion with bounded output capture.
//!
//! When a timeout is set on unix, the child leads its own process group so
//! that wrappers (`sh -c`, scripts, `uv run`) are torn down together with the
//! processes they started. Otherwise a grandchild holding the pipes would keep
//! the readers blocked long after the deadline.

use std::io::Read;
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

const READ_CHUNK: usize = 8192;

/// Bytes kept from one output stream plus the count of bytes dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub dropped: usize,
}

/// How a command ended and what it wrote.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Lossy stderr text, with a notice appended when bytes were dropped.
    pub fn stderr_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stderr.bytes).into_owned();
        if self.stderr.dropped > 0 {
            text.push_str(&format!(
                "\n[stderr truncated {} bytes]\n",
                self.stderr.dropped
            ));
        }
        text
    }
}

/// Spawn `cmd`, drain both pipes on reader threads, and wait for it.
///
/// At most `limit` bytes per stream are kept. With `timeout` set, the child
/// (and on unix its whole process group) is killed at the deadline and
/// `timed_out` is reported. If waiting fails the child is killed and reaped
/// before the error is returned.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), limit))]
pub fn run_command(
    mut cmd: Command,
    timeout: Option<Duration>,
    limit: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if timeout.is_some() {
        own_process_group(&mut cmd);
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };
    let readers = Readers::start(&mut child, limit);

    let (status, timed_out) = match wait_for_exit(&mut child, timeout) {
        Ok(done) => done,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "waiting on command failed, killing");
            abandon(&mut child, readers);
            return Err(err);
        }
    };

    let (stdout, stderr) = readers.finish()?;
    if stdout.dropped > 0 || stderr.dropped > 0 {
        warn!(
            stdout_dropped = stdout.dropped,
            stderr_dropped = stderr.dropped,
            "output truncated"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

/// Block until the child exits, or kill it once `timeout` elapses.
fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(limit) = timeout else {
        return Ok((child.wait().context("wait for command")?, false));
    };
    if let Some(status) = child.wait_timeout(limit).context("wait for command")? {
        return Ok((status, false));
    }
    warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
    terminate(child);
    let status = child.wait().context("wait command after kill")?;
    Ok((status, true))
}

/// Kill and reap `child`, then drain its readers, ignoring every error.
fn abandon(child: &mut Child, readers: Readers) {
    terminate(child);
    if let Err(e) = child.wait() {
        debug!(err = %e, "reap after failed wait");
    }
    let _ = readers.finish();
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Best-effort SIGKILL of the child's process group, then of the child itself.
///
/// Errors are logged, not returned: the child may already be gone, and the
/// caller reaps it right after.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(child.id() as i32);
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            // EPERM: the child did not lead a group of its own.
            Err(e) => debug!(err = %e, "killpg failed"),
        }
    }
    if let Err(e) = child.kill() {
        debug!(err = %e, "kill failed");
    }
}

/// Reader threads draining stdout and stderr while the child runs.
struct Readers {
    stdout: Option<JoinHandle<Result<Captured>>>,
    stderr: Option<JoinHandle<Result<Captured>>>,
}

impl Readers {
    fn start(child: &mut Child, limit: usize) -> Self {
        let stdout: Option<ChildStdout> = child.stdout.take();
        let stderr: Option<ChildStderr> = child.stderr.take();
        Self {
            stdout: stdout.map(|pipe| thread::spawn(move || capture(pipe, limit))),
            stderr: stderr.map(|pipe| thread::spawn(move || capture(pipe, limit))),
        }
    }

    fn finish(self) -> Result<(Captured, Captured)> {
        let stdout = join(self.stdout).context("join stdout")?;
        let stderr = join(self.stderr).context("join stderr")?;
        Ok((stdout, stderr))
    }
}

fn join(handle: Option<JoinHandle<Result<Captured>>>) -> Result<Captured> {
    match handle {
        None => Ok(Captured::default()),
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow!("output reader thread panicked"))?,
    }
}

/// Read `reader` to EOF, keeping the first `limit` bytes.
fn capture<R: Read>(mut reader: R, limit: usize) -> Result<Captured> {
    let mut out = Captured::default();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok(out);
        }
        let keep = n.min(limit.saturating_sub(out.bytes.len()));
        out.bytes.extend_from_slice(&chunk[..keep]);
        out.dropped += n - keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn capture_counts_dropped_bytes() {
        let data = vec![b'x'; 10_000];
        let captured = capture(data.as_slice(), 100).expect("read");
        assert_eq!(captured.bytes.len(), 100);
        assert_eq!(captured.dropped, 9_900);
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let cmd = Command::new("/definitely/not/a/real/binary");
        assert!(run_command(cmd, None, 1024).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_command(cmd, None, 1024).expect("run");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout.bytes, b"out\n");
        assert_eq!(output.stderr_text(), "err\n");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn stderr_text_notes_truncation() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'abcdef' >&2"]);
        let output = run_command(cmd, None, 3).expect("run");
        assert_eq!(output.stderr.bytes, b"abc");
        assert!(output.stderr_text().contains("[stderr truncated 3 bytes]"));
    }

    #[cfg(unix)]
    #[test]
    fn kills_child_after_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let output = run_command(cmd, Some(Duration::from_millis(100)), 1024).expect("run");
        assert!(output.timed_out);
        assert!(!output.status.success());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_grandchildren_holding_the_pipes() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 6; true"]);
        let start = Instant::now();
        let output = run_command(cmd, Some(Duration::from_secs(1)), 1024).expect("run");
        let elapsed = start.elapsed();
        assert!(output.timed_out);
        assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
    }

    #[cfg(unix)]
    #[test]
    fn abandon_reaps_child_and_releases_readers() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 6; true"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut cmd);
        let mut child = cmd.spawn().expect("spawn");
        let readers = Readers::start(&mut child, 1024);

        let start = Instant::now();
        abandon(&mut child, readers);
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(child.try_wait().expect("try_wait").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn no_timeout_waits_for_the_whole_command() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 0.2; echo done"]);
        let output = run_command(cmd, None, 1024).expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout.bytes, b"done\n");
    }
}
