//! Blocking execution of external tools with a bounded wait.

use crate::{Error, Result};
use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Default command timeout: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How often a running child is checked for exit.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading output once the child itself is gone.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// The wait ran out before the process exited.
    pub timed_out: bool,
    /// The process was forcibly terminated after the timeout.
    pub killed: bool,
}

impl ToolOutput {
    /// The process exited on its own with status 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// A builder for running one external tool invocation to completion.
///
/// The call blocks until the process exits or the timeout elapses. A process
/// still running at the deadline is considered hung. On unix it runs in its
/// own process group, and the whole group is killed; the child is then reaped
/// before `execute` returns. Output still arriving shortly after the child is
/// gone is kept, anything later is dropped. A non-zero exit status is reported through
/// [`ToolOutput::exit_code`], not as an error.
///
/// # Example
///
/// ```no_run
/// use tagforged_av::ToolCommand;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let output = ToolCommand::new(PathBuf::from("AtomicParsley"))
///     .arg("/media/show.m4v")
///     .arg("-t")
///     .timeout(Duration::from_secs(10))
///     .execute()?;
/// println!("{}", output.stdout);
/// # Ok::<(), tagforged_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<OsString>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<OsString>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum time to wait for the process.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Set how often the child is polled while waiting.
    pub fn poll_interval(&mut self, d: Duration) -> &mut Self {
        self.poll_interval = d.max(Duration::from_millis(1));
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the executable does not exist.
    /// - [`Error::Io`] if spawning or waiting on the process fails.
    pub fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        hide_console_window(&mut cmd);
        isolate_process_group(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::from_spawn(program_name.clone(), e))?;

        // Drain both pipes concurrently so a chatty child never blocks on a
        // full buffer while we poll it.
        let stdout = drain(child.stdout.take(), &program_name);
        let stderr = drain(child.stderr.take(), &program_name);

        let mut output = ToolOutput::default();
        match wait_with_deadline(&mut child, self.timeout, self.poll_interval)? {
            Some(status) => output.exit_code = status.code(),
            None => match kill_and_reap(&mut child, &program_name, self.timeout) {
                Reaped::Exited(status) => output.exit_code = status.code(),
                Reaped::Terminated { killed } => {
                    output.timed_out = true;
                    output.killed = killed;
                }
            },
        }

        // Helpers the tool left behind may still hold the pipes open.
        let deadline = Instant::now() + OUTPUT_GRACE;
        output.stdout = collect(stdout, deadline, &program_name);
        output.stderr = collect(stderr, deadline, &program_name);

        Ok(output)
    }
}

/// Poll `child` until it exits or `timeout` elapses. `None` means the
/// deadline passed with the process still running.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        thread::sleep(poll_interval.min(deadline - now));
    }
}

/// How a child that outlived its deadline ended.
#[derive(Debug)]
enum Reaped {
    /// It exited on its own between the last poll and the kill.
    Exited(ExitStatus),
    /// It was still running. `killed` is false if the kill itself failed.
    Terminated { killed: bool },
}

/// Kill a hung child, and anything it spawned, then wait for it so no
/// zombie is left behind.
fn kill_and_reap(child: &mut Child, program_name: &str, timeout: Duration) -> Reaped {
    if let Ok(Some(status)) = child.try_wait() {
        return Reaped::Exited(status);
    }

    tracing::warn!("{} still running after {:?}, killing", program_name, timeout);
    let killed = match kill_tree(child) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("failed to kill {}: {}", program_name, e);
            false
        }
    };

    if let Err(e) = child.wait() {
        tracing::warn!("failed to reap {}: {}", program_name, e);
    }

    Reaped::Terminated { killed }
}

/// Read `pipe` to EOF on its own thread, forwarding chunks as they arrive.
fn drain<R>(pipe: Option<R>, program_name: &str) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe?;
    let program_name = program_name.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("reading output of {} failed: {}", program_name, e);
                    break;
                }
            }
        }
    });

    Some(rx)
}

/// Gather what a drain thread has read, giving up at `deadline`.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant, program_name: &str) -> String {
    let Some(rx) = rx else {
        return String::new();
    };

    let mut buf = Vec::new();
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(
                    "output of {} still open after exit, keeping {} bytes",
                    program_name,
                    buf.len()
                );
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Put the child at the head of its own process group so a timeout can
/// take down everything it started.
#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("killpg failed ({}), killing the child alone", e);
            child.kill()
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

#[cfg(windows)]
fn hide_console_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345")).execute();
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[test]
    fn success_requires_clean_exit() {
        let mut output = ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        assert!(output.success());

        output.exit_code = Some(1);
        assert!(!output.success());

        output.exit_code = None;
        output.timed_out = true;
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stdout() {
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_not_an_error() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo oops >&2; exit 3"])
            .execute()
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_hung_process() {
        let started = Instant::now();
        let output = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .unwrap();
        assert!(output.timed_out);
        assert!(output.killed);
        assert_eq!(output.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_grandchildren_holding_the_pipes() {
        // No `exec`: `sh` stays the parent and `sleep` inherits its stdout.
        let started = Instant::now();
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo started; sleep 5; :"])
            .timeout(Duration::from_millis(200))
            .execute()
            .unwrap();
        assert!(output.timed_out);
        assert!(output.killed);
        assert_eq!(output.stdout.trim(), "started");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn background_helper_does_not_hold_up_a_finished_tool() {
        let started = Instant::now();
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "sleep 5 & echo done"])
            .timeout(Duration::from_secs(10))
            .execute()
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "done");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn exit_racing_the_kill_keeps_its_status() {
        let mut child = Command::new("sh")
            .args(["-c", "exit 4"])
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        // Let it exit without reaping it, as if the last poll just missed it.
        thread::sleep(Duration::from_millis(500));

        match kill_and_reap(&mut child, "sh", Duration::from_millis(1)) {
            Reaped::Exited(status) => assert_eq!(status.code(), Some(4)),
            other => panic!("expected Exited, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn short_poll_interval_still_sees_exit() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "sleep 0.1; echo ok"])
            .poll_interval(Duration::from_millis(1))
            .timeout(Duration::from_secs(5))
            .execute()
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "ok");
    }

    struct BrokenPipe {
        sent: bool,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(ErrorKind::BrokenPipe, "gone"));
            }
            self.sent = true;
            buf[..7].copy_from_slice(b"partial");
            Ok(7)
        }
    }

    #[test]
    fn read_error_keeps_what_was_read() {
        let rx = drain(Some(BrokenPipe { sent: false }), "AtomicParsley");
        let text = collect(rx, Instant::now() + Duration::from_secs(5), "AtomicParsley");
        assert_eq!(text, "partial");
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let mut cmd = ToolCommand::new(PathBuf::from("AtomicParsley"));
        cmd.poll_interval(Duration::ZERO);
        assert_eq!(cmd.poll_interval, Duration::from_millis(1));
    }

    #[cfg(unix)]
    #[test]
    fn large_output_does_not_block() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "head -c 1000000 /dev/zero | tr '\\0' 'a'"])
            .timeout(Duration::from_secs(10))
            .execute()
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 1_000_000);
    }
}
