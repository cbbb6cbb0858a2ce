//! Bounded command execution with cooperative cancellation.
//!
//! Gradle can be extremely chatty; capturing its output through
//! `Command::output()` would buffer everything unboundedly. The default
//! runner caps each stream and polls for cancellation while waiting.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::CancellationToken;

/// Captured output from one Gradle invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// Set when a stream had more bytes than were captured.
    pub truncated: bool,
}

impl CommandOutput {
    /// `stdout` + `stderr` joined with a newline separator when needed.
    pub fn combined(&self) -> String {
        let mut s = String::new();
        s.push_str(&self.stdout);
        if !self.stderr.is_empty() {
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }
}

pub trait CommandRunner: Send + Sync + std::fmt::Debug {
    fn run(
        &self,
        cwd: &Path,
        program: &Path,
        args: &[String],
        envs: &[(String, String)],
        cancel: &CancellationToken,
    ) -> io::Result<CommandOutput>;
}

#[derive(Debug, Clone)]
pub struct DefaultCommandRunner {
    /// Kill the process when it has not exited after this long.
    pub timeout: Option<Duration>,
    /// Per-stream capture limit.
    pub max_bytes: usize,
}

impl Default for DefaultCommandRunner {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(15 * 60)),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

impl CommandRunner for DefaultCommandRunner {
    fn run(
        &self,
        cwd: &Path,
        program: &Path,
        args: &[String],
        envs: &[(String, String)],
        cancel: &CancellationToken,
    ) -> io::Result<CommandOutput> {
        let command_line = format_command(program, args);

        let mut child = Command::new(program)
            .args(args)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                io::Error::new(err.kind(), format!("failed to run `{command_line}`: {err}"))
            })?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");
        let max_bytes = self.max_bytes;
        let out_reader = thread::spawn(move || read_bounded(stdout, max_bytes));
        let err_reader = thread::spawn(move || read_bounded(stderr, max_bytes));

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                drain(out_reader, err_reader);
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    format!("command `{command_line}` cancelled"),
                ));
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    drain(out_reader, err_reader);
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("command `{command_line}` timed out after {timeout:?}"),
                    ));
                }
            }
            thread::sleep(Duration::from_millis(20));
        };

        let (stdout, out_truncated) = out_reader.join().unwrap_or_default();
        let (stderr, err_truncated) = err_reader.join().unwrap_or_default();

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
            truncated: out_truncated || err_truncated,
        })
    }
}

type BoundedRead = (String, bool);

fn read_bounded(mut reader: impl Read, max_bytes: usize) -> BoundedRead {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let keep = n.min(max_bytes.saturating_sub(buf.len()));
                buf.extend_from_slice(&chunk[..keep]);
                if keep < n {
                    truncated = true;
                    // Keep draining so the child never blocks on a full pipe.
                }
            }
            Err(_) => break,
        }
    }
    (String::from_utf8_lossy(&buf).into_owned(), truncated)
}

fn drain(
    out: thread::JoinHandle<BoundedRead>,
    err: thread::JoinHandle<BoundedRead>,
) {
    let _ = out.join();
    let _ = err.join();
}

pub(crate) fn format_command(program: &Path, args: &[String]) -> String {
    let mut out = format_command_part(&program.to_string_lossy());
    for arg in args {
        out.push(' ');
        out.push_str(&format_command_part(arg));
    }
    out
}

fn format_command_part(part: &str) -> String {
    if part.contains(' ') || part.contains('\t') {
        format!("\"{}\"", part.replace('"', "\\\""))
    } else {
        part.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_command_with_quoting() {
        assert_eq!(
            format_command(Path::new("/usr/bin/gradle"), &["--init-script".into(), "/tmp/a b.gradle".into()]),
            "/usr/bin/gradle --init-script \"/tmp/a b.gradle\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn default_runner_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("sleep.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let runner = DefaultCommandRunner {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let err = runner
            .run(dir.path(), &script, &[], &[], &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[cfg(unix)]
    #[test]
    fn default_runner_honors_cancellation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("sleep.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let runner = DefaultCommandRunner::default();
        let err = runner
            .run(dir.path(), &script, &[], &[], &cancel)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_stderr() {
        let runner = DefaultCommandRunner::default();
        let out = runner
            .run(
                Path::new("/"),
                Path::new("/bin/sh"),
                &["-c".into(), "echo out; echo err >&2".into()],
                &[],
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert_eq!(out.combined(), "out\nerr\n");
    }
}
