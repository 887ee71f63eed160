//! Process execution - spawning, capture, and timeout enforcement
//!
//! Runs commands with a wall-clock limit and bounded output capture. Children
//! are placed in their own process group so a timeout kills the whole tree,
//! not just the direct child.
//!
//! This module does NOT:
//! - Compare outputs or decide pass/fail (the judge does)
//! - Know about languages or workspaces (adapters and the executor do)

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::debug;

use crate::error::JudgeError;

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Limits for one run
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Wall-clock limit in milliseconds
    pub timeout_ms: u64,
    /// Retained bytes per captured stream
    pub max_output_bytes: usize,
}

impl RunLimits {
    pub fn new(timeout_ms: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout_ms,
            max_output_bytes,
        }
    }
}

/// Raw outcome of a run that finished before the deadline
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Exit code (-1 when the process was killed by a signal)
    pub exit_code: i32,
    /// Captured stdout, truncated at the configured cap
    pub stdout: String,
    /// Captured stderr, truncated at the configured cap
    pub stderr: String,
    /// Wall-clock time in milliseconds
    pub elapsed_ms: u64,
    /// True if stdout hit the capture cap
    pub stdout_truncated: bool,
    /// True if stderr hit the capture cap
    pub stderr_truncated: bool,
}

impl RunOutcome {
    /// A run counts as clean when it exited 0 and wrote nothing meaningful
    /// to stderr (runtime banner noise is filtered first).
    pub fn is_clean(&self) -> bool {
        self.exit_code == 0 && filter_runtime_noise(&self.stderr).trim().is_empty()
    }
}

/// Drop known JVM banner lines that are not program errors.
///
/// Only the exact option banners are filtered; a user program printing its
/// own "Picked up ..." line to stderr still fails the run.
pub fn filter_runtime_noise(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| !is_runtime_banner(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_runtime_banner(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("Picked up JAVA_TOOL_OPTIONS")
        || line.starts_with("Picked up _JAVA_OPTIONS")
}

/// Runner trait - the pluggable execution seam.
///
/// Stronger isolation (containers, seccomp, cgroups) plugs in here without
/// touching the executor or the judge.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command in `cwd` with `stdin` fed to the child.
    ///
    /// Timeouts and spawn failures are errors; a completed run is `Ok` even
    /// when the process crashed, so its output survives for classification.
    async fn run(
        &self,
        cmd: &CommandSpec,
        cwd: &Path,
        stdin: &str,
        limits: &RunLimits,
    ) -> Result<RunOutcome, JudgeError>;
}

/// Plain-process runner: no sandbox, one process group per run
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        cwd: &Path,
        stdin: &str,
        limits: &RunLimits,
    ) -> Result<RunOutcome, JudgeError> {
        debug!("Running {} {:?} in {}", cmd.program, cmd.args, cwd.display());

        let started = Instant::now();

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| JudgeError::Runtime(format!("failed to spawn {}: {}", cmd.program, e)))?;

        let child_pid = child.id();
        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let cap = limits.max_output_bytes;

        let result = tokio::time::timeout(Duration::from_millis(limits.timeout_ms), async {
            let (status, stdout, stderr, _) = tokio::join!(
                child.wait(),
                read_capped(stdout_pipe, cap),
                read_capped(stderr_pipe, cap),
                feed_stdin(stdin_pipe, stdin),
            );
            (status, stdout, stderr)
        })
        .await;

        match result {
            Ok((status, (stdout, stdout_truncated), (stderr, stderr_truncated))) => {
                let status = status.map_err(|e| {
                    JudgeError::Runtime(format!("failed to wait for {}: {}", cmd.program, e))
                })?;

                Ok(RunOutcome {
                    exit_code: status.code().unwrap_or(-1),
                    stdout,
                    stderr,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    stdout_truncated,
                    stderr_truncated,
                })
            }
            Err(_) => {
                kill_process_group(child_pid);
                // Direct SIGKILL plus reap, in case the group kill raced
                let _ = child.kill().await;
                Err(JudgeError::Timeout(limits.timeout_ms))
            }
        }
    }
}

/// Write the input and close the pipe. Write errors are ignored: the child
/// may exit, or simply never read stdin, before the input is fully written.
async fn feed_stdin(pipe: Option<ChildStdin>, input: &str) {
    if let Some(mut pipe) = pipe {
        let _ = pipe.write_all(input.as_bytes()).await;
        let _ = pipe.shutdown().await;
    }
}

/// Read a pipe to EOF, retaining at most `cap` bytes.
///
/// Reading continues past the cap: if capture simply stopped, a chatty child
/// would block on a full pipe and every such run would end as a timeout.
async fn read_capped<R>(pipe: Option<R>, cap: usize) -> (String, bool)
where
    R: AsyncRead + Unpin,
{
    let mut pipe = match pipe {
        Some(pipe) => pipe,
        None => return (String::new(), false),
    };

    let mut retained: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 4096];

    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if retained.len() < cap {
                    let take = n.min(cap - retained.len());
                    retained.extend_from_slice(&buf[..take]);
                    if take < n {
                        truncated = true;
                    }
                } else {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }

    (String::from_utf8_lossy(&retained).to_string(), truncated)
}

/// SIGKILL the child's process group, catching any grandchildren
fn kill_process_group(child_pid: Option<u32>) {
    if let Some(pid) = child_pid {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!("killpg({}) failed: {}", pid, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{CommandRunner, CommandSpec, RunLimits, RunOutcome};
    use crate::error::JudgeError;

    /// Runner double that replays a fixed sequence of outcomes
    pub(crate) struct ScriptedRunner {
        outcomes: Mutex<VecDeque<Result<RunOutcome, JudgeError>>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(outcomes: Vec<Result<RunOutcome, JudgeError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
            }
        }

        pub(crate) fn exited(
            code: i32,
            stdout: &str,
            stderr: &str,
        ) -> Result<RunOutcome, JudgeError> {
            Ok(RunOutcome {
                exit_code: code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                elapsed_ms: 1,
                stdout_truncated: false,
                stderr_truncated: false,
            })
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            _cmd: &CommandSpec,
            _cwd: &Path,
            _stdin: &str,
            _limits: &RunLimits,
        ) -> Result<RunOutcome, JudgeError> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted runner ran out of outcomes")
        }
    }
}
