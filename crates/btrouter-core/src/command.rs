//! Timeout-bounded external command execution.
//!
//! Every external program the router drives (audio server control, module
//! loader, sink selection, hardware listing) goes through a `CommandRunner`.
//! The runner reduces the run to a `CommandOutcome`; callers only learn
//! whether a command succeeded, never why it failed.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Upper bound on a single external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a command run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exit status zero within the time bound.
    Success {
        /// Captured standard output.
        stdout: String,
    },
    /// Non-zero exit, or killed by a signal (`code` is `None`).
    Failed { code: Option<i32> },
    /// The time bound elapsed; the child has been killed.
    TimedOut,
    /// The program could not be started or waited on.
    SpawnFailed,
}

impl CommandOutcome {
    /// True only for a zero exit within the time bound.
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success { .. })
    }

    /// Standard output of a successful run.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            CommandOutcome::Success { stdout } => Some(stdout),
            _ => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success { .. } => write!(f, "ok"),
            CommandOutcome::Failed { code: Some(code) } => write!(f, "failed (exit {})", code),
            CommandOutcome::Failed { code: None } => write!(f, "failed (terminated)"),
            CommandOutcome::TimedOut => write!(f, "timed out"),
            CommandOutcome::SpawnFailed => write!(f, "could not start"),
        }
    }
}

/// Boundary for running external programs.
///
/// Implementations never retry; retry policy belongs to callers.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion or until the time bound elapses.
    async fn run(&self, command: &CommandLine) -> CommandOutcome;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    /// Create a runner with the given per-command time bound.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The per-command time bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &CommandLine) -> CommandOutcome {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!("`{}` could not be started: {}", command, e);
                return CommandOutcome::SpawnFailed;
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let outcome = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => CommandOutcome::Success {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            },
            Ok(Ok(output)) => CommandOutcome::Failed {
                code: output.status.code(),
            },
            Ok(Err(e)) => {
                debug!("`{}` could not be waited on: {}", command, e);
                CommandOutcome::SpawnFailed
            }
            Err(_) => CommandOutcome::TimedOut,
        };

        debug!("`{}` -> {}", command, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_display() {
        let cmd = CommandLine::new("pactl").args(["load-module", "module-bluetooth-policy"]);
        assert_eq!(cmd.to_string(), "pactl load-module module-bluetooth-policy");
        assert_eq!(CommandLine::new("aplay").arg("-l").args, vec!["-l"]);
    }

    #[test]
    fn only_success_is_success() {
        assert!(CommandOutcome::Success { stdout: String::new() }.is_success());
        assert!(!CommandOutcome::Failed { code: Some(1) }.is_success());
        assert!(!CommandOutcome::TimedOut.is_success());
        assert!(!CommandOutcome::SpawnFailed.is_success());
        assert_eq!(CommandOutcome::TimedOut.stdout(), None);
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        assert_eq!(SystemCommandRunner::default().timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn zero_exit_is_success_with_stdout() {
        let runner = SystemCommandRunner::default();
        let outcome = runner.run(&CommandLine::new("echo").arg("card 0: USB")).await;
        assert_eq!(outcome.stdout().map(str::trim), Some("card 0: USB"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let runner = SystemCommandRunner::default();
        let outcome = runner.run(&CommandLine::new("false")).await;
        assert_eq!(outcome, CommandOutcome::Failed { code: Some(1) });
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let runner = SystemCommandRunner::default();
        let outcome = runner
            .run(&CommandLine::new("definitely-not-a-real-program-btrouter"))
            .await;
        assert_eq!(outcome, CommandOutcome::SpawnFailed);
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = SystemCommandRunner::new(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let outcome = runner.run(&CommandLine::new("sleep").arg("5")).await;
        assert_eq!(outcome, CommandOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
