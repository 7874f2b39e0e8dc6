//! Tracks the single external application that owns the screen while the
//! launcher is hidden.
//!
//! Lifecycle: `Idle` → (`launch`, transient) → `Foreground` → `Idle`, the
//! last edge taken the first time a non-blocking poll observes the child
//! gone. Children are detached into their own process group and are never
//! killed by the launcher; dropping the tracker just forgets the handle.

use std::fmt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How a configured command is executed.
///
/// An array in the config is an argument vector and is executed directly;
/// a bare string goes through `/bin/sh -c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Argv(Vec<String>),
    Shell(String),
}

impl CommandSpec {
    pub fn argv<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::Argv(parts.into_iter().map(Into::into).collect())
    }

    fn to_command(&self) -> Option<Command> {
        match self {
            CommandSpec::Argv(parts) => {
                let (program, args) = parts.split_first()?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                Some(cmd)
            }
            CommandSpec::Shell(line) if line.trim().is_empty() => None,
            CommandSpec::Shell(line) => {
                let mut cmd = Command::new("/bin/sh");
                cmd.arg("-c").arg(line);
                Some(cmd)
            }
        }
    }

    /// Run to completion. Used for the confirmation-gated system actions,
    /// where the machine is about to go down anyway.
    pub fn run_blocking(&self) -> Result<ExitStatus, LaunchError> {
        let mut cmd = self.to_command().ok_or(LaunchError::EmptyCommand)?;
        cmd.stdin(Stdio::null())
            .status()
            .map_err(|source| LaunchError::Spawn { command: self.to_string(), source })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Argv(parts) => write!(f, "{}", parts.join(" ")),
            CommandSpec::Shell(line) => write!(f, "sh -c {line:?}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{running}` is still in the foreground")]
    AlreadyForeground { running: String },
}

/// The application currently owning the display.
#[derive(Debug)]
pub struct ForegroundProcess {
    child: Child,
    command: CommandSpec,
    started: Instant,
}

impl ForegroundProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Result of a non-blocking liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Nothing was launched, or the last child was already reaped.
    NoProcess,
    Running,
    /// The tracked child has just been observed gone. Reported exactly once.
    Exited,
}

#[derive(Debug, Default)]
pub struct ForegroundTracker {
    current: Option<ForegroundProcess>,
}

impl ForegroundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `command` without waiting for it.
    ///
    /// Refuses while another child is tracked; the existing handle is kept.
    pub fn launch(&mut self, command: &CommandSpec) -> Result<&ForegroundProcess, LaunchError> {
        if let Some(running) = &self.current {
            return Err(LaunchError::AlreadyForeground { running: running.command.to_string() });
        }

        let mut cmd = command.to_command().ok_or(LaunchError::EmptyCommand)?;
        cmd.stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .map_err(|source| LaunchError::Spawn { command: command.to_string(), source })?;
        info!(pid = child.id(), %command, "launched foreground application");

        Ok(self.current.insert(ForegroundProcess {
            child,
            command: command.clone(),
            started: Instant::now(),
        }))
    }

    /// Check the tracked child without blocking.
    pub fn poll(&mut self) -> Liveness {
        let Some(process) = self.current.as_mut() else {
            return Liveness::NoProcess;
        };

        match process.child.try_wait() {
            Ok(None) => Liveness::Running,
            Ok(Some(status)) => {
                info!(
                    pid = process.pid(),
                    %status,
                    ran_for = ?process.started.elapsed(),
                    "foreground application exited"
                );
                self.current = None;
                Liveness::Exited
            }
            Err(e) => {
                // The child cannot be waited on any more; treat it as gone.
                warn!(pid = process.pid(), "lost track of foreground application: {e}");
                self.current = None;
                Liveness::Exited
            }
        }
    }

    pub fn is_alive(&mut self) -> bool {
        self.poll() == Liveness::Running
    }
}

impl Drop for ForegroundTracker {
    fn drop(&mut self) {
        if let Some(process) = &self.current {
            debug!(pid = process.pid(), "leaving foreground application running");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn poll_until_exit(tracker: &mut ForegroundTracker) -> usize {
        for cycle in 0..100 {
            match tracker.poll() {
                Liveness::Running => std::thread::sleep(Duration::from_millis(20)),
                Liveness::Exited => return cycle,
                Liveness::NoProcess => panic!("process vanished without an Exited report"),
            }
        }
        panic!("child never exited");
    }

    #[test]
    fn test_idle_tracker_is_not_alive() {
        let mut tracker = ForegroundTracker::new();
        assert!(!tracker.is_alive());
        assert_eq!(tracker.poll(), Liveness::NoProcess);
    }

    #[test]
    fn test_exit_reported_exactly_once() {
        let mut tracker = ForegroundTracker::new();
        let cmd = CommandSpec::argv(["sh", "-c", "sleep 0.03"]);
        tracker.launch(&cmd).unwrap();
        assert!(tracker.current.is_some());

        poll_until_exit(&mut tracker);
        assert!(tracker.current.is_none());
        assert_eq!(tracker.poll(), Liveness::NoProcess);
        assert!(!tracker.is_alive());
    }

    #[test]
    fn test_shell_string_is_run_through_sh() {
        let mut tracker = ForegroundTracker::new();
        tracker.launch(&CommandSpec::Shell("exit 3".into())).unwrap();
        poll_until_exit(&mut tracker);
    }

    #[test]
    fn test_spawn_failure_leaves_tracker_idle() {
        let mut tracker = ForegroundTracker::new();
        let err = tracker
            .launch(&CommandSpec::argv(["/nonexistent/tvlauncher-test-binary"]))
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert!(tracker.current.is_none());
        assert_eq!(tracker.poll(), Liveness::NoProcess);
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut tracker = ForegroundTracker::new();
        assert!(matches!(
            tracker.launch(&CommandSpec::Argv(vec![])),
            Err(LaunchError::EmptyCommand)
        ));
        assert!(matches!(
            tracker.launch(&CommandSpec::Shell("  ".into())),
            Err(LaunchError::EmptyCommand)
        ));
    }

    #[test]
    fn test_second_launch_rejected_and_handle_kept() {
        let mut tracker = ForegroundTracker::new();
        let first = tracker.launch(&CommandSpec::argv(["sleep", "5"])).unwrap().pid();

        let err = tracker.launch(&CommandSpec::argv(["sleep", "5"])).unwrap_err();
        assert!(matches!(err, LaunchError::AlreadyForeground { .. }));
        assert_eq!(tracker.current.as_ref().map(|p| p.pid()), Some(first));
        assert_eq!(tracker.poll(), Liveness::Running);

        let process = tracker.current.as_mut().unwrap();
        process.child.kill().unwrap();
        poll_until_exit(&mut tracker);
    }

    #[test]
    fn test_command_display() {
        assert_eq!(CommandSpec::argv(["kodi", "--standalone"]).to_string(), "kodi --standalone");
        assert_eq!(CommandSpec::Shell("a && b".into()).to_string(), "sh -c \"a && b\"");
    }

    #[test]
    fn test_command_spec_deserializes_both_forms() {
        let argv: CommandSpec = serde_json::from_str(r#"["kodi", "--fs"]"#).unwrap();
        assert_eq!(argv, CommandSpec::argv(["kodi", "--fs"]));
        let shell: CommandSpec = serde_json::from_str(r#""sudo reboot""#).unwrap();
        assert_eq!(shell, CommandSpec::Shell("sudo reboot".into()));
    }
}
