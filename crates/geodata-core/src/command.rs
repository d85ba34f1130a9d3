//! External command execution for the `git` / `gh` driven procedures.
//!
//! Commands run blocking, with stdin closed and `GIT_TERMINAL_PROMPT=0` so a
//! missing credential fails instead of hanging on a prompt.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{BootstrapError, Result};

/// Program plus arguments, kept separate from any shell quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs inside a working directory.
pub trait CommandRunner {
    fn run(&self, workdir: &Path, command: &CommandSpec) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, workdir: &Path, command: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(workdir, command)
    }
}

/// Spawns real processes via [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, workdir: &Path, command: &CommandSpec) -> Result<CommandOutput> {
        debug!(workdir = %workdir.display(), command = %command, "spawning");
        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| BootstrapError::Spawn {
                program: command.program.clone(),
                source,
            })?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run `command` and turn a non-zero exit into a stage error.
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    workdir: &Path,
    stage: &'static str,
    command: &CommandSpec,
) -> Result<CommandOutput> {
    let output = runner.run(workdir, command)?;
    if output.is_success() {
        return Ok(output);
    }
    Err(BootstrapError::Command {
        stage,
        command: command.to_string(),
        status: output.status,
        stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec::git(["commit", "-m", "Track merged_geodata.gpkg with Git LFS"]);
        assert_eq!(
            spec.to_string(),
            "git commit -m \"Track merged_geodata.gpkg with Git LFS\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_status() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ok = SystemRunner
            .run(temp.path(), &CommandSpec::new("sh", ["-c", "echo hi"]))
            .expect("run sh");
        assert!(ok.is_success());
        assert_eq!(ok.stdout.trim(), "hi");

        let err = run_checked(
            &SystemRunner,
            temp.path(),
            "check",
            &CommandSpec::new("sh", ["-c", "echo boom >&2; exit 3"]),
        )
        .expect_err("non-zero exit");
        match err {
            BootstrapError::Command {
                stage,
                status,
                stderr,
                ..
            } => {
                assert_eq!(stage, "check");
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let err = SystemRunner
            .run(
                temp.path(),
                &CommandSpec::new("geodata-no-such-program", Vec::<String>::new()),
            )
            .expect_err("missing program");
        assert!(matches!(err, BootstrapError::Spawn { .. }));
    }
}
