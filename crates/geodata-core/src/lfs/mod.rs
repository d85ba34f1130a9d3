//! Registering a data file with Git LFS and publishing the change.
//!
//! The registrar runs six dependent stages against a working tree:
//! `install`, `track`, `stage-attributes`, `stage-file`, `commit`, `push`.
//! The track stage is skipped when `.gitattributes` already carries the rule,
//! and the commit stage is skipped when nothing is staged, so a second run on
//! an already registered tree only pushes.

use std::path::Path;

use tracing::info;

use crate::command::{CommandRunner, CommandSpec, run_checked};
use crate::config::LfsConfig;
use crate::error::{BootstrapError, Result};
use crate::pipeline::{Pipeline, PipelineReport, StageResult};

pub mod attributes;

pub use attributes::{ATTRIBUTES_FILE, contains_lfs_rule, has_lfs_rule, lfs_rule_line};

pub const STAGE_INSTALL: &str = "install";
pub const STAGE_TRACK: &str = "track";
pub const STAGE_ADD_ATTRIBUTES: &str = "stage-attributes";
pub const STAGE_ADD_FILE: &str = "stage-file";
pub const STAGE_COMMIT: &str = "commit";
pub const STAGE_PUSH: &str = "push";

pub struct LfsRegistrar<R> {
    runner: R,
    config: LfsConfig,
}

impl<R: CommandRunner> LfsRegistrar<R> {
    pub fn new(runner: R, config: LfsConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &LfsConfig {
        &self.config
    }

    pub fn register(&self) -> Result<PipelineReport> {
        if self.config.path.trim().is_empty() {
            return Err(BootstrapError::Config("LFS path is empty".into()));
        }
        info!(
            workdir = %self.config.workdir.display(),
            path = %self.config.path,
            remote = %self.config.remote,
            branch = %self.config.branch,
            "registering file with git lfs"
        );
        Pipeline::new("lfs", self.config.policy)
            .stage(STAGE_INSTALL, || self.install())
            .stage(STAGE_TRACK, || self.track())
            .stage(STAGE_ADD_ATTRIBUTES, || {
                self.git(STAGE_ADD_ATTRIBUTES, ["add", ATTRIBUTES_FILE])
            })
            .stage(STAGE_ADD_FILE, || {
                self.git(STAGE_ADD_FILE, ["add", self.config.path.as_str()])
            })
            .stage(STAGE_COMMIT, || self.commit())
            .stage(STAGE_PUSH, || {
                self.git(
                    STAGE_PUSH,
                    ["push", self.config.remote.as_str(), self.config.branch.as_str()],
                )
            })
            .run()
    }

    fn workdir(&self) -> &Path {
        &self.config.workdir
    }

    fn git<const N: usize>(&self, stage: &'static str, args: [&str; N]) -> Result<StageResult> {
        run_checked(&self.runner, self.workdir(), stage, &CommandSpec::git(args))?;
        Ok(StageResult::Done)
    }

    fn install(&self) -> Result<StageResult> {
        self.git(STAGE_INSTALL, ["lfs", "install"])
    }

    fn track(&self) -> Result<StageResult> {
        let path = self.config.path.as_str();
        if has_lfs_rule(self.workdir(), path)? {
            return Ok(StageResult::Skipped(format!(
                "{path} already tracked in {ATTRIBUTES_FILE}"
            )));
        }
        self.git(STAGE_TRACK, ["lfs", "track", path])?;
        if !has_lfs_rule(self.workdir(), path)? {
            return Err(BootstrapError::Stage {
                stage: STAGE_TRACK,
                reason: format!("{ATTRIBUTES_FILE} has no LFS rule for {path} after tracking"),
            });
        }
        Ok(StageResult::Done)
    }

    fn commit(&self) -> Result<StageResult> {
        let staged_check = CommandSpec::git(["diff", "--cached", "--quiet"]);
        let staged = self.runner.run(self.workdir(), &staged_check)?;
        match staged.status {
            Some(0) => return Ok(StageResult::Skipped("nothing staged to commit".into())),
            Some(1) => {}
            status => {
                return Err(BootstrapError::Command {
                    stage: STAGE_COMMIT,
                    command: staged_check.to_string(),
                    status,
                    stderr: staged.stderr,
                });
            }
        }
        self.git(
            STAGE_COMMIT,
            ["commit", "-m", self.config.commit_message.as_str()],
        )
    }
}
