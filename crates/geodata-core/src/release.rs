use std::path::PathBuf;

use tracing::info;

use crate::artifact::filename_from_url;
use crate::command::{CommandRunner, CommandSpec, run_checked};
use crate::config::ReleaseConfig;
use crate::error::{BootstrapError, Result};
use crate::pipeline::{Pipeline, PipelineReport, StageResult};

pub const STAGE_CHECK_FILES: &str = "check-files";
pub const STAGE_UPLOAD: &str = "upload";

/// Public download URL of a release asset.
pub fn asset_url(repo: &str, tag: &str, asset: &str) -> String {
    format!("https://github.com/{repo}/releases/download/{tag}/{asset}")
}

/// Uploads local files as assets of an existing GitHub release via `gh`.
pub struct ReleaseUploader<R> {
    runner: R,
    config: ReleaseConfig,
}

impl<R: CommandRunner> ReleaseUploader<R> {
    pub fn new(runner: R, config: ReleaseConfig) -> Self {
        Self { runner, config }
    }

    pub fn upload(&self) -> Result<PipelineReport> {
        if self.config.files.is_empty() {
            return Err(BootstrapError::Config("no release files configured".into()));
        }
        info!(tag = %self.config.tag, files = self.config.files.len(), "uploading release assets");
        Pipeline::new("release", self.config.policy)
            .stage(STAGE_CHECK_FILES, || self.check_files())
            .stage(STAGE_UPLOAD, || {
                run_checked(
                    &self.runner,
                    &self.config.workdir,
                    STAGE_UPLOAD,
                    &self.upload_command(),
                )?;
                Ok(StageResult::Done)
            })
            .run()
    }

    /// Download URLs for the configured files, when the repository is known.
    pub fn download_urls(&self) -> Vec<String> {
        let Some(repo) = self.config.repo.as_deref() else {
            return Vec::new();
        };
        self.config
            .files
            .iter()
            .filter_map(|file| filename_from_url(&file.to_string_lossy()))
            .map(|name| asset_url(repo, &self.config.tag, &name))
            .collect()
    }

    pub fn upload_command(&self) -> CommandSpec {
        let mut args = vec![
            "release".to_string(),
            "upload".to_string(),
            self.config.tag.clone(),
        ];
        args.extend(
            self.config
                .files
                .iter()
                .map(|file| file.to_string_lossy().into_owned()),
        );
        if self.config.clobber {
            args.push("--clobber".to_string());
        }
        if let Some(repo) = &self.config.repo {
            args.push("--repo".to_string());
            args.push(repo.clone());
        }
        CommandSpec::new("gh", args)
    }

    fn check_files(&self) -> Result<StageResult> {
        let missing: Vec<PathBuf> = self
            .config
            .files
            .iter()
            .filter(|file| !self.config.workdir.join(file).is_file())
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(StageResult::Done);
        }
        let list = missing
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(BootstrapError::Stage {
            stage: STAGE_CHECK_FILES,
            reason: format!("release file(s) not found: {list}"),
        })
    }
}
