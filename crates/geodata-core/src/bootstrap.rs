use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::artifact::{ArtifactKind, RemoteArtifact};
use crate::config::{FailurePolicy, FetchConfig};
use crate::error::{BootstrapError, Result};
use crate::extract;
use crate::fetch::SourceRegistry;

/// One artifact after it has been staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub url: String,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
    /// Paths written by extraction, relative to the base directory.
    pub extracted: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub base_dir: PathBuf,
    pub staged: Vec<StagedArtifact>,
}

impl FetchReport {
    /// One-line summary, naming the top-level entries extracted from archives.
    pub fn completion_message(&self) -> String {
        let extracted: Vec<PathBuf> = self
            .staged
            .iter()
            .flat_map(|artifact| artifact.extracted.iter().cloned())
            .collect();
        let mut message = format!(
            "Data ready in {}: {} artifact(s) downloaded, {} archive entries extracted",
            self.base_dir.display(),
            self.staged.len(),
            extracted.len()
        );
        let top = extract::top_level_entries(&extracted);
        if !top.is_empty() {
            let names = top
                .iter()
                .map(|entry| entry.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str(&format!(" ({names})"));
        }
        message
    }
}

/// Stages remote artifacts into a base directory.
#[derive(Debug)]
pub struct BootstrapFetcher {
    config: FetchConfig,
    sources: SourceRegistry,
}

impl BootstrapFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let sources = SourceRegistry::new(&config.network)?;
        Ok(Self { config, sources })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every configured artifact in order.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing artifact aborts the
    /// run. Under [`FailurePolicy::KeepGoing`] every artifact is attempted and
    /// the failures are returned together. Either way, artifacts staged before
    /// a failure stay on disk.
    pub fn run(&self) -> Result<FetchReport> {
        let base_dir = self.config.base_dir.clone();
        let total = self.config.artifacts.len();
        let mut staged = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, artifact) in self.config.artifacts.iter().enumerate() {
            info!(
                step = index + 1,
                total,
                url = %artifact.url,
                kind = %artifact.kind,
                "fetching artifact"
            );
            match self.stage(artifact, &base_dir) {
                Ok(done) => staged.push(done),
                Err(err) => {
                    error!(url = %artifact.url, error = %err, "artifact failed");
                    match self.config.policy {
                        FailurePolicy::FailFast => return Err(err),
                        FailurePolicy::KeepGoing => failures.push(err),
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(BootstrapError::Multiple { total, failures });
        }
        Ok(FetchReport { base_dir, staged })
    }

    fn stage(&self, artifact: &RemoteArtifact, base_dir: &Path) -> Result<StagedArtifact> {
        fs::create_dir_all(base_dir)
            .map_err(|err| BootstrapError::io("failed to create base directory", base_dir, err))?;
        let dest = artifact.destination_in(base_dir)?;
        let fetched = self
            .sources
            .fetch_to(&artifact.url, &dest, artifact.sha256.as_deref())?;

        let extracted = match artifact.kind {
            ArtifactKind::Archive => extract::unzip_into(&dest, base_dir)?,
            ArtifactKind::RawFile => Vec::new(),
        };
        info!(
            path = %dest.display(),
            bytes = fetched.bytes,
            extracted = extracted.len(),
            "artifact staged"
        );

        Ok(StagedArtifact {
            url: artifact.url.clone(),
            kind: artifact.kind,
            path: dest,
            bytes: fetched.bytes,
            sha256: fetched.sha256,
            extracted,
        })
    }
}

/// Convenience wrapper: build a fetcher for `config` and run it once.
pub fn fetch_all(config: FetchConfig) -> Result<FetchReport> {
    BootstrapFetcher::new(config)?.run()
}
