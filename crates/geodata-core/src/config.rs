use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact::RemoteArtifact;
use crate::error::{BootstrapError, Result};

pub const DEFAULT_REPO: &str = "MichJRC/my-first-binder";
pub const RELEASE_BASE_URL: &str =
    "https://github.com/MichJRC/my-first-binder/releases/download/v1.0.0";
pub const ARCHIVE_NAME: &str = "GSA2024LB.zip";
pub const GEOPACKAGE_NAME: &str = "merged_geodata.gpkg";
pub const DEFAULT_LFS_PATH: &str = "data/merged_geodata.gpkg";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Track merged_geodata.gpkg with Git LFS";
pub const DEFAULT_RELEASE_TAG: &str = "v1.0.0";

pub const ENV_BASE_DIR: &str = "GEODATA_BASE_DIR";
pub const ENV_KEEP_GOING: &str = "GEODATA_KEEP_GOING";

/// How a sequence of dependent steps reacts to a failing step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort at the first failure and report it.
    #[default]
    FailFast,
    /// Attempt every step, then report all failures together.
    KeepGoing,
}

impl FailurePolicy {
    pub fn from_flag(keep_going: bool) -> Self {
        if keep_going {
            Self::KeepGoing
        } else {
            Self::FailFast
        }
    }

    /// `KeepGoing` when `GEODATA_KEEP_GOING` is set, otherwise unchanged.
    #[must_use]
    pub fn with_env_override(self) -> Self {
        if env_flag_set(ENV_KEEP_GOING) {
            Self::KeepGoing
        } else {
            self
        }
    }
}

/// HTTP client settings shared by every download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("geodata-bootstrap/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

/// Built-in fetch layouts, one per historical bootstrap script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// `data/` with the parcel archive only.
    #[default]
    Data,
    /// `downloaded_data/` with the parcel archive only.
    DownloadedData,
    /// `downloaded_data/` with the parcel archive and the merged GeoPackage.
    DownloadedDataWithGeoPackage,
}

impl Preset {
    pub const ALL: [Preset; 3] = [
        Preset::Data,
        Preset::DownloadedData,
        Preset::DownloadedDataWithGeoPackage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::DownloadedData => "downloaded-data",
            Self::DownloadedDataWithGeoPackage => "downloaded-data-gpkg",
        }
    }

    pub fn base_dir(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::DownloadedData | Self::DownloadedDataWithGeoPackage => "downloaded_data",
        }
    }

    pub fn artifacts(self) -> Vec<RemoteArtifact> {
        let archive = RemoteArtifact::archive(release_url(ARCHIVE_NAME));
        match self {
            Self::Data | Self::DownloadedData => vec![archive],
            Self::DownloadedDataWithGeoPackage => vec![
                archive,
                RemoteArtifact::raw_file(release_url(GEOPACKAGE_NAME)),
            ],
        }
    }
}

impl FromStr for Preset {
    type Err = BootstrapError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| {
                let known = Self::ALL.map(Preset::name).join(", ");
                BootstrapError::Config(format!("unknown preset `{value}` (known: {known})"))
            })
    }
}

pub fn release_url(asset: &str) -> String {
    format!("{RELEASE_BASE_URL}/{asset}")
}

/// Everything the bootstrap fetcher needs for one run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_dir: PathBuf,
    pub artifacts: Vec<RemoteArtifact>,
    pub network: NetworkSettings,
    pub policy: FailurePolicy,
}

impl FetchConfig {
    pub fn new(base_dir: impl Into<PathBuf>, artifacts: Vec<RemoteArtifact>) -> Self {
        Self {
            base_dir: base_dir.into(),
            artifacts,
            network: NetworkSettings::default(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(preset.base_dir(), preset.artifacts())
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply a config file section on top of this configuration.
    pub fn merge_section(&mut self, section: &FetchSection) -> Result<()> {
        if let Some(preset) = section.preset.as_deref() {
            let preset = preset.parse::<Preset>()?;
            self.base_dir = PathBuf::from(preset.base_dir());
            self.artifacts = preset.artifacts();
        }
        if let Some(base_dir) = &section.base_dir {
            self.base_dir = base_dir.clone();
        }
        if !section.artifacts.is_empty() {
            self.artifacts = section.artifacts.clone();
        }
        if let Some(user_agent) = &section.user_agent {
            self.network.user_agent = user_agent.clone();
        }
        if let Some(raw) = section.timeout.as_deref() {
            self.network.timeout = Some(parse_duration(raw)?);
        }
        if let Some(policy) = section.policy {
            self.policy = policy;
        }
        Ok(())
    }

    /// Apply `GEODATA_BASE_DIR` / `GEODATA_KEEP_GOING` overrides.
    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(ENV_BASE_DIR).filter(|dir| !dir.is_empty()) {
            self.base_dir = PathBuf::from(dir);
        }
        self.policy = self.policy.with_env_override();
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(BootstrapError::Config("base directory is empty".into()));
        }
        if self.artifacts.is_empty() {
            return Err(BootstrapError::Config("no artifacts configured".into()));
        }
        for artifact in &self.artifacts {
            artifact.resolved_file_name()?;
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

/// Settings for registering a file with Git LFS.
#[derive(Debug, Clone)]
pub struct LfsConfig {
    pub workdir: PathBuf,
    pub path: String,
    pub commit_message: String,
    pub remote: String,
    pub branch: String,
    pub policy: FailurePolicy,
}

impl LfsConfig {
    pub fn merge_section(&mut self, section: &LfsSection) {
        if let Some(workdir) = &section.workdir {
            self.workdir = workdir.clone();
        }
        if let Some(path) = &section.path {
            self.path = path.clone();
        }
        if let Some(message) = &section.commit_message {
            self.commit_message = message.clone();
        }
        if let Some(remote) = &section.remote {
            self.remote = remote.clone();
        }
        if let Some(branch) = &section.branch {
            self.branch = branch.clone();
        }
        if let Some(policy) = section.policy {
            self.policy = policy;
        }
    }
}

impl Default for LfsConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            path: DEFAULT_LFS_PATH.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            policy: FailurePolicy::default(),
        }
    }
}

/// Settings for publishing files as GitHub release assets.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub workdir: PathBuf,
    /// `owner/name` passed to `gh --repo` and used for the printed download
    /// URLs. `None` lets `gh` infer the repository from the working tree, in
    /// which case no URLs are printed.
    pub repo: Option<String>,
    pub tag: String,
    pub files: Vec<PathBuf>,
    pub clobber: bool,
    pub policy: FailurePolicy,
}

impl ReleaseConfig {
    pub fn merge_section(&mut self, section: &ReleaseSection) {
        if let Some(workdir) = &section.workdir {
            self.workdir = workdir.clone();
        }
        if let Some(repo) = &section.repo {
            self.repo = Some(repo.clone());
        }
        if let Some(tag) = &section.tag {
            self.tag = tag.clone();
        }
        if !section.files.is_empty() {
            self.files = section.files.clone();
        }
        if let Some(clobber) = section.clobber {
            self.clobber = clobber;
        }
        if let Some(policy) = section.policy {
            self.policy = policy;
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            repo: Some(DEFAULT_REPO.to_string()),
            tag: DEFAULT_RELEASE_TAG.to_string(),
            files: vec![PathBuf::from(DEFAULT_LFS_PATH)],
            clobber: true,
            policy: FailurePolicy::default(),
        }
    }
}

/// On-disk configuration document. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub fetch: Option<FetchSection>,
    #[serde(default)]
    pub lfs: Option<LfsSection>,
    #[serde(default)]
    pub release: Option<ReleaseSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    pub preset: Option<String>,
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub artifacts: Vec<RemoteArtifact>,
    pub user_agent: Option<String>,
    /// humantime duration, e.g. `30s`.
    pub timeout: Option<String>,
    pub policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LfsSection {
    pub workdir: Option<PathBuf>,
    pub path: Option<String>,
    pub commit_message: Option<String>,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSection {
    pub workdir: Option<PathBuf>,
    pub repo: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    pub clobber: Option<bool>,
    pub policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileFormat {
    Toml,
    Json,
}

impl ConfigFileFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| BootstrapError::io("failed to read config", path, err))?;
        Self::parse(&contents, ConfigFileFormat::for_path(path))
            .map_err(|err| BootstrapError::Config(format!("{}: {err}", path.display())))
    }

    pub fn parse(contents: &str, format: ConfigFileFormat) -> std::result::Result<Self, String> {
        match format {
            ConfigFileFormat::Toml => toml::from_str(contents).map_err(|err| err.to_string()),
            ConfigFileFormat::Json => serde_json::from_str(contents).map_err(|err| err.to_string()),
        }
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw.trim())
        .map_err(|err| BootstrapError::Config(format!("invalid duration `{raw}`: {err}")))
}

fn env_flag_set(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
