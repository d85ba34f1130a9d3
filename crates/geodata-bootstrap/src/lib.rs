//! Shared plumbing for the geodata binaries: flags, config resolution and
//! logging setup. The work itself lives in `geodata-core`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use geodata_core::{ConfigFile, FailurePolicy, FetchConfig, LfsConfig, Preset, ReleaseConfig};
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "geodata.toml";

#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Optional config file (toml/json). Defaults to ./geodata.toml when present.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Attempt every step even after a failure, then report all failures.
    #[arg(long = "keep-going")]
    pub keep_going: bool,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// Built-in layout: data, downloaded-data or downloaded-data-gpkg
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Directory artifacts are staged into (overrides preset and config)
    #[arg(long = "base-dir", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Request timeout, e.g. 30s or 2m
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RepoArgs {
    /// Working tree the git/gh commands run in
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
}

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load `--config`, else `./geodata.toml` if it exists, else an empty config.
pub fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return ConfigFile::load(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let discovered = Path::new(DEFAULT_CONFIG_FILE);
    if discovered.is_file() {
        tracing::debug!(path = DEFAULT_CONFIG_FILE, "using discovered config file");
        return ConfigFile::load(discovered).context("failed to load ./geodata.toml");
    }
    Ok(ConfigFile::default())
}

/// Precedence, lowest first: default preset, config file, environment, flags.
pub fn resolve_fetch_config(
    common: &CommonArgs,
    args: &FetchArgs,
    file: &ConfigFile,
) -> Result<FetchConfig> {
    let mut config = FetchConfig::default();
    if let Some(section) = &file.fetch {
        config
            .merge_section(section)
            .context("invalid [fetch] section")?;
    }
    config.apply_env();
    if let Some(name) = args.preset.as_deref() {
        let preset = name.parse::<Preset>()?;
        config.base_dir = PathBuf::from(preset.base_dir());
        config.artifacts = preset.artifacts();
    }
    if let Some(base_dir) = &args.base_dir {
        config.base_dir = base_dir.clone();
    }
    if let Some(raw) = args.timeout.as_deref() {
        config.network.timeout = Some(geodata_core::config::parse_duration(raw)?);
    }
    if common.keep_going {
        config.policy = FailurePolicy::KeepGoing;
    }
    config.validate()?;
    Ok(config)
}

/// Precedence, lowest first: defaults, config file, environment, flags.
pub fn resolve_lfs_config(common: &CommonArgs, repo: &RepoArgs, file: &ConfigFile) -> LfsConfig {
    let mut config = LfsConfig::default();
    if let Some(section) = &file.lfs {
        config.merge_section(section);
    }
    config.policy = config.policy.with_env_override();
    if let Some(workdir) = &repo.workdir {
        config.workdir = workdir.clone();
    }
    if common.keep_going {
        config.policy = FailurePolicy::KeepGoing;
    }
    config
}

/// Same precedence as [`resolve_lfs_config`].
pub fn resolve_release_config(
    common: &CommonArgs,
    repo: &RepoArgs,
    file: &ConfigFile,
) -> ReleaseConfig {
    let mut config = ReleaseConfig::default();
    if let Some(section) = &file.release {
        config.merge_section(section);
    }
    config.policy = config.policy.with_env_override();
    if let Some(workdir) = &repo.workdir {
        config.workdir = workdir.clone();
    }
    if common.keep_going {
        config.policy = FailurePolicy::KeepGoing;
    }
    config
}
