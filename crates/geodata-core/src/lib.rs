//! Core of the geodata bootstrap tooling.
//!
//! This crate stages the parcel archive and GeoPackage published on the
//! project's GitHub release into a local data directory, registers the large
//! GeoPackage with Git LFS, and uploads regenerated data files back to the
//! release. The `geodata-bootstrap` crate wraps these helpers in standalone
//! binaries.

pub mod artifact;
pub mod bootstrap;
pub mod checksum;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod lfs;
pub mod pipeline;
pub mod release;

pub use artifact::{ArtifactKind, RemoteArtifact};
pub use bootstrap::{BootstrapFetcher, FetchReport, StagedArtifact, fetch_all};
pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use config::{
    ConfigFile, FailurePolicy, FetchConfig, LfsConfig, NetworkSettings, Preset, ReleaseConfig,
};
pub use error::{BootstrapError, Result};
pub use lfs::LfsRegistrar;
pub use pipeline::{PipelineReport, StageOutcome, StageStatus};
pub use release::ReleaseUploader;
