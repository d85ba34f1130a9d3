use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Every way a bootstrap, registration or upload step can fail.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("transfer of {url} into {} broke off: {source}", .dest.display())]
    Transfer {
        url: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a readable zip archive: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("stage `{stage}` failed: `{command}` exited with {}: {stderr}", describe_status(.status))]
    Command {
        stage: &'static str,
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("stage `{stage}` failed: {reason}")]
    Stage { stage: &'static str, reason: String },
    #[error("unsupported artifact source `{0}`")]
    UnsupportedSource(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{} of {total} steps failed: {}", .failures.len(), join_failures(.failures))]
    Multiple {
        total: usize,
        failures: Vec<BootstrapError>,
    },
}

impl BootstrapError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Name of the pipeline stage this error came from, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Command { stage, .. } | Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn join_failures(failures: &[BootstrapError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
