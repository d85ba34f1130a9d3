use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

/// What happens to an artifact once it is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Zip archive extracted in place into the base directory.
    Archive,
    /// Stored as-is.
    RawFile,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::RawFile => "raw_file",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote file staged by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtifact {
    pub url: String,
    pub kind: ArtifactKind,
    /// File name relative to the base directory. Defaults to the last URL segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Expected lowercase hex SHA-256 of the downloaded bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl RemoteArtifact {
    pub fn archive(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ArtifactKind::Archive,
            file_name: None,
            sha256: None,
        }
    }

    pub fn raw_file(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ArtifactKind::RawFile,
            file_name: None,
            sha256: None,
        }
    }

    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Name the artifact is stored under inside the base directory.
    pub fn resolved_file_name(&self) -> Result<String> {
        if let Some(name) = self.file_name.as_deref() {
            return validate_file_name(name).map(str::to_string);
        }
        filename_from_url(&self.url).ok_or_else(|| {
            BootstrapError::Config(format!("cannot derive a file name from `{}`", self.url))
        })
    }

    pub fn destination_in(&self, base_dir: &Path) -> Result<PathBuf> {
        Ok(base_dir.join(self.resolved_file_name()?))
    }
}

fn validate_file_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let path = Path::new(trimmed);
    let single = path.components().count() == 1 && path.file_name().is_some();
    if trimmed.is_empty() || !single {
        return Err(BootstrapError::Config(format!(
            "artifact file name `{name}` must be a plain file name"
        )));
    }
    Ok(trimmed)
}

/// Last path segment of a URL or local path, without query or fragment.
pub fn filename_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next()?;
    let last_segment = without_query.rsplit(['/', '\\']).next()?;
    let clean = last_segment.trim();
    if clean.is_empty() || clean == "." || clean == ".." {
        None
    } else {
        Some(clean.to_string())
    }
}
