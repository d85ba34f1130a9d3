use std::fs::File;
use std::path::{Path, PathBuf};

use url::Url;

use super::{ArtifactSource, Fetched, write_replacing};
use crate::error::{BootstrapError, Result};

/// Copies artifacts from `file://` URLs or plain local paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FsSource {
    fn parse_path(locator: &str) -> Result<PathBuf> {
        if locator.starts_with("file://") {
            let url = Url::parse(locator)
                .map_err(|err| BootstrapError::Config(format!("invalid file URL `{locator}`: {err}")))?;
            return url.to_file_path().map_err(|_| {
                BootstrapError::Config(format!("{locator} cannot be represented as a path"))
            });
        }
        Ok(PathBuf::from(locator))
    }
}

impl ArtifactSource for FsSource {
    fn scheme(&self) -> &'static str {
        "fs"
    }

    fn fetch_to(
        &self,
        locator: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<Fetched> {
        let path = Self::parse_path(locator)?;
        let file =
            File::open(&path).map_err(|err| BootstrapError::io("failed to open source", &path, err))?;
        write_replacing(file, locator, dest, expected_sha256)
    }
}
