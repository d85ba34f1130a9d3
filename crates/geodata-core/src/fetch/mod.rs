//! Artifact retrieval backends.
//!
//! Each backend copies one remote artifact to a local path. The copy lands in
//! a temporary file beside the destination and is hashed on the way. It is
//! renamed over the destination only once complete and, when a digest is
//! expected, verified; otherwise the previous download stays untouched.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::checksum::{self, HashingReader};
use crate::config::NetworkSettings;
use crate::error::{BootstrapError, Result};

mod fs_source;
mod http;

pub use fs_source::FsSource;
pub use http::HttpSource;

/// Result of one completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the bytes written.
    pub sha256: String,
}

/// A backend able to copy a located artifact onto local disk.
pub trait ArtifactSource {
    fn scheme(&self) -> &'static str;

    /// Copy the artifact at `locator` to `dest`, replacing it.
    ///
    /// With `expected_sha256` set, a mismatching transfer is discarded and
    /// `dest` is left as it was.
    fn fetch_to(
        &self,
        locator: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<Fetched>;
}

/// Picks the backend for a locator by its URL scheme.
#[derive(Debug)]
pub struct SourceRegistry {
    http: HttpSource,
    fs: FsSource,
}

impl SourceRegistry {
    pub fn new(network: &NetworkSettings) -> Result<Self> {
        Ok(Self {
            http: HttpSource::new(network)?,
            fs: FsSource,
        })
    }

    pub fn resolve(&self, locator: &str) -> Result<&dyn ArtifactSource> {
        match scheme_of(locator) {
            Some("http" | "https") => Ok(&self.http),
            Some("file") | None => Ok(&self.fs),
            Some(other) => Err(BootstrapError::UnsupportedSource(other.to_string())),
        }
    }

    pub fn fetch_to(
        &self,
        locator: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<Fetched> {
        self.resolve(locator)?.fetch_to(locator, dest, expected_sha256)
    }
}

fn scheme_of(locator: &str) -> Option<&str> {
    let (scheme, _) = locator.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        return None;
    }
    Some(scheme)
}

/// Stream `reader` (the body of `locator`) into `dest` through a sibling
/// temporary file, verifying `expected_sha256` before the rename.
pub(crate) fn write_replacing<R: Read>(
    reader: R,
    locator: &str,
    dest: &Path,
    expected_sha256: Option<&str>,
) -> Result<Fetched> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|err| BootstrapError::io("failed to create directory", parent, err))?;
    let mut staging = NamedTempFile::new_in(parent)
        .map_err(|err| BootstrapError::io("failed to create staging file in", parent, err))?;
    let mut hashing = HashingReader::new(reader);
    let bytes = copy_chunks(&mut hashing, staging.as_file_mut(), locator, dest)?;
    staging
        .as_file_mut()
        .flush()
        .map_err(|err| BootstrapError::io("failed to flush download for", dest, err))?;
    let sha256 = hashing.finish();
    if let Some(expected) = expected_sha256 {
        checksum::verify(dest, expected, &sha256)?;
    }
    staging
        .persist(dest)
        .map_err(|err| BootstrapError::io("failed to move download into place", dest, err.error))?;
    Ok(Fetched { bytes, sha256 })
}

fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    locator: &str,
    dest: &Path,
) -> Result<u64> {
    const CHUNK_SIZE: usize = 64 * 1024;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(BootstrapError::Transfer {
                    url: locator.to_string(),
                    dest: dest.to_path_buf(),
                    source,
                });
            }
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|err| BootstrapError::io("failed to write download for", dest, err))?;
        total += read as u64;
    }
    Ok(total)
}
