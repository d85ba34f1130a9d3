use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{BootstrapError, Result};

/// Unpack a zip archive into `out_dir`, overwriting existing files.
///
/// Entries are written relative to `out_dir` itself, not a subdirectory named
/// after the archive. Entries whose names would escape `out_dir` are skipped.
/// Returns the relative paths of the files and directories written, in
/// archive order.
pub fn unzip_into(archive_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = fs::File::open(archive_path)
        .map_err(|err| BootstrapError::io("failed to open archive", archive_path, err))?;
    let mut archive = ZipArchive::new(file).map_err(|source| BootstrapError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|source| BootstrapError::Archive {
                path: archive_path.to_path_buf(),
                source,
            })?;
        let Some(enclosed) = entry.enclosed_name() else {
            warn!(
                archive = %archive_path.display(),
                entry = entry.name(),
                "skipping archive entry outside the target directory"
            );
            continue;
        };
        let out_path = out_dir.join(&enclosed);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|err| BootstrapError::io("failed to create directory", &out_path, err))?;
            written.push(enclosed);
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| BootstrapError::io("failed to create directory", parent, err))?;
        }
        let mut outfile = fs::File::create(&out_path)
            .map_err(|err| BootstrapError::io("failed to create", &out_path, err))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| {
            if err.kind() == io::ErrorKind::InvalidData {
                BootstrapError::Archive {
                    path: archive_path.to_path_buf(),
                    source: zip::result::ZipError::Io(err),
                }
            } else {
                BootstrapError::io("failed to write", &out_path, err)
            }
        })?;
        debug!(entry = %enclosed.display(), "extracted");
        written.push(enclosed);
    }

    Ok(written)
}

/// Distinct first path components of extracted entries.
pub fn top_level_entries(entries: &[PathBuf]) -> Vec<PathBuf> {
    let mut top: Vec<PathBuf> = entries
        .iter()
        .filter_map(|entry| entry.components().next())
        .map(|component| PathBuf::from(component.as_os_str()))
        .collect();
    top.sort();
    top.dedup();
    top
}
