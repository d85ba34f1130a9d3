//! Reading `.gitattributes` for LFS rules.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{BootstrapError, Result};

pub const ATTRIBUTES_FILE: &str = ".gitattributes";

/// The line `git lfs track <pattern>` writes.
pub fn lfs_rule_line(pattern: &str) -> String {
    format!("{} filter=lfs diff=lfs merge=lfs -text", escape_pattern(pattern))
}

/// Whether `contents` routes `pattern` through the LFS filter.
///
/// Only exact pattern matches count; a later `-filter` or `!filter` on the
/// same pattern cancels an earlier rule.
pub fn contains_lfs_rule(contents: &str, pattern: &str) -> bool {
    let wanted = normalize_pattern(pattern);
    let mut tracked = false;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((line_pattern, attrs)) = split_rule(line) else {
            continue;
        };
        if normalize_pattern(&line_pattern) != wanted {
            continue;
        }
        for attr in attrs.split_whitespace() {
            match attr {
                "filter=lfs" => tracked = true,
                "-filter" | "!filter" => tracked = false,
                other if other.starts_with("filter=") => tracked = false,
                _ => {}
            }
        }
    }
    tracked
}

/// Read the working tree's attributes file; a missing file has no rules.
pub fn has_lfs_rule(workdir: &Path, pattern: &str) -> Result<bool> {
    let path = workdir.join(ATTRIBUTES_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contains_lfs_rule(&contents, pattern)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(BootstrapError::io("failed to read", path, err)),
    }
}

fn split_rule(line: &str) -> Option<(String, &str)> {
    if let Some(rest) = line.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some((rest[..end].to_string(), &rest[end + 1..]));
    }
    let mut split = line.splitn(2, char::is_whitespace);
    let pattern = split.next()?;
    Some((pattern.replace("[[:space:]]", " "), split.next().unwrap_or("")))
}

fn escape_pattern(pattern: &str) -> String {
    pattern.replace(' ', "[[:space:]]")
}

fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.strip_prefix('/').unwrap_or(trimmed).replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_rule_written_by_lfs_track() {
        let contents = format!("*.psd binary\n{}\n", lfs_rule_line("data/merged_geodata.gpkg"));
        assert!(contains_lfs_rule(&contents, "data/merged_geodata.gpkg"));
        assert!(contains_lfs_rule(&contents, "./data/merged_geodata.gpkg"));
        assert!(!contains_lfs_rule(&contents, "data/other.gpkg"));
    }

    #[test]
    fn later_untrack_cancels_rule() {
        let contents = "data/x.gpkg filter=lfs diff=lfs merge=lfs -text\ndata/x.gpkg -filter\n";
        assert!(!contains_lfs_rule(contents, "data/x.gpkg"));
    }

    #[test]
    fn comments_and_other_filters_are_ignored() {
        let contents = "# data/x.gpkg filter=lfs\ndata/x.gpkg filter=crypt\n";
        assert!(!contains_lfs_rule(contents, "data/x.gpkg"));
    }

    #[test]
    fn patterns_with_spaces_round_trip() {
        let line = lfs_rule_line("data/my parcels.gpkg");
        assert_eq!(
            line,
            "data/my[[:space:]]parcels.gpkg filter=lfs diff=lfs merge=lfs -text"
        );
        assert!(contains_lfs_rule(&line, "data/my parcels.gpkg"));
        assert!(contains_lfs_rule(
            "\"data/my parcels.gpkg\" filter=lfs",
            "data/my parcels.gpkg"
        ));
    }

    #[test]
    fn missing_file_means_untracked() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(!has_lfs_rule(temp.path(), "data/x.gpkg").expect("read"));
        fs::write(temp.path().join(ATTRIBUTES_FILE), lfs_rule_line("data/x.gpkg")).expect("write");
        assert!(has_lfs_rule(temp.path(), "data/x.gpkg").expect("read"));
    }
}
