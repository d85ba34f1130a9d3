use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{BootstrapError, Result};

/// Reader adapter that hashes every byte read through it.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Lowercase hex SHA-256 of everything read so far.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}

pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hashing = HashingReader::new(reader);
    io::copy(&mut hashing, &mut io::sink())?;
    Ok(hashing.finish())
}

/// Compare a computed digest against an expected one, ignoring case and an optional `sha256:` prefix.
pub fn verify(path: &Path, expected: &str, actual: &str) -> Result<()> {
    let expected_clean = expected.trim();
    let expected_clean = expected_clean
        .strip_prefix("sha256:")
        .unwrap_or(expected_clean);
    if expected_clean.eq_ignore_ascii_case(actual) {
        return Ok(());
    }
    Err(BootstrapError::ChecksumMismatch {
        path: path.to_path_buf(),
        expected: expected_clean.to_ascii_lowercase(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn hashes_known_vector() {
        assert_eq!(sha256_reader(&mut &b"abc"[..]).expect("hash"), ABC);
    }

    #[test]
    fn hashing_reader_passes_bytes_through() {
        let mut reader = HashingReader::new(&b"abc"[..]);
        let mut copied = Vec::new();
        reader.read_to_end(&mut copied).expect("read");
        assert_eq!(copied, b"abc");
        assert_eq!(reader.finish(), ABC);
    }

    #[test]
    fn verify_ignores_case_and_prefix() {
        let path = Path::new("abc.txt");
        verify(path, &ABC.to_ascii_uppercase(), ABC).expect("uppercase matches");
        verify(path, &format!("sha256:{ABC}"), ABC).expect("prefixed matches");
        let err = verify(path, "deadbeef", ABC).expect_err("mismatch");
        assert!(matches!(err, BootstrapError::ChecksumMismatch { .. }));
    }
}
