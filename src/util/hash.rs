//! Hashing utilities for patch verification and configuration fingerprints.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fail unless the file's SHA256 equals `expected` (hex, case-insensitive).
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;

    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "hash mismatch for '{}': expected {}, got {}",
            path.display(),
            expected,
            actual
        );
    }

    Ok(())
}

/// Incremental fingerprint over a sequence of string components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// First 16 hex chars of [`Fingerprint::finish`].
    pub fn finish_short(self) -> String {
        self.finish()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_str() {
        assert_eq!(sha256_str("hello"), HELLO_SHA256);
    }

    #[test]
    fn test_verify_sha256() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fix.patch");
        std::fs::write(&path, "hello").unwrap();

        assert!(verify_sha256(&path, HELLO_SHA256).is_ok());
        assert!(verify_sha256(&path, &HELLO_SHA256.to_uppercase()).is_ok());

        let err = verify_sha256(&path, &sha256_str("other")).unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_fingerprint_separates_components() {
        let joined = {
            let mut fp = Fingerprint::new();
            fp.update_str("ab").update_str("c");
            fp.finish_short()
        };
        let split = {
            let mut fp = Fingerprint::new();
            fp.update_str("a").update_str("bc");
            fp.finish_short()
        };

        assert_eq!(joined.len(), 16);
        assert_ne!(joined, split);
    }
}
