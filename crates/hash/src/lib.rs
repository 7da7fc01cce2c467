#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 content versions for wbx
//!
//! The rebuild gate uses these digests as the modification signal of inputs
//! whose timestamps are unreliable (lock files, vendored package manifests).

use blake3::Hasher;
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use wbx_errors::Error;

const READ_BUFFER: usize = 64 * 1024;

/// Hex characters kept by [`Hash::short`]
const SHORT_LEN: usize = 16;

/// Marker fed for a listed file that does not exist
const ABSENT: &[u8] = b"\0absent\0";

/// Digest of one or more input files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; 32]);

impl Hash {
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of a single file's content
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut hasher = Hasher::new();
        feed_file(&mut hasher, path).await?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// One digest over several files, in the given order.
    ///
    /// Each path is mixed in along with its content, and a missing file
    /// contributes a fixed marker, so creating or deleting one of them
    /// changes the digest.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read.
    pub async fn hash_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, Error> {
        let mut hasher = Hasher::new();
        for path in paths {
            let path = path.as_ref();
            hasher.update(path.to_string_lossy().as_bytes());
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                feed_file(&mut hasher, path).await?;
            } else {
                hasher.update(ABSENT);
            }
        }
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shortened hex form used as a content version string
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_LEN);
        hex
    }
}

async fn feed_file(hasher: &mut Hasher, path: &Path) -> Result<(), Error> {
    let mut file = File::open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    let mut buffer = vec![0; READ_BUFFER];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..n]);
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
