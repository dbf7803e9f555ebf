use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Memoized content hashes keyed by local path.
///
/// The fill rule is one-way: a hash is computed at most once per path and
/// never recomputed, even if the file changes afterwards. Callers that
/// rewrite a file (image downscaling) must do so before the first fill.
#[derive(Debug, Default)]
pub struct ContentHashCache {
    computed: HashMap<PathBuf, String>,
}

impl ContentHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hash previously computed for `path`, if any.
    pub fn cached(&self, path: &Path) -> Option<&str> {
        self.computed.get(path).map(String::as_str)
    }

    /// Compute-if-absent: returns the cached hash or hashes the file now
    /// and caches the result.
    pub fn fill(&mut self, path: &Path) -> io::Result<&str> {
        match self.computed.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                let digest = hash_file(path)?;
                Ok(entry.insert(digest).as_str())
            }
        }
    }
}

/// SHA-256 of a file's bytes as lowercase hex, read in fixed-size chunks.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    Ok(hex)
}
