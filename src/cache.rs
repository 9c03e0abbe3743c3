// src/cache.rs

//! On-disk cache for expensive transform outputs.
//!
//! Entries are keyed by a blake3 hash over (absolute source path, source
//! bytes, transform configuration fingerprint). A key mismatch is the only
//! form of invalidation; entries never expire on time, and they persist
//! across build invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::debug;

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".pipeforge/cache";

#[derive(Debug, Clone)]
pub struct TransformCache {
    root: PathBuf,
}

impl TransformCache {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive the cache key for one (source, configuration) pair. The three
    /// components are length-separated so no two distinct inputs collide on
    /// concatenation.
    pub fn key(source_path: &Path, contents: &[u8], config_fingerprint: &str) -> String {
        let mut hasher = Hasher::new();
        let path_bytes = source_path.to_string_lossy();
        hasher.update(&(path_bytes.len() as u64).to_le_bytes());
        hasher.update(path_bytes.as_bytes());
        hasher.update(&(contents.len() as u64).to_le_bytes());
        hasher.update(contents);
        hasher.update(config_fingerprint.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub fn lookup(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(key)) {
            Ok(bytes) => {
                debug!(key, "cache hit");
                Ok(Some(bytes))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Store an entry. Write-then-rename, so a concurrent reader never sees
    /// a partial entry; concurrent writers of the same key produce identical
    /// bytes (pure transforms), making either rename outcome correct.
    pub fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let tmp = self
            .root
            .join(format!(".{key}.{}.tmp", std::process::id()));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.root.join(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_then_lookup_roundtrips() {
        let dir = tempdir().unwrap();
        let cache = TransformCache::open(dir.path().join("cache")).unwrap();

        let key = TransformCache::key(Path::new("/src/a.png"), b"bytes", "quality=80");
        assert_eq!(cache.lookup(&key).unwrap(), None);

        cache.store(&key, b"encoded").unwrap();
        assert_eq!(cache.lookup(&key).unwrap().as_deref(), Some(&b"encoded"[..]));
    }

    #[test]
    fn key_changes_with_content_and_config() {
        let path = Path::new("/src/a.png");
        let base = TransformCache::key(path, b"bytes", "quality=80");

        assert_ne!(base, TransformCache::key(path, b"other", "quality=80"));
        assert_ne!(base, TransformCache::key(path, b"bytes", "quality=60"));
        assert_ne!(
            base,
            TransformCache::key(Path::new("/src/b.png"), b"bytes", "quality=80")
        );
        assert_eq!(base, TransformCache::key(path, b"bytes", "quality=80"));
    }
}
