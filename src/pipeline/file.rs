// src/pipeline/file.rs

use std::path::{Path, PathBuf};

/// A single file flowing through a pipeline: a logical path relative to the
/// source root plus its byte contents.
///
/// Records are immutable; every transform produces new records rather than
/// mutating inputs, so a failing step can never leave a half-modified set
/// behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    rel_path: PathBuf,
    contents: Vec<u8>,
}

impl FileRecord {
    pub fn new(rel_path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            rel_path: rel_path.into(),
            contents,
        }
    }

    /// Logical path, relative to the pipeline's source root.
    pub fn rel_path(&self) -> &Path {
        &self.rel_path
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// UTF-8 view of the contents, or `None` for binary data.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    /// New record at the same path with different contents.
    pub fn with_contents(&self, contents: Vec<u8>) -> Self {
        Self {
            rel_path: self.rel_path.clone(),
            contents,
        }
    }

    /// New record with the file extension replaced (e.g. `scss` -> `css`).
    pub fn with_extension(&self, ext: &str) -> Self {
        Self {
            rel_path: self.rel_path.with_extension(ext),
            contents: self.contents.clone(),
        }
    }

    /// New record with `suffix` inserted before the extension:
    /// `css/app.css` + `.min` -> `css/app.min.css`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let stem = self
            .rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let renamed = match self.rel_path.extension() {
            Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
            None => format!("{stem}{suffix}"),
        };
        Self {
            rel_path: self.rel_path.with_file_name(renamed),
            contents: self.contents.clone(),
        }
    }
}
