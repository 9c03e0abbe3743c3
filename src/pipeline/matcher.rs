// src/pipeline/matcher.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::file::FileRecord;

/// Selects a pipeline's input files: include globs (an order-irrelevant set)
/// plus optional excludes, all relative to a root directory.
///
/// The filesystem is consulted at *run* time, not at construction time, so
/// the matched set tracks files created or deleted between runs.
#[derive(Clone)]
pub struct SourceMatcher {
    root: PathBuf,
    include: GlobSet,
    exclude: Option<GlobSet>,
    patterns: Vec<String>,
}

impl fmt::Debug for SourceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMatcher")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl SourceMatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        include: &[String],
        exclude: &[String],
    ) -> Result<Self> {
        let include_set =
            build_globset(include).context("compiling source include patterns")?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("compiling source exclude patterns")?)
        };

        Ok(Self {
            root: root.into(),
            include: include_set,
            exclude: exclude_set,
            patterns: include.to_vec(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true if the forward-slashed relative path belongs to the
    /// source set.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Resolve the matcher against the filesystem right now, reading every
    /// matched file. The result is sorted by relative path so downstream
    /// steps (notably concatenation) see a deterministic order.
    pub fn resolve(&self) -> Result<Vec<FileRecord>, TransformError> {
        let mut records = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                TransformError::new(
                    "resolve-sources",
                    path,
                    TransformCause::Io(err.into()),
                )
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(rel) = relative_str(&self.root, entry.path()) else {
                continue;
            };

            if !self.matches(&rel) {
                continue;
            }

            debug!(path = %rel, "matched source file");
            let contents = fs::read(entry.path()).map_err(|err| {
                TransformError::new(
                    "resolve-sources",
                    entry.path(),
                    TransformCause::Io(err),
                )
            })?;
            records.push(FileRecord::new(rel, contents));
        }

        records.sort_by(|a, b| a.rel_path().cmp(b.rel_path()));
        Ok(records)
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
pub(crate) fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob =
            Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn matcher(root: &Path, include: &[&str], exclude: &[&str]) -> SourceMatcher {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        SourceMatcher::new(root, &include, &exclude).unwrap()
    }

    #[test]
    fn resolves_matching_files_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sass")).unwrap();
        fs::write(dir.path().join("sass/b.scss"), "b").unwrap();
        fs::write(dir.path().join("sass/a.scss"), "a").unwrap();
        fs::write(dir.path().join("sass/readme.txt"), "x").unwrap();

        let m = matcher(dir.path(), &["sass/*.scss"], &[]);
        let files = m.resolve().unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.rel_path().to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("sass/a.scss"), PathBuf::from("sass/b.scss")]);
    }

    #[test]
    fn excludes_take_precedence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.css"), "k").unwrap();
        fs::write(dir.path().join("skip.tmp.css"), "s").unwrap();

        let m = matcher(dir.path(), &["*.css"], &["*.tmp.css"]);
        let files = m.resolve().unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path(), Path::new("keep.css"));
    }

    #[test]
    fn resolution_tracks_filesystem_changes() {
        let dir = tempdir().unwrap();
        let m = matcher(dir.path(), &["*.css"], &[]);
        assert!(m.resolve().unwrap().is_empty());

        fs::write(dir.path().join("late.css"), "later").unwrap();
        assert_eq!(m.resolve().unwrap().len(), 1);
    }

    #[test]
    fn rejects_invalid_glob() {
        let dir = tempdir().unwrap();
        let result = SourceMatcher::new(dir.path(), &["a{".to_string()], &[]);
        assert!(result.is_err());
    }
}
