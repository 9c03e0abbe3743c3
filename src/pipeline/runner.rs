// src/pipeline/runner.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info};

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::file::FileRecord;
use crate::pipeline::matcher::SourceMatcher;
use crate::transform::TransformStep;

/// An ordered chain of transform steps from a matched source set to one or
/// more destination roots.
///
/// Step ordering is strict: each step consumes the *complete* output of the
/// previous one before the next starts, so a minifier always sees fully
/// compiled stylesheets, never a half-transformed interleaving.
pub struct Pipeline {
    name: String,
    matcher: SourceMatcher,
    steps: Vec<Arc<dyn TransformStep>>,
    dests: Vec<PathBuf>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("dests", &self.dests)
            .finish()
    }
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        matcher: SourceMatcher,
        steps: Vec<Arc<dyn TransformStep>>,
        dests: Vec<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            matcher,
            steps,
            dests,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the pipeline once: resolve the matcher against the filesystem
    /// now, apply every step in declared order, then write the final set
    /// under each destination root.
    ///
    /// Destination writes only begin after the last step has succeeded, so
    /// a failing transform never leaves a partially updated tree. Each
    /// individual write is write-then-rename, so a crash mid-write never
    /// exposes a half-written file to downstream consumers.
    ///
    /// Returns the number of files written per destination.
    pub async fn run(&self) -> Result<usize, TransformError> {
        let mut files = self.matcher.resolve()?;
        debug!(
            pipeline = %self.name,
            matched = files.len(),
            "resolved source set"
        );

        for step in &self.steps {
            files = step.apply(files)?;
            debug!(
                pipeline = %self.name,
                step = step.name(),
                files = files.len(),
                "step complete"
            );
        }

        for dest in &self.dests {
            for file in &files {
                write_atomic(dest, file).await?;
            }
        }

        info!(
            pipeline = %self.name,
            files = files.len(),
            dests = self.dests.len(),
            "pipeline run complete"
        );
        Ok(files.len())
    }
}

/// Write one record under `dest_root`, preserving its relative path.
async fn write_atomic(dest_root: &Path, file: &FileRecord) -> Result<(), TransformError> {
    let target = dest_root.join(file.rel_path());

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| io_error(&target, err))?;
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let tmp = target.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    fs::write(&tmp, file.contents())
        .await
        .map_err(|err| io_error(&tmp, err))?;
    fs::rename(&tmp, &target)
        .await
        .map_err(|err| io_error(&target, err))?;

    Ok(())
}

fn io_error(path: &Path, err: std::io::Error) -> TransformError {
    TransformError::new("write-dest", path, TransformCause::Io(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    use crate::transform::CssMinifyStep;

    fn matcher(root: &Path, pattern: &str) -> SourceMatcher {
        SourceMatcher::new(root, &[pattern.to_string()], &[]).unwrap()
    }

    #[tokio::test]
    async fn copies_to_every_destination_preserving_structure() {
        let dir = tempdir().unwrap();
        std_fs::create_dir_all(dir.path().join("css/sub")).unwrap();
        std_fs::write(dir.path().join("css/sub/a.css"), "a { }").unwrap();

        let pipeline = Pipeline::new(
            "copy",
            matcher(dir.path(), "css/**/*.css"),
            Vec::new(),
            vec![dir.path().join("out1"), dir.path().join("out2")],
        );

        let written = pipeline.run().await.unwrap();
        assert_eq!(written, 1);
        for out in ["out1", "out2"] {
            let copied = dir.path().join(out).join("css/sub/a.css");
            assert_eq!(std_fs::read_to_string(copied).unwrap(), "a { }");
        }
    }

    #[tokio::test]
    async fn failing_step_leaves_destinations_untouched() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("bad.css"), [0xff, 0xfe]).unwrap();

        let pipeline = Pipeline::new(
            "min",
            matcher(dir.path(), "*.css"),
            vec![Arc::new(CssMinifyStep) as Arc<dyn TransformStep>],
            vec![dir.path().join("dist")],
        );

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.step, "minify-css");
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn no_temp_files_remain_after_run() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("a.css"), "a { color : red ; }").unwrap();

        let pipeline = Pipeline::new(
            "min",
            matcher(dir.path(), "*.css"),
            vec![Arc::new(CssMinifyStep) as Arc<dyn TransformStep>],
            vec![dir.path().join("dist")],
        );
        pipeline.run().await.unwrap();

        let leftovers: Vec<_> = std_fs::read_dir(dir.path().join("dist"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(
            std_fs::read_to_string(dir.path().join("dist/a.css")).unwrap(),
            "a{color:red;}"
        );
    }
}
