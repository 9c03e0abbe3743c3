// src/transform/rename.rs

use crate::errors::TransformError;
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Inserts a suffix before each file's extension (`app.css` -> `app.min.css`).
///
/// Not idempotent: applying it twice doubles the suffix.
#[derive(Debug, Clone)]
pub struct RenameStep {
    suffix: String,
}

impl RenameStep {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl TransformStep for RenameStep {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        Ok(files
            .into_iter()
            .map(|file| file.with_suffix(&self.suffix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn renames_every_file_in_the_set() {
        let out = RenameStep::new(".min")
            .apply(vec![
                FileRecord::new("css/a.css", Vec::new()),
                FileRecord::new("css/b.css", Vec::new()),
            ])
            .unwrap();
        assert_eq!(out[0].rel_path(), Path::new("css/a.min.css"));
        assert_eq!(out[1].rel_path(), Path::new("css/b.min.css"));
    }
}
