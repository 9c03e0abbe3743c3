// src/transform/concat.rs

use std::path::PathBuf;

use crate::errors::TransformError;
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Joins the whole file set into a single output record, inputs ordered by
/// relative path. An empty input set produces an empty output set rather
/// than an empty file.
#[derive(Debug, Clone)]
pub struct ConcatStep {
    output: PathBuf,
}

impl ConcatStep {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl TransformStep for ConcatStep {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn apply(&self, mut files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        files.sort_by(|a, b| a.rel_path().cmp(b.rel_path()));

        let mut joined = Vec::new();
        for (i, file) in files.iter().enumerate() {
            if i > 0 {
                joined.push(b'\n');
            }
            joined.extend_from_slice(file.contents());
        }

        Ok(vec![FileRecord::new(self.output.clone(), joined)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn joins_sorted_by_path() {
        let out = ConcatStep::new("js/main.js")
            .apply(vec![
                FileRecord::new("js/z.js", b"z();".to_vec()),
                FileRecord::new("js/a.js", b"a();".to_vec()),
            ])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rel_path(), Path::new("js/main.js"));
        assert_eq!(out[0].contents(), b"a();\nz();");
    }

    #[test]
    fn empty_input_produces_no_output() {
        let out = ConcatStep::new("main.js").apply(Vec::new()).unwrap();
        assert!(out.is_empty());
    }
}
