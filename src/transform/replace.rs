// src/transform/replace.rs

use regex::Regex;

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Regex search/replace over text contents. Capture groups are available in
/// the replacement as `$1`, `$2`, ...
///
/// Not idempotent in general: a replacement may re-match its own output.
#[derive(Debug, Clone)]
pub struct ReplaceStep {
    pattern: Regex,
    replacement: String,
}

impl ReplaceStep {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

impl TransformStep for ReplaceStep {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn idempotent(&self) -> bool {
        false
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        files
            .into_iter()
            .map(|file| match file.text() {
                Some(text) => {
                    let replaced = self
                        .pattern
                        .replace_all(text, self.replacement.as_str())
                        .into_owned();
                    Ok(file.with_contents(replaced.into_bytes()))
                }
                None => Err(TransformError::new(
                    self.name(),
                    file.rel_path(),
                    TransformCause::Invalid("not valid UTF-8".into()),
                )),
            })
            .collect()
    }
}
