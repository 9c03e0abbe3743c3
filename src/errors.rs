// src/errors.rs

//! Structured error taxonomy.
//!
//! Three failure families with different blast radii:
//! - [`TransformError`]: one file failed its conversion. Fails the owning
//!   pipeline run before any destination write; sibling pipelines in
//!   parallel tasks keep running.
//! - [`TaskError`]: a named task failed, carrying the originating transform
//!   failure(s) or child task failure(s).
//! - [`GraphError`] / [`WatchError`]: a broken build description or a failed
//!   watch subscription. Not transient; surfaced immediately.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a single file's transform failed.
#[derive(Debug, Error)]
pub enum TransformCause {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{0}")]
    Invalid(String),
}

/// A single file failed inside a named transform step.
#[derive(Debug, Error)]
#[error("step '{step}' failed on '{}': {cause}", path.display())]
pub struct TransformError {
    /// Capability tag of the failing step.
    pub step: &'static str,
    /// Path of the file that could not be converted.
    pub path: PathBuf,
    #[source]
    pub cause: TransformCause,
}

impl TransformError {
    pub fn new(step: &'static str, path: impl AsRef<Path>, cause: TransformCause) -> Self {
        Self {
            step,
            path: path.as_ref().to_path_buf(),
            cause,
        }
    }
}

/// Configuration-time graph errors. Always fatal: they indicate a broken
/// build description, not a transient condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("duplicate task name '{0}'")]
    DuplicateTask(String),

    #[error("cyclic task dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },
}

/// A named task failed.
///
/// `series` members propagate their own error unchanged (the chain stops at
/// the first failure), so nesting only appears for parallel fan-outs, which
/// keep every member failure.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{task}' failed")]
    Pipeline {
        task: String,
        #[source]
        source: TransformError,
    },

    #[error("task '{task}': {} parallel member(s) failed", errors.len())]
    Parallel { task: String, errors: Vec<TaskError> },

    #[error("task '{task}' aborted: {message}")]
    Aborted { task: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl TaskError {
    /// Leaf failures in reporting order. Parallel composites flatten, so a
    /// build author sees every independent failure from a fan-out rather
    /// than just the first one collected.
    pub fn leaves(&self) -> Vec<&TaskError> {
        match self {
            TaskError::Parallel { errors, .. } => {
                errors.iter().flat_map(|err| err.leaves()).collect()
            }
            other => vec![other],
        }
    }
}

/// Failure to establish a watch session. Fatal for the session, not for
/// one-off builds.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to subscribe to filesystem events: {0}")]
    Subscription(#[from] notify::Error),

    #[error("invalid watch pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
