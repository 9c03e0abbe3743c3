// src/watch/patterns.rs

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::WatchError;
use crate::graph::TaskName;

/// Association between a set of filesystem globs and the task to re-run
/// when a matching path changes.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    pub globs: Vec<String>,
    pub task: TaskName,
}

/// Compiled form of a [`WatchBinding`]. Patterns are matched against paths
/// relative to the project root, forward-slashed.
#[derive(Clone)]
pub struct BindingProfile {
    task: TaskName,
    set: GlobSet,
    patterns: Vec<String>,
}

impl fmt::Debug for BindingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingProfile")
            .field("task", &self.task)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl BindingProfile {
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Compile every binding's glob list. An invalid pattern is a broken build
/// description and fails the whole watch session up front.
pub fn compile_bindings(bindings: &[WatchBinding]) -> Result<Vec<BindingProfile>, WatchError> {
    let mut profiles = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let mut builder = GlobSetBuilder::new();
        for pattern in &binding.globs {
            let glob = Glob::new(pattern).map_err(|source| WatchError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| WatchError::Pattern {
            pattern: binding.globs.join(", "),
            source,
        })?;

        profiles.push(BindingProfile {
            task: binding.task.clone(),
            set,
            patterns: binding.globs.clone(),
        });
    }

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_matches_relative_paths() {
        let profiles = compile_bindings(&[WatchBinding {
            globs: vec!["sass/**/*.scss".into()],
            task: "styles".into(),
        }])
        .unwrap();

        assert!(profiles[0].matches("sass/theme/dark.scss"));
        assert!(!profiles[0].matches("js/app.js"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = compile_bindings(&[WatchBinding {
            globs: vec!["sass/{".into()],
            task: "styles".into(),
        }])
        .unwrap_err();
        assert!(matches!(err, WatchError::Pattern { .. }));
    }
}
