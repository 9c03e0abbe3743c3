// src/project.rs

//! Assembles runnable pieces from a validated build description: pipelines,
//! the task registry, and watch bindings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::cache::TransformCache;
use crate::config::model::{ConfigFile, StepConfig};
use crate::errors::TaskError;
use crate::graph::{self, TaskRegistry, TaskUnit};
use crate::pipeline::{Pipeline, SourceMatcher};
use crate::transform::image::{ImageCodec, ImageReencodeStep, PassthroughCodec, ReencodeOptions};
use crate::transform::style::{PlainStyleCompiler, StyleCompileStep, StyleCompiler};
use crate::transform::{
    ConcatStep, CssMinifyStep, HtmlValidateStep, RenameStep, ReplaceStep, SvgMinifyStep,
    TransformStep,
};
use crate::watch::WatchBinding;

/// External transform collaborators. Defaults to the built-in
/// implementations; embedders swap in a real preprocessor or codec here.
#[derive(Clone)]
pub struct Toolchain {
    pub style: Arc<dyn StyleCompiler>,
    pub image: Arc<dyn ImageCodec>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            style: Arc::new(PlainStyleCompiler),
            image: Arc::new(PassthroughCodec),
        }
    }
}

/// A fully assembled project: the registry of executable tasks plus the
/// watch bindings, rooted at a directory. Immutable once built; executing
/// tasks only reads it.
pub struct Project {
    root: PathBuf,
    registry: Arc<TaskRegistry>,
    bindings: Vec<WatchBinding>,
}

impl Project {
    /// Assemble with the built-in toolchain.
    pub fn from_config(cfg: &ConfigFile, config_dir: &Path) -> Result<Self> {
        Self::with_toolchain(cfg, config_dir, Toolchain::default())
    }

    pub fn with_toolchain(
        cfg: &ConfigFile,
        config_dir: &Path,
        toolchain: Toolchain,
    ) -> Result<Self> {
        let root = config_dir.join(&cfg.project.root);
        // Absolute root keeps cache keys stable regardless of the cwd the
        // build was invoked from.
        let root = root.canonicalize().unwrap_or(root);
        let cache = TransformCache::open(root.join(&cfg.project.cache_dir))
            .with_context(|| format!("opening transform cache under '{}'", cfg.project.cache_dir))?;

        let mut registry = TaskRegistry::new();

        // Every pipeline is runnable under its own name.
        for (name, pc) in cfg.pipeline.iter() {
            let matcher = SourceMatcher::new(&root, &pc.src, &pc.exclude)
                .with_context(|| format!("compiling source globs for pipeline '{name}'"))?;

            let mut steps: Vec<Arc<dyn TransformStep>> = Vec::with_capacity(pc.steps.len());
            for sc in &pc.steps {
                let step = build_step(sc, &toolchain, &cache, &root).with_context(|| {
                    format!("building step '{}' of pipeline '{name}'", sc.kind())
                })?;
                steps.push(step);
            }

            let non_idempotent: Vec<&str> = steps
                .iter()
                .filter(|step| !step.idempotent())
                .map(|step| step.name())
                .collect();
            if !non_idempotent.is_empty() {
                debug!(
                    pipeline = %name,
                    steps = ?non_idempotent,
                    "pipeline contains non-idempotent steps"
                );
            }

            let dests = pc.dest.iter().map(|d| root.join(d)).collect();
            let pipeline = Arc::new(Pipeline::new(name.clone(), matcher, steps, dests));
            registry.register(name.clone(), TaskUnit::Pipeline(pipeline))?;
        }

        for (name, tc) in cfg.task.iter() {
            let unit = if let Some(pipeline) = &tc.pipeline {
                // Alias: a one-element series over the named pipeline.
                TaskUnit::Series(vec![pipeline.clone()])
            } else if let Some(series) = &tc.series {
                TaskUnit::Series(series.clone())
            } else if let Some(parallel) = &tc.parallel {
                TaskUnit::Parallel(parallel.clone())
            } else {
                return Err(anyhow!(
                    "task '{name}' binds none of `pipeline`, `series`, `parallel`"
                ));
            };
            registry.register(name.clone(), unit)?;
        }

        let bindings = cfg
            .watch
            .iter()
            .map(|w| WatchBinding {
                globs: w.glob.clone(),
                task: w.task.clone(),
            })
            .collect();

        Ok(Self {
            root,
            registry: Arc::new(registry),
            bindings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Resolve and execute a named task.
    pub async fn execute(&self, task: &str) -> Result<(), TaskError> {
        graph::execute(Arc::clone(&self.registry), task).await
    }
}

fn build_step(
    sc: &StepConfig,
    toolchain: &Toolchain,
    cache: &TransformCache,
    root: &Path,
) -> Result<Arc<dyn TransformStep>> {
    let step: Arc<dyn TransformStep> = match sc {
        StepConfig::CompileStyle { line_ending } => Arc::new(StyleCompileStep::new(
            Arc::clone(&toolchain.style),
            *line_ending,
        )),
        StepConfig::MinifyCss => Arc::new(CssMinifyStep),
        StepConfig::MinifySvg { precision } => Arc::new(SvgMinifyStep::new(*precision)?),
        StepConfig::ValidateHtml => Arc::new(HtmlValidateStep),
        StepConfig::Rename { suffix } => Arc::new(RenameStep::new(suffix.as_str())),
        StepConfig::Concat { output } => Arc::new(ConcatStep::new(output.as_str())),
        StepConfig::Replace {
            pattern,
            replacement,
        } => Arc::new(ReplaceStep::new(pattern, replacement.as_str())?),
        StepConfig::ReencodeImage {
            quality,
            interlaced,
            format,
        } => Arc::new(ImageReencodeStep::new(
            Arc::clone(&toolchain.image),
            ReencodeOptions {
                quality: *quality,
                interlaced: *interlaced,
                format: *format,
            },
            cache.clone(),
            root.to_path_buf(),
        )),
    };
    Ok(step)
}
