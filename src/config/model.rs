// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::transform::image::ImageFormat;
use crate::transform::style::LineEnding;

/// Top-level build description as read from `Pipeforge.toml`.
///
/// ```toml
/// [pipeline.styles]
/// src = ["sass/*.scss"]
/// dest = ["dist/css"]
///
/// [[pipeline.styles.step]]
/// kind = "compile-style"
/// line_ending = "crlf"
///
/// [task.build]
/// series = ["html", "styles"]
///
/// [[watch]]
/// glob = ["sass/**/*.scss"]
/// task = "styles"
/// ```
///
/// All sections are optional in the parser; `validate` enforces the
/// semantic rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Global project settings from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// All pipelines from `[pipeline.<name>]`, keyed by pipeline name.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,

    /// All composite tasks from `[task.<name>]`, keyed by task name.
    /// Pipelines are also runnable under their own names; these sections
    /// add aliases and series/parallel compositions on top.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch bindings from `[[watch]]`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Root directory all source globs, destinations and watch patterns
    /// are resolved against, relative to the config file's directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// Directory holding the transform cache, relative to `root`.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_cache_dir() -> String {
    crate::cache::DEFAULT_CACHE_DIR.to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// `[pipeline.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Source globs, evaluated as a set (order does not matter).
    pub src: Vec<String>,

    /// Globs excluded from the source set.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Ordered transform chain. An empty chain is a plain copy.
    #[serde(default, rename = "step")]
    pub steps: Vec<StepConfig>,

    /// Destination roots; the final file set is written under every one,
    /// preserving relative path structure.
    pub dest: Vec<String>,
}

/// One `[[pipeline.<name>.step]]` record: `kind` selects the transform,
/// the remaining keys are that transform's options.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepConfig {
    CompileStyle {
        #[serde(default)]
        line_ending: LineEnding,
    },
    MinifyCss,
    MinifySvg {
        #[serde(default = "default_svg_precision")]
        precision: usize,
    },
    ValidateHtml,
    Rename {
        suffix: String,
    },
    Concat {
        output: String,
    },
    Replace {
        pattern: String,
        replacement: String,
    },
    ReencodeImage {
        #[serde(default = "default_quality")]
        quality: u8,
        #[serde(default)]
        interlaced: bool,
        #[serde(default)]
        format: Option<ImageFormat>,
    },
}

fn default_svg_precision() -> usize {
    2
}

fn default_quality() -> u8 {
    80
}

impl StepConfig {
    /// Capability tag as written in config.
    pub fn kind(&self) -> &'static str {
        match self {
            StepConfig::CompileStyle { .. } => "compile-style",
            StepConfig::MinifyCss => "minify-css",
            StepConfig::MinifySvg { .. } => "minify-svg",
            StepConfig::ValidateHtml => "validate-html",
            StepConfig::Rename { .. } => "rename",
            StepConfig::Concat { .. } => "concat",
            StepConfig::Replace { .. } => "replace",
            StepConfig::ReencodeImage { .. } => "reencode-image",
        }
    }
}

/// `[task.<name>]` section. Exactly one of the three bindings must be set;
/// `validate` enforces this.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Alias for a single pipeline.
    #[serde(default)]
    pub pipeline: Option<String>,

    /// Members executed strictly left to right, each completing before the
    /// next starts.
    #[serde(default)]
    pub series: Option<Vec<String>>,

    /// Members started together; the task completes when all complete.
    #[serde(default)]
    pub parallel: Option<Vec<String>>,
}

/// One `[[watch]]` binding.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Globs relative to the project root.
    pub glob: Vec<String>,

    /// Task to re-run when a matching path changes.
    pub task: String,
}
