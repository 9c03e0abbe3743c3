// src/transform/mod.rs

//! File transform steps.
//!
//! A step is a pure `files -> files'` conversion with a declared capability
//! tag. The simple text transforms are built in; style compilation and
//! image re-encoding delegate to collaborator traits ([`style::StyleCompiler`],
//! [`image::ImageCodec`]) whose internals live outside this crate.

pub mod concat;
pub mod html;
pub mod image;
pub mod minify;
pub mod rename;
pub mod replace;
pub mod style;

pub use concat::ConcatStep;
pub use html::HtmlValidateStep;
pub use image::{ImageCodec, ImageFormat, ImageReencodeStep, PassthroughCodec, ReencodeOptions};
pub use minify::{CssMinifyStep, SvgMinifyStep};
pub use rename::RenameStep;
pub use replace::ReplaceStep;
pub use style::{LineEnding, PlainStyleCompiler, StyleCompileStep, StyleCompiler};

use crate::errors::TransformError;
use crate::pipeline::FileRecord;

/// A single input -> output file conversion.
///
/// Steps are stateless and side-effect-free apart from cache consultation.
/// Each call consumes the full output set of the previous step and produces
/// a new set; inputs are never mutated in place, and one file's failure
/// aborts the call before any sibling's output can be flushed downstream.
pub trait TransformStep: Send + Sync {
    /// Capability tag, used in config and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether re-running this step on its own output is safe. Steps bound
    /// into watch-triggered rebuilds must be idempotent.
    fn idempotent(&self) -> bool;

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError>;
}
