// src/transform/image.rs

//! Image re-encoding behind a collaborator codec, with cached outputs.
//!
//! Re-encoding is the one transform expensive enough to cache: results are
//! stored on disk keyed by (absolute source path, content, options), so an
//! unchanged image costs one hash instead of one encode on every rebuild.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cache::TransformCache;
use crate::errors::{TransformCause, TransformError};
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Target format for conversion; `None` keeps the source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Options handed to the codec; also part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReencodeOptions {
    pub quality: u8,
    pub interlaced: bool,
    pub format: Option<ImageFormat>,
}

impl ReencodeOptions {
    /// Stable configuration fingerprint for cache keying. Any change here
    /// invalidates previously cached outputs, which is the point.
    pub fn fingerprint(&self) -> String {
        let format = self.format.map(|f| f.extension()).unwrap_or("keep");
        format!(
            "reencode-image;quality={};interlaced={};format={}",
            self.quality, self.interlaced, format
        )
    }
}

/// External collaborator: re-encodes image bytes, possibly converting the
/// format. Implementations must be pure with respect to (input, options).
pub trait ImageCodec: Send + Sync {
    fn reencode(&self, input: &[u8], opts: &ReencodeOptions) -> Result<Vec<u8>, String>;
}

/// Built-in codec: emits the input unchanged. Real optimization or format
/// conversion plugs in through [`ImageCodec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCodec;

impl ImageCodec for PassthroughCodec {
    fn reencode(&self, input: &[u8], _opts: &ReencodeOptions) -> Result<Vec<u8>, String> {
        Ok(input.to_vec())
    }
}

pub struct ImageReencodeStep {
    codec: Arc<dyn ImageCodec>,
    opts: ReencodeOptions,
    cache: TransformCache,
    source_root: PathBuf,
}

impl ImageReencodeStep {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        opts: ReencodeOptions,
        cache: TransformCache,
        source_root: PathBuf,
    ) -> Self {
        Self {
            codec,
            opts,
            cache,
            source_root,
        }
    }
}

impl TransformStep for ImageReencodeStep {
    fn name(&self) -> &'static str {
        "reencode-image"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        let fingerprint = self.opts.fingerprint();

        files
            .into_iter()
            .map(|file| {
                let source_path = self.source_root.join(file.rel_path());
                let key = TransformCache::key(&source_path, file.contents(), &fingerprint);

                let encoded = match self.cache.lookup(&key).map_err(|err| {
                    TransformError::new(self.name(), &source_path, TransformCause::Io(err))
                })? {
                    Some(bytes) => bytes,
                    None => {
                        debug!(path = %file.rel_path().display(), "cache miss; re-encoding");
                        let bytes = self
                            .codec
                            .reencode(file.contents(), &self.opts)
                            .map_err(|message| {
                                TransformError::new(
                                    self.name(),
                                    &source_path,
                                    TransformCause::Invalid(message),
                                )
                            })?;
                        self.cache.store(&key, &bytes).map_err(|err| {
                            TransformError::new(
                                self.name(),
                                &source_path,
                                TransformCause::Io(err),
                            )
                        })?;
                        bytes
                    }
                };

                let record = file.with_contents(encoded);
                Ok(match self.opts.format {
                    Some(format) => record.with_extension(format.extension()),
                    None => record,
                })
            })
            .collect()
    }
}
