use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("no stream with video dimensions found")]
    NoVideoStream,
    #[error("remux failed: {0}")]
    Remux(String),
}

/// Aspect-ratio bucket a probed video falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// Bucket a width/height pair. Integer division on purpose: it tolerates
    /// near-standard sizes within a 16- or 9-pixel band (1920x1080 and
    /// 1926x1080 both land in `Landscape`, 1918x1080 does not).
    pub fn classify(width: i64, height: i64) -> Self {
        if width / 16 == height / 9 {
            AspectClass::Landscape
        } else if width / 9 == height / 16 {
            AspectClass::Portrait
        } else {
            AspectClass::Other
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }

    pub fn ratio_label(self) -> &'static str {
        match self {
            AspectClass::Landscape => "16:9",
            AspectClass::Portrait => "9:16",
            AspectClass::Other => "other",
        }
    }
}

/// Build the object-store key for an upload: category prefix, URL-safe
/// unpadded base64 of the random block, literal `.mp4`.
pub fn derive_object_key(class: AspectClass, rand_block: &[u8; 32]) -> String {
    format!(
        "{}/{}.mp4",
        class.key_prefix(),
        URL_SAFE_NO_PAD.encode(rand_block)
    )
}

/// External media tooling used by the ingestion pipeline. The real
/// implementation shells out to ffprobe/ffmpeg; tests inject canned behavior.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Classify the aspect ratio of the first video stream in the file.
    async fn probe_aspect(&self, path: &Path) -> Result<AspectClass, MediaError>;

    /// Produce a copy of the file with streaming metadata relocated to the
    /// front, returning the new file's path. The input is left untouched.
    async fn remux_faststart(&self, input: &Path) -> Result<PathBuf, MediaError>;
}
