//! Core download identifiers and job options.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a submitted job.
///
/// Assigned at submission and stable for the job's lifetime. Every queue
/// event and every cancellation request is keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for JobId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Identifier of a history record returned by the persistence port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Options passed through, untouched, to the download engine.
///
/// The queue never interprets these; only the engine adapter does.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Directory the engine writes into. `None` means the working directory.
    pub out_dir: Option<PathBuf>,
    /// Preferred quality label (e.g. `1080p`).
    pub quality: Option<String>,
    /// Explicit engine format selector; overrides `quality`.
    pub format: Option<String>,
    /// Extract audio only (mp3) via the engine's post-processor.
    pub audio_only: bool,
    /// Write subtitles, including automatic captions.
    pub write_subtitles: bool,
    /// Write the thumbnail image next to the media file.
    pub write_thumbnail: bool,
    /// Extra engine arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl JobOptions {
    /// Options writing into the given directory.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: Some(out_dir.into()),
            ..Default::default()
        }
    }

    /// Set the preferred quality.
    #[must_use]
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Set an explicit format selector.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Toggle audio-only extraction.
    #[must_use]
    pub const fn with_audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    /// Toggle subtitle download.
    #[must_use]
    pub const fn with_subtitles(mut self, subtitles: bool) -> Self {
        self.write_subtitles = subtitles;
        self
    }

    /// Toggle thumbnail download.
    #[must_use]
    pub const fn with_thumbnail(mut self, thumbnail: bool) -> Self {
        self.write_thumbnail = thumbnail;
        self
    }

    /// Append an extra engine argument.
    #[must_use]
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}
