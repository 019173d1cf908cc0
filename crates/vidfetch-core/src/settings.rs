//! Settings domain types, validation and JSON persistence.
//!
//! Settings live in `settings.json` under the data root. A missing file is
//! created with defaults on first load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of parallel downloads.
pub const DEFAULT_PARALLEL_DOWNLOADS: u32 = 2;

/// Default quality label.
pub const DEFAULT_QUALITY: &str = "1080p";

/// Upper bound accepted for `parallel_downloads`.
pub const MAX_PARALLEL_DOWNLOADS: u32 = 16;

/// Application settings structure.
///
/// All fields are optional to support partial files and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory downloads are written into.
    pub download_dir: Option<String>,

    /// Number of jobs run at the same time (1-16).
    pub parallel_downloads: Option<u32>,

    /// Quality label used when a job does not specify one.
    pub default_quality: Option<String>,

    /// Extract audio only by default.
    pub audio_only: Option<bool>,

    /// Download subtitles by default.
    pub write_subtitles: Option<bool>,

    /// Download thumbnails by default.
    pub write_thumbnail: Option<bool>,

    /// Path to the `yt-dlp` executable; `PATH` lookup when unset.
    pub ytdlp_path: Option<String>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults(download_dir: impl Into<String>) -> Self {
        Self {
            download_dir: Some(download_dir.into()),
            parallel_downloads: Some(DEFAULT_PARALLEL_DOWNLOADS),
            default_quality: Some(DEFAULT_QUALITY.to_string()),
            audio_only: Some(false),
            write_subtitles: Some(false),
            write_thumbnail: Some(false),
            ytdlp_path: None,
        }
    }

    /// Get the effective concurrency (with default fallback).
    #[must_use]
    pub fn effective_parallel_downloads(&self) -> usize {
        self.parallel_downloads.unwrap_or(DEFAULT_PARALLEL_DOWNLOADS).max(1) as usize
    }

    /// Get the effective quality label (with default fallback).
    #[must_use]
    pub fn effective_quality(&self) -> &str {
        self.default_quality.as_deref().unwrap_or(DEFAULT_QUALITY)
    }

    /// Get the effective download directory (with `./downloads` fallback).
    #[must_use]
    pub fn effective_download_dir(&self) -> PathBuf {
        self.download_dir
            .as_ref()
            .map_or_else(|| PathBuf::from("downloads"), PathBuf::from)
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref dir) = other.download_dir {
            self.download_dir.clone_from(dir);
        }
        if let Some(parallel) = other.parallel_downloads {
            self.parallel_downloads = parallel;
        }
        if let Some(ref quality) = other.default_quality {
            self.default_quality.clone_from(quality);
        }
        if let Some(audio_only) = other.audio_only {
            self.audio_only = audio_only;
        }
        if let Some(subs) = other.write_subtitles {
            self.write_subtitles = subs;
        }
        if let Some(thumb) = other.write_thumbnail {
            self.write_thumbnail = thumb;
        }
        if let Some(ref path) = other.ytdlp_path {
            self.ytdlp_path.clone_from(path);
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = set field to None/null
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub download_dir: Option<Option<String>>,
    pub parallel_downloads: Option<Option<u32>>,
    pub default_quality: Option<Option<String>>,
    pub audio_only: Option<Option<bool>>,
    pub write_subtitles: Option<Option<bool>>,
    pub write_thumbnail: Option<Option<bool>>,
    pub ytdlp_path: Option<Option<String>>,
}

impl SettingsUpdate {
    /// Whether applying this update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.download_dir.is_none()
            && self.parallel_downloads.is_none()
            && self.default_quality.is_none()
            && self.audio_only.is_none()
            && self.write_subtitles.is_none()
            && self.write_thumbnail.is_none()
            && self.ytdlp_path.is_none()
    }
}

/// Settings validation and persistence error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Parallel downloads must be between 1 and {MAX_PARALLEL_DOWNLOADS}, got {0}")]
    InvalidParallelDownloads(u32),

    #[error("Download directory cannot be empty")]
    EmptyDownloadDir,

    #[error("Default quality cannot be empty")]
    EmptyQuality,

    #[error("Failed to access settings file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Settings file {path} is not valid JSON: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parallel) = settings.parallel_downloads {
        if !(1..=MAX_PARALLEL_DOWNLOADS).contains(&parallel) {
            return Err(SettingsError::InvalidParallelDownloads(parallel));
        }
    }

    if settings
        .download_dir
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyDownloadDir);
    }

    if settings
        .default_quality
        .as_ref()
        .is_some_and(|q| q.trim().is_empty())
    {
        return Err(SettingsError::EmptyQuality);
    }

    Ok(())
}

/// Load settings from `path`, writing defaults first if the file is missing.
///
/// The default download directory is `./downloads` relative to the current
/// working directory at the time of first load.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let settings = Settings::with_defaults(cwd.join("downloads").to_string_lossy());
        save_settings(path, &settings)?;
        tracing::info!(path = %path.display(), "Created default settings file");
        return Ok(settings);
    }

    let content = fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Validate and write settings as pretty JSON.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    validate_settings(settings)?;

    let io_err = |e: &dyn std::fmt::Display| SettingsError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(&e))?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| io_err(&e))?;
    fs::write(path, json).map_err(|e| io_err(&e))
}
