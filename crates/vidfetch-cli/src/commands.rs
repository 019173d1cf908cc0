//! Top-level subcommands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config_commands::ConfigCommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download one or more URLs
    Get {
        /// URLs to download
        urls: Vec<String>,
        /// Read additional URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Number of parallel downloads (defaults to the configured value)
        #[arg(short, long, env = "VIDFETCH_CONCURRENCY")]
        concurrency: Option<usize>,
        /// Output directory (defaults to the configured download directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Preferred quality, e.g. "720p" or "best"
        #[arg(short, long)]
        quality: Option<String>,
        /// Raw yt-dlp format selector; overrides --quality
        #[arg(long)]
        format: Option<String>,
        /// Extract audio only (mp3)
        #[arg(long)]
        audio_only: bool,
        /// Download subtitles
        #[arg(long)]
        subs: bool,
        /// Download the thumbnail
        #[arg(long)]
        thumbnail: bool,
        /// Don't record these downloads in the history
        #[arg(long)]
        no_history: bool,
    },

    /// Show past downloads
    History {
        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: u32,
        /// Only show entries whose title or URL contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}
