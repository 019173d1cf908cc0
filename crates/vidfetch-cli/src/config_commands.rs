//! `config` subcommands.

use clap::Subcommand;

/// Settings management.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings and where they are stored
    Show,

    /// Update one or more settings
    Set {
        /// Directory downloads are written into
        #[arg(long)]
        download_dir: Option<String>,
        /// Number of parallel downloads (1-16)
        #[arg(long)]
        parallel_downloads: Option<u32>,
        /// Default quality label
        #[arg(long)]
        quality: Option<String>,
        /// Extract audio only by default
        #[arg(long)]
        audio_only: Option<bool>,
        /// Download subtitles by default
        #[arg(long)]
        subs: Option<bool>,
        /// Download thumbnails by default
        #[arg(long)]
        thumbnail: Option<bool>,
        /// Path to the yt-dlp executable
        #[arg(long, conflicts_with = "clear_ytdlp_path")]
        ytdlp_path: Option<String>,
        /// Go back to looking up yt-dlp on PATH
        #[arg(long)]
        clear_ytdlp_path: bool,
    },
}
