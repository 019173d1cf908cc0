//! Root CLI parser and global options.

use clap::{ArgAction, Parser};

use crate::commands::Commands;

/// Download videos with `yt-dlp` through a concurrent queue.
#[derive(Parser)]
#[command(name = "vidfetch")]
#[command(about = "Download videos through a concurrent yt-dlp queue")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let quiet = Cli::parse_from(["vidfetch", "history"]);
        assert_eq!(quiet.log_level(), "warn");

        let info = Cli::parse_from(["vidfetch", "-v", "history"]);
        assert_eq!(info.log_level(), "info");

        let debug = Cli::parse_from(["vidfetch", "history", "-vv"]);
        assert_eq!(debug.log_level(), "debug");
    }
}
