//! Config command handler.

use anyhow::{Result, bail};
use vidfetch_core::{Settings, SettingsUpdate, save_settings};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;

/// Execute the config command.
pub fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("Settings file: {}", ctx.settings_path.display());
            print_settings(&ctx.settings);
            Ok(())
        }
        ConfigCommand::Set {
            download_dir,
            parallel_downloads,
            quality,
            audio_only,
            subs,
            thumbnail,
            ytdlp_path,
            clear_ytdlp_path,
        } => {
            let update = SettingsUpdate {
                download_dir: download_dir.map(Some),
                parallel_downloads: parallel_downloads.map(Some),
                default_quality: quality.map(Some),
                audio_only: audio_only.map(Some),
                write_subtitles: subs.map(Some),
                write_thumbnail: thumbnail.map(Some),
                ytdlp_path: if clear_ytdlp_path {
                    Some(None)
                } else {
                    ytdlp_path.map(Some)
                },
            };
            let settings = apply_update(ctx, &update)?;
            println!("✓ Settings saved to {}", ctx.settings_path.display());
            print_settings(&settings);
            Ok(())
        }
    }
}

/// Merge `update` into the loaded settings and persist the result.
fn apply_update(ctx: &CliContext, update: &SettingsUpdate) -> Result<Settings> {
    if update.is_empty() {
        bail!("Nothing to change. See `vidfetch config set --help`.");
    }
    let mut settings = ctx.settings.clone();
    settings.merge(update);
    save_settings(&ctx.settings_path, &settings)?;
    Ok(settings)
}

fn print_settings(settings: &Settings) {
    let flag = |value: Option<bool>| if value.unwrap_or(false) { "yes" } else { "no" };

    println!(
        "  download_dir:       {}",
        settings.effective_download_dir().display()
    );
    println!(
        "  parallel_downloads: {}",
        settings.effective_parallel_downloads()
    );
    println!("  default_quality:    {}", settings.effective_quality());
    println!("  audio_only:         {}", flag(settings.audio_only));
    println!("  write_subtitles:    {}", flag(settings.write_subtitles));
    println!("  write_thumbnail:    {}", flag(settings.write_thumbnail));
    println!(
        "  ytdlp_path:         {}",
        settings.ytdlp_path.as_deref().unwrap_or("yt-dlp (from PATH)")
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use vidfetch_core::load_settings;
    use vidfetch_core::ports::NoopHistoryRepository;

    fn context(dir: &tempfile::TempDir) -> CliContext {
        let settings_path = dir.path().join("settings.json");
        let settings = load_settings(&settings_path).unwrap();
        CliContext {
            settings_path,
            settings,
            history: Arc::new(NoopHistoryRepository::new()),
        }
    }

    #[test]
    fn test_set_persists_changes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let update = SettingsUpdate {
            parallel_downloads: Some(Some(4)),
            ytdlp_path: Some(Some("/opt/yt-dlp".to_string())),
            ..Default::default()
        };
        let saved = apply_update(&ctx, &update).unwrap();
        assert_eq!(saved.parallel_downloads, Some(4));

        let reloaded = load_settings(&ctx.settings_path).unwrap();
        assert_eq!(reloaded, saved);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let update = SettingsUpdate {
            parallel_downloads: Some(Some(0)),
            ..Default::default()
        };
        assert!(apply_update(&ctx, &update).is_err());
        assert_eq!(
            load_settings(&ctx.settings_path).unwrap().parallel_downloads,
            ctx.settings.parallel_downloads
        );
    }

    #[test]
    fn test_set_without_changes_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        assert!(apply_update(&ctx, &SettingsUpdate::default()).is_err());
    }
}
