//! CLI bootstrap - the composition root.
//!
//! Loads settings and opens the history database. Command handlers receive
//! the composed [`CliContext`]; the queue itself is built per `get` run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use vidfetch_core::ports::HistoryRepositoryPort;
use vidfetch_core::{Settings, database_path, load_settings, settings_path};
use vidfetch_db::{SqliteHistoryRepository, setup_database};

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Where the settings were loaded from.
    pub settings_path: PathBuf,
    /// Settings as loaded at startup.
    pub settings: Settings,
    /// Download history store.
    pub history: Arc<dyn HistoryRepositoryPort>,
}

impl CliContext {
    /// Access the history store.
    pub fn history(&self) -> &Arc<dyn HistoryRepositoryPort> {
        &self.history
    }
}

/// Bootstrap the CLI application.
///
/// Creates the data root, the settings file and the database on first run.
pub async fn bootstrap() -> Result<CliContext> {
    let settings_path = settings_path()?;
    let settings = load_settings(&settings_path)?;

    let db_path = database_path()?;
    let pool = setup_database(&db_path)
        .await
        .with_context(|| format!("Failed to open history database {}", db_path.display()))?;

    tracing::debug!(
        settings = %settings_path.display(),
        database = %db_path.display(),
        "CLI bootstrapped"
    );

    Ok(CliContext {
        settings_path,
        settings,
        history: Arc::new(SqliteHistoryRepository::new(pool)),
    })
}
