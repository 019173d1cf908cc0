//! `history` handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{format_history_row, history_header};

/// List recent downloads, or those matching `search`.
pub async fn execute(ctx: &CliContext, limit: u32, search: Option<&str>) -> Result<()> {
    let entries = match search {
        Some(query) => ctx.history().search(query, limit).await?,
        None => ctx.history().recent(limit).await?,
    };

    if entries.is_empty() {
        match search {
            Some(query) => println!("No downloads matching \"{query}\"."),
            None => println!("No downloads recorded yet."),
        }
        return Ok(());
    }

    println!("{}", history_header());
    for entry in &entries {
        println!("{}", format_history_row(entry));
    }
    Ok(())
}
