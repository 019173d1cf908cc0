//! Table formatting for CLI output.

use chrono::Local;
use vidfetch_core::HistoryEntry;

const TITLE_WIDTH: usize = 60;

/// Truncates a string to at most `max_len` characters, ending in "..." if cut.
///
/// ```rust
/// use vidfetch_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Column header matching [`format_history_row`].
pub fn history_header() -> String {
    format!("{:>6}  {:<11}  {:<16}  {}", "ID", "STATUS", "CREATED", "TITLE")
}

/// One history row. The URL is shown when no better title is known.
pub fn format_history_row(entry: &HistoryEntry) -> String {
    format!(
        "{:>6}  {:<11}  {:<16}  {}",
        entry.id.0,
        entry.status.as_str(),
        entry
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M"),
        truncate_string(&entry.title, TITLE_WIDTH)
    )
}
