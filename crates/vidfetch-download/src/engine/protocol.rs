//! Progress line protocol for the `yt-dlp` adapter.
//!
//! The adapter asks `yt-dlp` to print one JSON object per progress tick,
//! prefixed with a marker so it can be told apart from ordinary output:
//!
//! ```text
//! [vidfetch] {"status": "downloading", "downloaded_bytes": 1024, "total_bytes": 4096, ...}
//! [vidfetch] {"status": "finished", "downloaded_bytes": 4096, "total_bytes": 4096, ...}
//! ```
//!
//! `total_bytes` is absent for some streams; `total_bytes_estimate` (a float)
//! is used instead. The whole object is kept as the record's raw payload.

use serde_json::Value;
use thiserror::Error;

use vidfetch_core::ProgressRecord;

/// Prefix of every progress line.
pub const PROGRESS_MARKER: &str = "[vidfetch]";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when parsing progress lines.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Progress payload is not a JSON object")]
    NotAnObject,

    #[error("Missing or invalid 'status' field")]
    InvalidStatus,
}

// ============================================================================
// Lines
// ============================================================================

/// One line of engine output.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLine {
    /// A progress record.
    Progress(ProgressRecord),
    /// Anything else the engine printed.
    Message(String),
}

/// Parse a single line of engine stdout.
///
/// Lines without the marker are returned as [`EngineLine::Message`]; marked
/// lines must carry a JSON object with a string `status`.
pub fn parse_line(line: &str) -> Result<EngineLine, ProtocolError> {
    let trimmed = line.trim();
    let Some(payload) = trimmed.strip_prefix(PROGRESS_MARKER) else {
        return Ok(EngineLine::Message(trimmed.to_string()));
    };

    let raw: Value = serde_json::from_str(payload.trim())?;
    let object = raw.as_object().ok_or(ProtocolError::NotAnObject)?;

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::InvalidStatus)?
        .to_string();

    let downloaded = object.get("downloaded_bytes").and_then(as_bytes);
    let total = object
        .get("total_bytes")
        .and_then(as_bytes)
        .or_else(|| object.get("total_bytes_estimate").and_then(as_bytes));

    Ok(EngineLine::Progress(
        ProgressRecord::new(status, downloaded, total).with_raw(raw),
    ))
}

/// Byte counts arrive as integers, floats, or `null`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_bytes(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

// ============================================================================
// Tests
// ============================================================================
