//! Download engine adapters.
//!
//! - `ytdlp`: runs the `yt-dlp` executable as a subprocess
//! - `protocol`: parses its JSON progress lines

mod protocol;
mod ytdlp;

pub use protocol::{EngineLine, PROGRESS_MARKER, ProtocolError, parse_line};
pub use ytdlp::{DEFAULT_PROGRAM, YtDlpEngine};
