//! `yt-dlp` subprocess engine.
//!
//! Runs `yt-dlp` with a JSON progress template, streams its stdout line by
//! line into the progress hook, and maps the exit status to an `EngineError`.
//! The child is killed when the hook fails or the job token is cancelled.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use vidfetch_core::{DownloadEnginePort, EngineError, EngineRequest, JobOptions, ProgressHook};

use super::protocol::{EngineLine, PROGRESS_MARKER, parse_line};

/// Executable looked up on `PATH` by default.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Output file name template, relative to the output directory.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Longest stderr excerpt carried in an error message.
const MAX_ERROR_CHARS: usize = 2000;

/// Engine adapter driving the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: PathBuf,
    /// Arguments placed before the generated ones (e.g. `-m yt_dlp` for `python3`).
    leading_args: Vec<OsString>,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl YtDlpEngine {
    /// Use the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Insert arguments between the program and the generated arguments.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build the argument list for one download (excluding leading args).
    pub fn build_args(url: &str, options: &JobOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--newline".into(),
            "--no-colors".into(),
            "--quiet".into(),
            "--progress".into(),
            "--progress-template".into(),
            format!("download:{PROGRESS_MARKER} %(progress)j").into(),
        ];

        if let Some(dir) = &options.out_dir {
            args.push("--paths".into());
            args.push(dir.clone().into_os_string());
        }
        args.push("--output".into());
        args.push(OUTPUT_TEMPLATE.into());

        if let Some(format) = format_selector(options) {
            args.push("--format".into());
            args.push(format.into());
        }

        if options.audio_only {
            args.extend(
                ["--extract-audio", "--audio-format", "mp3", "--audio-quality", "192K"]
                    .map(OsString::from),
            );
        }

        if options.write_subtitles {
            args.extend(
                ["--write-subs", "--write-auto-subs", "--sub-langs", "en.*,en"]
                    .map(OsString::from),
            );
        }

        if options.write_thumbnail {
            args.push("--write-thumbnail".into());
        }

        args.extend(options.extra_args.iter().map(OsString::from));

        // Everything after `--` is a URL, even if it starts with a dash.
        args.push("--".into());
        args.push(url.into());
        args
    }

    async fn run_process(
        &self,
        request: EngineRequest<'_>,
        on_progress: &mut ProgressHook<'_>,
    ) -> Result<(), EngineError> {
        let program = self.program.display().to_string();

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(Self::build_args(request.url, request.options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::spawn(&program, e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::other("Missing stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::other("Missing stderr"))?;

        let mut lines = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr);
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_reader.read_to_end(&mut buf).await;
            buf
        });

        loop {
            tokio::select! {
                biased;

                () = request.cancel.cancelled() => {
                    let _ = child.kill().await;
                    return Err(EngineError::Cancelled);
                }

                line = lines.next_line() => {
                    let line = line.map_err(|e| EngineError::from_io_error(&e))?;
                    let Some(line) = line else { break };

                    match parse_line(&line) {
                        Ok(EngineLine::Progress(record)) => {
                            if let Err(e) = on_progress(&record) {
                                let _ = child.kill().await;
                                return Err(e.into());
                            }
                        }
                        Ok(EngineLine::Message(message)) => {
                            if !message.is_empty() {
                                tracing::debug!(target: "vidfetch.engine", %message, "yt-dlp output");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(target: "vidfetch.engine", error = %e, %line, "Unparseable progress line");
                        }
                    }
                }
            }
        }

        let status = tokio::select! {
            biased;

            () = request.cancel.cancelled() => {
                let _ = child.kill().await;
                return Err(EngineError::Cancelled);
            }

            status = child.wait() => status.map_err(|e| EngineError::from_io_error(&e))?,
        };

        let stderr_buf = stderr_task.await.unwrap_or_default();
        let stderr_text = String::from_utf8_lossy(&stderr_buf);

        if status.success() {
            return Ok(());
        }

        let message = error_summary(&stderr_text)
            .unwrap_or_else(|| format!("{program} exited with {status}"));
        Err(EngineError::ProcessFailed {
            code: status.code(),
            message,
        })
    }
}

impl DownloadEnginePort for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn run(
        &self,
        request: EngineRequest<'_>,
        on_progress: &mut ProgressHook<'_>,
    ) -> Result<(), EngineError> {
        // Called on a blocking thread; a private runtime drives the child's pipes.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::from_io_error(&e))?;
        runtime.block_on(self.run_process(request, on_progress))
    }
}

/// Format selector for the job's options.
///
/// An explicit format wins; audio-only picks the best audio stream; a quality
/// label such as `1080p` caps the video height.
fn format_selector(options: &JobOptions) -> Option<String> {
    if let Some(format) = &options.format {
        return Some(format.clone());
    }
    if options.audio_only {
        return Some("bestaudio/best".to_string());
    }

    let quality = options.quality.as_deref()?.trim();
    let height: u32 = quality
        .strip_suffix(['p', 'P'])
        .unwrap_or(quality)
        .parse()
        .ok()?;
    Some(format!(
        "bestvideo[height<={height}]+bestaudio/best[height<={height}]"
    ))
}

/// Pick the `ERROR:` lines out of stderr, or fall back to its tail.
fn error_summary(stderr: &str) -> Option<String> {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    let summary = if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("\n")
    };

    if summary.is_empty() {
        return None;
    }

    let skip = summary.chars().count().saturating_sub(MAX_ERROR_CHARS);
    Some(summary.chars().skip(skip).collect())
}
