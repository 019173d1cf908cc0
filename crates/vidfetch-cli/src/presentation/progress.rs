//! Per-job progress bars for `vidfetch get`.
//!
//! Terminal output uses one indicatif bar per job. When stdout is not a
//! terminal the bars are hidden and a line is printed per finished job.

use std::collections::HashMap;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use vidfetch_core::{JobId, JobStatus, QueueEvent};

use super::tables::truncate_string;

const LABEL_WIDTH: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Waiting,
    Determinate,
    Indeterminate,
}

struct JobBar {
    bar: ProgressBar,
    url: String,
    mode: Mode,
}

/// Renders queue events as progress bars.
pub struct JobDisplay {
    multi: MultiProgress,
    jobs: HashMap<JobId, JobBar>,
    interactive: bool,
}

impl JobDisplay {
    /// Create a display, auto-detecting terminal capability.
    pub fn new() -> Self {
        Self::with_interactive(io::stdout().is_terminal())
    }

    fn with_interactive(interactive: bool) -> Self {
        let target = if interactive {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            jobs: HashMap::new(),
            interactive,
        }
    }

    /// Update the display for one event.
    pub fn apply(&mut self, event: &QueueEvent) {
        match event {
            QueueEvent::JobAdded { id, url } => {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(waiting_style());
                bar.set_prefix(truncate_string(url, LABEL_WIDTH));
                bar.set_message("queued");
                self.jobs.insert(
                    *id,
                    JobBar {
                        bar,
                        url: url.clone(),
                        mode: Mode::Waiting,
                    },
                );
            }
            QueueEvent::JobUpdated {
                id,
                status,
                percent,
                ..
            } => {
                let Some(job) = self.jobs.get_mut(id) else {
                    return;
                };
                // Anything above 100 means the total size is unknown.
                let mode = if *percent <= 100 {
                    Mode::Determinate
                } else {
                    Mode::Indeterminate
                };
                if job.mode != mode {
                    match mode {
                        Mode::Indeterminate => {
                            job.bar.set_style(spinner_style());
                            job.bar.enable_steady_tick(Duration::from_millis(120));
                        }
                        _ => job.bar.set_style(bar_style()),
                    }
                    job.mode = mode;
                }
                if mode == Mode::Determinate {
                    job.bar.set_position(*percent);
                }
                job.bar.set_message(status.clone());
            }
            QueueEvent::JobCompleted { id } => {
                let Some(job) = self.jobs.get(id) else {
                    return;
                };
                job.bar.set_style(bar_style());
                job.bar.set_position(100);
                job.bar.finish_with_message("✓ done");
                if !self.interactive {
                    println!("✓ {}", job.url);
                }
            }
            QueueEvent::JobFailed {
                id,
                status,
                message,
            } => {
                let Some(job) = self.jobs.get(id) else {
                    return;
                };
                let line = if *status == JobStatus::Cancelled {
                    "⊘ cancelled".to_string()
                } else {
                    format!("✗ {message}")
                };
                job.bar.set_style(waiting_style());
                job.bar.abandon_with_message(line.clone());
                if !self.interactive {
                    println!("{line}: {}", job.url);
                }
            }
        }
    }

    /// Print a line above the bars.
    pub fn note(&self, message: &str) {
        if self.interactive {
            let _ = self.multi.println(message);
        } else {
            println!("{message}");
        }
    }
}

impl Default for JobDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn style(template: &str, fallback: fn() -> ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| fallback())
}

fn waiting_style() -> ProgressStyle {
    style("{prefix:40} {msg}", ProgressStyle::default_bar)
}

fn bar_style() -> ProgressStyle {
    style(
        "{prefix:40} {bar:30.cyan/blue} {pos:>3}% {msg}",
        ProgressStyle::default_bar,
    )
}

fn spinner_style() -> ProgressStyle {
    style("{prefix:40} {spinner} {msg}", ProgressStyle::default_spinner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_job_lifecycle() {
        let mut display = JobDisplay::with_interactive(false);
        let id = JobId::new();

        display.apply(&QueueEvent::added(id, "https://example.com/v"));
        display.apply(&QueueEvent::updated(id, "downloading", 40, serde_json::Value::Null));
        assert!(display.jobs[&id].mode == Mode::Determinate);
        assert_eq!(display.jobs[&id].bar.position(), 40);

        display.apply(&QueueEvent::updated(id, "downloading", 4_000, serde_json::Value::Null));
        assert!(display.jobs[&id].mode == Mode::Indeterminate);

        display.apply(&QueueEvent::completed(id));
        assert!(display.jobs[&id].bar.is_finished());
    }

    #[test]
    fn test_events_for_unknown_jobs_are_ignored() {
        let mut display = JobDisplay::with_interactive(false);
        let id = JobId::new();
        display.apply(&QueueEvent::updated(id, "downloading", 10, serde_json::Value::Null));
        display.apply(&QueueEvent::failed(id, JobStatus::Error, "boom"));
        assert!(display.jobs.is_empty());
    }
}
