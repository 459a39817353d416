//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { input } => {
                info!(input = %input, "Starting citation analysis");
            }
            ProgressEvent::PhaseStarted { phase } => {
                debug!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::BlockParsed {
                index,
                total,
                references,
            } => {
                debug!(
                    progress = format!("{}/{}", index, total),
                    references, "Reference block parsed"
                );
            }
            ProgressEvent::EntryAnalyzed {
                key,
                completed,
                total,
                cache_hit,
                success,
            } => {
                if *success {
                    info!(
                        key = %key,
                        progress = format!("{}/{}", completed, total),
                        cache_hit,
                        "Entry analyzed"
                    );
                } else {
                    warn!(
                        key = %key,
                        progress = format!("{}/{}", completed, total),
                        cache_hit,
                        "Entry analysis failed"
                    );
                }
            }
            ProgressEvent::Completed {
                entries,
                failed,
                total_time,
            } => {
                info!(
                    entries,
                    failed,
                    total_time_ms = total_time.as_millis(),
                    "Analysis complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Analysis failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::Started {
                input: "/paper".to_string(),
            },
            ProgressEvent::PhaseStarted {
                phase: "assemble".to_string(),
            },
            ProgressEvent::PhaseComplete {
                phase: "assemble".to_string(),
                duration: Duration::from_millis(12),
            },
            ProgressEvent::BlockParsed {
                index: 1,
                total: 3,
                references: 1,
            },
            ProgressEvent::EntryAnalyzed {
                key: "a2020".to_string(),
                completed: 1,
                total: 2,
                cache_hit: true,
                success: true,
            },
            ProgressEvent::EntryAnalyzed {
                key: "b2021".to_string(),
                completed: 2,
                total: 2,
                cache_hit: false,
                success: false,
            },
            ProgressEvent::Completed {
                entries: 2,
                failed: 1,
                total_time: Duration::from_secs(5),
            },
            ProgressEvent::Failed {
                error: "Test error".to_string(),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
