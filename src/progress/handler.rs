//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a paper is being analyzed
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { input: String },

    /// Pipeline phase started
    PhaseStarted { phase: String },

    /// Pipeline phase completed
    PhaseComplete { phase: String, duration: Duration },

    /// Reference-list block parsed (bibitem strategy)
    BlockParsed {
        index: usize,
        total: usize,
        references: usize,
    },

    /// One bibliography entry finished analysis
    EntryAnalyzed {
        key: String,
        completed: usize,
        total: usize,
        cache_hit: bool,
        success: bool,
    },

    /// Run completed successfully
    Completed {
        entries: usize,
        failed: usize,
        total_time: Duration,
    },

    /// Run failed
    Failed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::Started {
            input: "paper.tar.gz".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            input: "paper".to_string(),
        });
        handler.on_progress(&ProgressEvent::EntryAnalyzed {
            key: "a2020".to_string(),
            completed: 1,
            total: 2,
            cache_hit: false,
            success: true,
        });
        handler.on_progress(&ProgressEvent::Completed {
            entries: 2,
            failed: 0,
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::PhaseStarted {
            phase: "assemble".to_string(),
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("PhaseStarted"));
        assert!(debug_str.contains("assemble"));
    }
}
