//! Limits and cancellation for a running build.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::config::BuildConfig;
use crate::error::{InspectError, Result};

/// Cooperative cancellation flag shared with a running build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arm the token so later builds run to completion.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Per-frame limit checks for one build.
pub(crate) struct BuildBudget<'c> {
    start: Instant,
    max_duration: Duration,
    check_interval: usize,
    max_nodes: usize,
    frames: usize,
    cancel: Option<&'c CancelToken>,
}

impl<'c> BuildBudget<'c> {
    pub(crate) fn new(config: &BuildConfig, cancel: Option<&'c CancelToken>) -> Self {
        Self {
            start: Instant::now(),
            max_duration: Duration::from_secs(config.max_time_seconds),
            check_interval: config.check_interval.max(1),
            max_nodes: config.max_nodes,
            frames: 0,
            cancel,
        }
    }

    /// Called before each node is created; `nodes` is the current tree size.
    pub(crate) fn check(&mut self, nodes: usize) -> Result<()> {
        self.frames += 1;

        if nodes >= self.max_nodes {
            warn!(limit = self.max_nodes, "Structure tree node limit reached");
            return Err(InspectError::ResourceExhausted {
                resource: "structure nodes".to_string(),
                used: nodes + 1,
                limit: self.max_nodes,
            });
        }

        // Only look at the clock and the token every N frames
        if self.frames % self.check_interval == 0 {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                warn!(nodes, "Structure build cancelled");
                return Err(InspectError::Cancelled { nodes });
            }

            let elapsed = self.start.elapsed();
            if elapsed > self.max_duration {
                error!(
                    nodes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Structure build timed out"
                );
                return Err(InspectError::Timeout {
                    seconds: elapsed.as_secs(),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
