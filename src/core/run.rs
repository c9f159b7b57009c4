// pixkit/src/core/run.rs
use super::{ImageToolError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Hands out increasing run ids so a long multi-item job can notice that a
/// newer job has started and stop early. Cancellation is cooperative: a job
/// only stops between items.
#[derive(Debug, Default)]
pub struct RunTracker {
    current: AtomicU64,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RunId {
        RunId(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, run: RunId) -> bool {
        self.current.load(Ordering::SeqCst) == run.0
    }

    pub fn ensure_current(&self, run: RunId) -> Result<()> {
        if self.is_current(run) {
            Ok(())
        } else {
            log::debug!("Run {} superseded, stopping", run.0);
            Err(ImageToolError::Superseded(run.0))
        }
    }
}
