//! Per-dispatch counters shared by every job task of one `dispatch` call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::progress::ProgressReporter;

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Jobs created.
    pub jobs: usize,
    /// Jobs whose pacing delay elapsed and whose request was started.
    pub launched: usize,
    /// Jobs that produced an outcome.
    pub finished: usize,
}

impl CounterSnapshot {
    pub fn pending(&self) -> usize {
        self.launched.saturating_sub(self.finished)
    }
}

/// Launch/settle bookkeeping for one dispatch.
///
/// `launched` and `finished` change only while `tick_lock` is held, and the
/// reporter is called under the same lock, so every tick sees a consistent
/// pending count and ticks never interleave.
pub(crate) struct DispatchContext {
    jobs: AtomicUsize,
    launched: AtomicUsize,
    finished: AtomicUsize,
    tick_lock: Mutex<()>,
    reporter: Arc<dyn ProgressReporter>,
}

impl DispatchContext {
    pub(crate) fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            jobs: AtomicUsize::new(0),
            launched: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            tick_lock: Mutex::new(()),
            reporter,
        }
    }

    pub(crate) fn init_progress(&self, total: usize) {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.reporter.init(total);
    }

    /// A job was created; returns the new job count.
    pub(crate) fn job_created(&self) -> usize {
        self.jobs.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// A job's delay elapsed and it is about to send. Emits a delta-0 tick.
    pub(crate) fn job_launched(&self) {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let launched = self.launched.fetch_add(1, Ordering::SeqCst) + 1;
        let finished = self.finished.load(Ordering::SeqCst);
        self.reporter.tick(0, launched.saturating_sub(finished));
    }

    /// A job produced its outcome. Emits a delta-1 tick.
    pub(crate) fn job_finished(&self) {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let finished = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
        let launched = self.launched.load(Ordering::SeqCst);
        self.reporter.tick(1, launched.saturating_sub(finished));
    }

    pub(crate) fn snapshot(&self) -> CounterSnapshot {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        CounterSnapshot {
            jobs: self.jobs.load(Ordering::SeqCst),
            launched: self.launched.load(Ordering::SeqCst),
            finished: self.finished.load(Ordering::SeqCst),
        }
    }
}
