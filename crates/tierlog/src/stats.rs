use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters for a logger.
///
/// After a clean shutdown with no I/O failures, `written == enqueued`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Events accepted into the queue.
    pub enqueued: u64,
    /// Events refused by the queue (closed, or full under `DropNewest`).
    pub dropped: u64,
    /// Events written to every tier they route to.
    pub written: u64,
    /// Failed directory, open, write or flush operations.
    pub io_errors: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    written: AtomicU64,
    io_errors: AtomicU64,
}

impl Counters {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_io_error(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LoggerStats {
        LoggerStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
        }
    }
}
