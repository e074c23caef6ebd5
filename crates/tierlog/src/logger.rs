use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::LogError;
use crate::event::LogEvent;
use crate::level::LogLevel;
use crate::queue::{BoundedQueue, OverflowPolicy};
use crate::stats::LoggerStats;
use crate::worker::{Shared, SinkSettings, Worker, WorkerState};

/// Default number of events buffered between producers and the writer.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default directory for the tier files, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Settings fixed for the lifetime of a [`Logger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Events below this level are discarded at the call site.
    pub min_level: LogLevel,
    /// Label used in headers instead of the file path.
    pub name: Option<String>,
    /// Write a session marker into files that already exist.
    pub new_session_on_existing_file: bool,
    /// Directory holding `app.log`, `errors.log` and `fatal.log`.
    pub log_dir: PathBuf,
    /// Queue capacity; must be non-zero.
    pub capacity: usize,
    /// Behaviour when the queue is full.
    pub overflow: OverflowPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            name: None,
            new_session_on_existing_file: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::default(),
        }
    }
}

/// Builder for [`Logger`].
#[derive(Debug, Clone, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.min_level = level;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn new_session_on_existing_file(mut self, enabled: bool) -> Self {
        self.config.new_session_on_existing_file = enabled;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow = policy;
        self
    }

    pub fn build(self) -> Result<Logger, LogError> {
        Logger::new(self.config)
    }
}

/// Cheap, cloneable producer side of a [`Logger`].
///
/// Handles may outlive the logger; once it has shut down, their events are
/// refused and reported instead of written.
#[derive(Clone)]
pub struct LogHandle {
    shared: Arc<Shared>,
    min_level: LogLevel,
}

impl LogHandle {
    /// Queue `message` at `level`. Never fails from the caller's point of view.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if level < self.min_level {
            return;
        }

        let event = LogEvent::new(level, message);
        match self.shared.queue.push(event) {
            Ok(()) => self.shared.counters.record_enqueued(),
            Err(e) => {
                self.shared.counters.record_dropped();
                let err = LogError::from(e);
                warn!(error = %err, %level, "Dropping log event");
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Current writer state; stays observable after the logger shuts down.
    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }
}

/// Tiered file logger backed by a dedicated writer thread.
///
/// Construct one at the top of the program and hand out [`LogHandle`]s.
/// Configuration is fixed at construction. Dropping the logger performs the
/// same graceful shutdown as [`Logger::shutdown`].
pub struct Logger {
    handle: LogHandle,
    worker: Option<JoinHandle<()>>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Validate `config` and start the writer thread.
    pub fn new(config: LoggerConfig) -> Result<Self, LogError> {
        if config.capacity == 0 {
            return Err(LogError::InvalidConfig(
                "queue capacity must be greater than zero".to_string(),
            ));
        }

        let shared = Arc::new(Shared::new(BoundedQueue::new(
            config.capacity,
            config.overflow,
        )));
        let settings = SinkSettings {
            log_dir: config.log_dir,
            name: config.name,
            new_session_on_existing_file: config.new_session_on_existing_file,
        };
        let worker = Worker::spawn(Arc::clone(&shared), settings).map_err(LogError::SpawnFailed)?;

        debug!(min_level = %config.min_level, capacity = config.capacity, "Logger started");
        Ok(Self {
            handle: LogHandle {
                shared,
                min_level: config.min_level,
            },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.handle.log(level, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.handle.debug(message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.handle.info(message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.handle.warning(message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.handle.error(message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.handle.fatal(message);
    }

    pub fn state(&self) -> WorkerState {
        self.handle.state()
    }

    pub fn stats(&self) -> LoggerStats {
        self.handle.shared.counters.snapshot()
    }

    /// Stop accepting events, write everything already queued, release files.
    ///
    /// Returns the final counters once the writer thread has exited.
    pub fn shutdown(mut self) -> LoggerStats {
        self.stop();
        self.stats()
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let shared = &self.handle.shared;
        // Close before cancelling so no push can land after the final drain.
        shared.queue.close();
        shared.cancel.store(true, Ordering::Release);

        if worker.join().is_err() {
            let err = LogError::WorkerPanicked;
            error!(error = %err, "Log writer did not shut down cleanly");
        }
        shared.set_state(WorkerState::Closed);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.stop();
    }
}
