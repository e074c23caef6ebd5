use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use crate::error::LogError;
use crate::event::LogEvent;
use crate::format::format_line;
use crate::queue::BoundedQueue;
use crate::sink::{Tier, TieredSink};
use crate::stats::Counters;

/// Lifecycle of the writer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, thread not yet running.
    Idle,
    /// Blocking on the queue and writing events.
    Running,
    /// Shutdown requested; writing whatever is still buffered.
    Draining,
    /// All handles flushed and released.
    Closed,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::Draining,
            _ => WorkerState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Running => 1,
            WorkerState::Draining => 2,
            WorkerState::Closed => 3,
        }
    }
}

/// State shared between producers, the writer thread and the owning logger.
pub(crate) struct Shared {
    pub(crate) queue: BoundedQueue<LogEvent>,
    pub(crate) cancel: AtomicBool,
    pub(crate) counters: Counters,
    state: AtomicU8,
}

impl Shared {
    pub(crate) fn new(queue: BoundedQueue<LogEvent>) -> Self {
        Self {
            queue,
            cancel: AtomicBool::new(false),
            counters: Counters::default(),
            state: AtomicU8::new(WorkerState::Idle.as_u8()),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        debug!(?state, "Writer state changed");
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

/// Where and how the writer thread lays out its files.
pub(crate) struct SinkSettings {
    pub(crate) log_dir: PathBuf,
    pub(crate) name: Option<String>,
    pub(crate) new_session_on_existing_file: bool,
}

/// Single consumer of the event queue; sole owner of the tier files.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    settings: SinkSettings,
}

impl Worker {
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        settings: SinkSettings,
    ) -> std::io::Result<JoinHandle<()>> {
        let worker = Self { shared, settings };
        thread::Builder::new()
            .name("tierlog-writer".to_string())
            .spawn(move || worker.run())
    }

    fn run(self) {
        self.shared.set_state(WorkerState::Running);

        // Pre-existence must be sampled before anything below opens the files.
        let mut sink = TieredSink::new(
            &self.settings.log_dir,
            self.settings.name.clone(),
            self.settings.new_session_on_existing_file,
        );
        for tier in Tier::ALL {
            if let Err(e) = sink.ensure_open(tier) {
                self.report(&e);
            }
        }

        while !self.shared.cancel.load(Ordering::Acquire) {
            match self.shared.queue.pop() {
                Some(event) => self.process(&mut sink, &event),
                None => break,
            }
        }

        self.shared.set_state(WorkerState::Draining);
        while let Some(event) = self.shared.queue.try_pop() {
            self.process(&mut sink, &event);
        }

        for e in sink.close() {
            self.report(&e);
        }
        self.shared.set_state(WorkerState::Closed);
    }

    fn process(&self, sink: &mut TieredSink, event: &LogEvent) {
        let local = event.timestamp.with_timezone(&Local);
        let line = format_line(&local, event.level, &event.message);

        let mut ok = true;
        for tier in Tier::for_level(event.level) {
            if let Err(e) = sink.write(tier, &local, &line) {
                self.report(&e);
                ok = false;
            }
        }
        if ok {
            self.shared.counters.record_written();
        }
    }

    fn report(&self, err: &LogError) {
        self.shared.counters.record_io_error();
        error!(error = %err, "Log writer I/O failure");
    }
}
