//! # tierlog
//!
//! In-process logging to tiered audit files.
//!
//! Producers on any thread call [`LogHandle::log`]; events go through a bounded
//! queue to a single writer thread that appends them to up to three files in
//! the log directory.
//!
//! ## Key Types
//!
//! - [`Logger`] - Owns the writer thread; built with [`Logger::builder`]
//! - [`LogHandle`] - Cloneable producer handle
//! - [`LogLevel`] - `Debug < Info < Warning < Error < Fatal`
//! - [`BoundedQueue`] - The producer/consumer queue
//! - [`TieredSink`] - The three tier files and their headers
//!
//! ## Tiers
//!
//! - `app.log` - every event at or above the minimum level
//! - `errors.log` - Error and Fatal
//! - `fatal.log` - Fatal only
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tierlog::{LogLevel, Logger};
//!
//! let logger = Logger::builder()
//!     .min_level(LogLevel::Warning)
//!     .name("Test")
//!     .new_session_on_existing_file(true)
//!     .build()?;
//!
//! logger.warning("Warning message.");
//! logger.fatal("Fatal message.");
//! logger.shutdown();
//! ```
//!
//! Failures while logging never reach the caller. They are reported as
//! `tracing` events; [`init_tracing`] routes those to stderr.

mod error;
mod event;
mod format;
mod level;
mod logger;
mod queue;
mod sink;
mod stats;
mod worker;

pub use error::LogError;
pub use event::LogEvent;
pub use format::{format_line, FORMAT_DESCRIPTION, TIMESTAMP_FORMAT};
pub use level::LogLevel;
pub use logger::{LogHandle, Logger, LoggerBuilder, LoggerConfig, DEFAULT_CAPACITY, DEFAULT_LOG_DIR};
pub use queue::{BoundedQueue, OverflowPolicy, QueueError};
pub use sink::{Tier, TieredSink};
pub use stats::LoggerStats;
pub use worker::WorkerState;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the diagnostic stream: `tracing` output on stderr.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
