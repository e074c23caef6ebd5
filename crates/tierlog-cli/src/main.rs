use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::warn;

use tierlog::{LogLevel, Logger, LoggerConfig, LoggerStats, OverflowPolicy};

mod config;

use config::ProjectConfig;

#[derive(Parser, Debug)]
#[command(
    name = "tierlog",
    about = "Write events to tiered audit logs (app, errors, fatal)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Minimum level written to the log files
    #[arg(long, value_enum, global = true)]
    min_level: Option<LevelChoice>,

    /// Name shown in file headers instead of the file path
    #[arg(long, global = true)]
    name: Option<String>,

    /// Write a session marker into log files that already exist
    #[arg(long, global = true, overrides_with = "no_new_session")]
    new_session: bool,

    /// Never write a session marker, even if tierlog.toml enables it
    #[arg(long, global = true, overrides_with = "new_session")]
    no_new_session: bool,

    /// Directory for app.log, errors.log and fatal.log (default: ./logs)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Queue capacity between callers and the writer thread
    #[arg(long, global = true)]
    capacity: Option<usize>,

    /// Drop events instead of waiting when the queue is full
    #[arg(long, global = true)]
    drop_when_full: bool,

    /// Show the logger's own diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log one message at every level, then shut down
    Demo,
    /// Log each line read from stdin until EOF or Ctrl+C
    Pipe {
        /// Level for every line
        #[arg(short, long, value_enum, default_value = "info")]
        level: LevelChoice,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelChoice {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl From<LevelChoice> for LogLevel {
    fn from(choice: LevelChoice) -> Self {
        match choice {
            LevelChoice::Debug => LogLevel::Debug,
            LevelChoice::Info => LogLevel::Info,
            LevelChoice::Warning => LogLevel::Warning,
            LevelChoice::Error => LogLevel::Error,
            LevelChoice::Fatal => LogLevel::Fatal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tierlog::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let config = resolve_config(&cli, &working_dir)?;

    let logger = Logger::new(config).context("Failed to start logger")?;

    match &cli.command {
        Command::Demo => run_demo(&logger),
        Command::Pipe { level } => run_pipe(&logger, (*level).into())?,
    }

    let stats = logger.shutdown();
    print_stats(&stats);

    if matches!(cli.command, Command::Demo) {
        println!("Done.");
    }
    Ok(())
}

/// Defaults, then `tierlog.toml`, then command-line flags.
fn resolve_config(cli: &Cli, working_dir: &Path) -> Result<LoggerConfig> {
    let mut config = LoggerConfig::default();
    if let Some(file) = ProjectConfig::load(working_dir)? {
        config = file.apply(config);
    }

    if let Some(level) = cli.min_level {
        config.min_level = level.into();
    }
    if let Some(ref name) = cli.name {
        config.name = Some(name.clone());
    }
    if cli.new_session {
        config.new_session_on_existing_file = true;
    } else if cli.no_new_session {
        config.new_session_on_existing_file = false;
    }
    if let Some(ref dir) = cli.log_dir {
        config.log_dir = if dir.is_absolute() {
            dir.clone()
        } else {
            working_dir.join(dir)
        };
    }
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if cli.drop_when_full {
        config.overflow = OverflowPolicy::DropNewest;
    }
    Ok(config)
}

fn run_demo(logger: &Logger) {
    logger.debug("Debug message.");
    logger.info("Info message.");
    logger.warning("Warning message.");
    logger.error("Error message.");
    logger.fatal("Fatal message.");
}

fn run_pipe(logger: &Logger, level: LogLevel) -> Result<()> {
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let interrupt_tx = done_tx.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Writing queued events...");
        let _ = interrupt_tx.send(());
    })
    .context("Failed to set Ctrl+C handler")?;

    let handle = logger.handle();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => handle.log(level, line),
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
            let _ = done_tx.send(());
        })
        .context("Failed to spawn stdin reader")?;

    // Either EOF or Ctrl+C; the reader is left detached on interrupt.
    let _ = done_rx.recv();
    Ok(())
}

fn print_stats(stats: &LoggerStats) {
    let written = format!("{} written", stats.written);
    let written = if stats.written == stats.enqueued {
        written.bright_green()
    } else {
        written.bright_yellow()
    };

    eprintln!(
        "{} {} of {} queued",
        "tierlog:".dimmed(),
        written,
        stats.enqueued
    );
    if stats.dropped > 0 {
        eprintln!(
            "{} {}",
            "tierlog:".dimmed(),
            format!("{} dropped", stats.dropped).bright_yellow()
        );
    }
    if stats.io_errors > 0 {
        eprintln!(
            "{} {}",
            "tierlog:".dimmed(),
            format!("{} I/O errors (see diagnostics above)", stats.io_errors).bright_red()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(config::CONFIG_FILE_NAME),
            "min_level = \"error\"\nname = \"FromFile\"\ncapacity = 10\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "tierlog",
            "--min-level",
            "warning",
            "--log-dir",
            "out",
            "--drop-when-full",
            "demo",
        ]);
        let config = resolve_config(&cli, dir.path()).unwrap();

        assert_eq!(config.min_level, LogLevel::Warning);
        assert_eq!(config.name.as_deref(), Some("FromFile"));
        assert_eq!(config.capacity, 10);
        assert_eq!(config.log_dir, dir.path().join("out"));
        assert_eq!(config.overflow, OverflowPolicy::DropNewest);
    }

    #[test]
    fn test_no_new_session_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(config::CONFIG_FILE_NAME),
            "new_session_on_existing_file = true\n",
        )
        .unwrap();

        let cli = Cli::parse_from(["tierlog", "demo"]);
        assert!(resolve_config(&cli, dir.path()).unwrap().new_session_on_existing_file);

        let cli = Cli::parse_from(["tierlog", "--no-new-session", "demo"]);
        assert!(!resolve_config(&cli, dir.path()).unwrap().new_session_on_existing_file);

        // The last of the two flags wins.
        let cli = Cli::parse_from(["tierlog", "--no-new-session", "--new-session", "demo"]);
        assert!(resolve_config(&cli, dir.path()).unwrap().new_session_on_existing_file);
    }

    #[test]
    fn test_pipe_level_parses() {
        let cli = Cli::parse_from(["tierlog", "pipe", "--level", "fatal"]);
        match cli.command {
            Command::Pipe { level } => assert_eq!(LogLevel::from(level), LogLevel::Fatal),
            Command::Demo => panic!("expected pipe"),
        }
    }

    #[test]
    fn test_demo_scenario_writes_all_tiers() {
        let dir = TempDir::new().unwrap();
        let logger = Logger::builder()
            .min_level(LogLevel::Warning)
            .name("Test")
            .new_session_on_existing_file(true)
            .log_dir(dir.path())
            .build()
            .unwrap();

        run_demo(&logger);
        let stats = logger.shutdown();

        assert_eq!(stats.written, 3);
        let fatal = std::fs::read_to_string(dir.path().join("fatal.log")).unwrap();
        assert!(fatal.starts_with("REAL TIME AUDIT: Test (fatal errors)\n"));
        assert!(fatal.trim_end().ends_with("[Fatal] Fatal message."));
    }
}
