use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::LogError;
use crate::format::{audit_title, session_marker, FORMAT_DESCRIPTION};
use crate::level::LogLevel;

/// One of the three output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Every event at or above the minimum level.
    Main,
    /// Error and Fatal events.
    Error,
    /// Fatal events only.
    Fatal,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Main, Tier::Error, Tier::Fatal];

    pub fn file_name(self) -> &'static str {
        match self {
            Tier::Main => "app.log",
            Tier::Error => "errors.log",
            Tier::Fatal => "fatal.log",
        }
    }

    pub fn accepts(self, level: LogLevel) -> bool {
        match self {
            Tier::Main => true,
            Tier::Error => level >= LogLevel::Error,
            Tier::Fatal => level == LogLevel::Fatal,
        }
    }

    /// Tiers an event at `level` is written to, main first.
    pub fn for_level(level: LogLevel) -> impl Iterator<Item = Tier> {
        Self::ALL.into_iter().filter(move |tier| tier.accepts(level))
    }

    fn index(self) -> usize {
        match self {
            Tier::Main => 0,
            Tier::Error => 1,
            Tier::Fatal => 2,
        }
    }

    fn label_suffix(self) -> &'static str {
        match self {
            Tier::Main => "",
            Tier::Error => " (error)",
            Tier::Fatal => " (fatal errors)",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Tier::Main => "main",
            Tier::Error => "error",
            Tier::Fatal => "fatal",
        })
    }
}

/// Per-tier bookkeeping for the current run.
#[derive(Debug)]
struct TierFile {
    path: PathBuf,
    existed_before_session: bool,
    header_written: bool,
    header_lines_written: usize,
    writer: Option<BufWriter<File>>,
}

impl TierFile {
    fn new(path: PathBuf) -> Self {
        Self {
            existed_before_session: path.exists(),
            path,
            header_written: false,
            header_lines_written: 0,
            writer: None,
        }
    }
}

/// The three append-only tier files of one logger.
///
/// Owned by the writer thread; nothing else touches these files. Pre-existence
/// is sampled when the sink is created, so the sink must be created before
/// anything is written in this run.
pub struct TieredSink {
    files: [TierFile; 3],
    name: Option<String>,
    new_session_on_existing_file: bool,
}

impl TieredSink {
    pub fn new(log_dir: &Path, name: Option<String>, new_session_on_existing_file: bool) -> Self {
        let files = Tier::ALL.map(|tier| TierFile::new(log_dir.join(tier.file_name())));
        Self {
            files,
            name: name.filter(|n| !n.is_empty()),
            new_session_on_existing_file,
        }
    }

    pub fn path(&self, tier: Tier) -> &Path {
        &self.files[tier.index()].path
    }

    pub fn existed_before_session(&self, tier: Tier) -> bool {
        self.files[tier.index()].existed_before_session
    }

    pub fn header_written(&self, tier: Tier) -> bool {
        self.files[tier.index()].header_written
    }

    /// Create the parent directory and open the tier file for append.
    ///
    /// A no-op when the file is already open.
    pub fn ensure_open(&mut self, tier: Tier) -> Result<(), LogError> {
        let file = &mut self.files[tier.index()];
        if file.writer.is_some() {
            return Ok(());
        }

        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LogError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file.path)
            .map_err(|source| LogError::Open {
                path: file.path.clone(),
                source,
            })?;
        file.writer = Some(BufWriter::new(handle));
        Ok(())
    }

    /// Write the session marker or audit header the first time a tier is used.
    pub fn write_header_if_needed(
        &mut self,
        tier: Tier,
        timestamp: &DateTime<Local>,
    ) -> Result<(), LogError> {
        if self.header_written(tier) {
            return Ok(());
        }

        // Resume after the last line that landed so a retry never repeats the title.
        let lines = self.header_lines(tier, timestamp);
        let done = self.files[tier.index()].header_lines_written;
        for line in lines.iter().skip(done) {
            self.write_raw(tier, line)?;
            self.files[tier.index()].header_lines_written += 1;
        }
        self.files[tier.index()].header_written = true;
        Ok(())
    }

    fn header_lines(&self, tier: Tier, timestamp: &DateTime<Local>) -> Vec<String> {
        let file = &self.files[tier.index()];
        let path_label = file.path.display().to_string();

        if self.new_session_on_existing_file && file.existed_before_session {
            let label = self.name.as_deref().unwrap_or(&path_label);
            vec![session_marker(label, timestamp)]
        } else if !file.existed_before_session {
            let label = match &self.name {
                Some(name) => format!("{}{}", name, tier.label_suffix()),
                None => path_label,
            };
            vec![audit_title(&label), FORMAT_DESCRIPTION.to_string()]
        } else {
            Vec::new()
        }
    }

    /// Append one line and flush it to the OS.
    pub fn append_line(&mut self, tier: Tier, line: &str) -> Result<(), LogError> {
        self.write_raw(tier, line)
    }

    /// Header (if due) followed by `line`, opening the file first when needed.
    pub fn write(
        &mut self,
        tier: Tier,
        timestamp: &DateTime<Local>,
        line: &str,
    ) -> Result<(), LogError> {
        self.ensure_open(tier)?;
        self.write_header_if_needed(tier, timestamp)?;
        self.append_line(tier, line)
    }

    fn write_raw(&mut self, tier: Tier, line: &str) -> Result<(), LogError> {
        self.ensure_open(tier)?;
        let file = &mut self.files[tier.index()];
        let result = match file.writer.as_mut() {
            Some(writer) => writeln!(writer, "{}", line).and_then(|_| writer.flush()),
            None => Ok(()),
        };
        result.map_err(|source| {
            // Reopen on the next write rather than reuse a handle in an unknown state.
            file.writer = None;
            LogError::Write {
                path: file.path.clone(),
                source,
            }
        })
    }

    /// Flush and release every open handle, returning any flush failures.
    pub fn close(&mut self) -> Vec<LogError> {
        let mut errors = Vec::new();
        for file in &mut self.files {
            if let Some(mut writer) = file.writer.take() {
                if let Err(source) = writer.flush() {
                    errors.push(LogError::Write {
                        path: file.path.clone(),
                        source,
                    });
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read(dir: &TempDir, tier: Tier) -> String {
        fs::read_to_string(dir.path().join(tier.file_name())).unwrap_or_default()
    }

    #[test]
    fn test_routing() {
        let tiers = |level| Tier::for_level(level).collect::<Vec<_>>();
        assert_eq!(tiers(LogLevel::Debug), vec![Tier::Main]);
        assert_eq!(tiers(LogLevel::Warning), vec![Tier::Main]);
        assert_eq!(tiers(LogLevel::Error), vec![Tier::Main, Tier::Error]);
        assert_eq!(
            tiers(LogLevel::Fatal),
            vec![Tier::Main, Tier::Error, Tier::Fatal]
        );
    }

    #[test]
    fn test_fresh_file_gets_audit_header_once() {
        let dir = TempDir::new().unwrap();
        let mut sink = TieredSink::new(dir.path(), Some("Test".to_string()), true);
        let now = Local::now();

        assert!(!sink.existed_before_session(Tier::Error));
        sink.write(Tier::Error, &now, "first").unwrap();
        sink.write(Tier::Error, &now, "second").unwrap();
        sink.close();

        let lines: Vec<String> = read(&dir, Tier::Error).lines().map(String::from).collect();
        assert_eq!(
            lines,
            vec![
                "REAL TIME AUDIT: Test (error)".to_string(),
                FORMAT_DESCRIPTION.to_string(),
                "first".to_string(),
                "second".to_string(),
            ]
        );
    }

    #[test]
    fn test_unnamed_header_uses_path() {
        let dir = TempDir::new().unwrap();
        let mut sink = TieredSink::new(dir.path(), None, false);
        sink.write(Tier::Fatal, &Local::now(), "boom").unwrap();
        sink.close();

        let expected = format!(
            "REAL TIME AUDIT: {}",
            dir.path().join("fatal.log").display()
        );
        assert_eq!(read(&dir, Tier::Fatal).lines().next(), Some(expected.as_str()));
    }

    #[test]
    fn test_existing_file_gets_session_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.log"), "old line\n").unwrap();

        let mut sink = TieredSink::new(dir.path(), Some("Test".to_string()), true);
        assert!(sink.existed_before_session(Tier::Main));
        sink.write(Tier::Main, &Local::now(), "new line").unwrap();
        sink.write(Tier::Main, &Local::now(), "another").unwrap();
        sink.close();

        let content = read(&dir, Tier::Main);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "old line");
        assert!(lines[1].starts_with("--- NEW LOGGER SESSION: Test started at ["));
        assert!(lines[1].ends_with("] ---"));
        assert_eq!(lines[2], "new line");
        assert_eq!(lines[3], "another");
    }

    #[test]
    fn test_existing_file_without_flag_gets_no_header() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.log"), "old line\n").unwrap();

        let mut sink = TieredSink::new(dir.path(), Some("Test".to_string()), false);
        sink.write(Tier::Main, &Local::now(), "new line").unwrap();
        sink.close();

        assert_eq!(read(&dir, Tier::Main), "old line\nnew line\n");
        assert!(sink.header_written(Tier::Main));
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut sink = TieredSink::new(&nested, None, false);

        sink.ensure_open(Tier::Main).unwrap();
        assert!(nested.join("app.log").exists());
        assert!(!nested.join("errors.log").exists());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut sink = TieredSink::new(&blocker, None, false);
        let err = sink.write(Tier::Main, &Local::now(), "lost").unwrap_err();
        assert!(matches!(err, LogError::CreateDir { .. } | LogError::Open { .. }));
        assert!(!sink.header_written(Tier::Main));
    }

    #[test]
    fn test_interrupted_header_resumes_without_repeating_title() {
        let dir = TempDir::new().unwrap();
        let mut sink = TieredSink::new(dir.path(), Some("Test".to_string()), false);
        let now = Local::now();

        // Title landed, description did not.
        sink.append_line(Tier::Main, "REAL TIME AUDIT: Test").unwrap();
        sink.files[Tier::Main.index()].header_lines_written = 1;

        sink.write(Tier::Main, &now, "first").unwrap();
        sink.write(Tier::Main, &now, "second").unwrap();
        sink.close();

        let lines: Vec<String> = read(&dir, Tier::Main).lines().map(String::from).collect();
        assert_eq!(
            lines,
            vec![
                "REAL TIME AUDIT: Test".to_string(),
                FORMAT_DESCRIPTION.to_string(),
                "first".to_string(),
                "second".to_string(),
            ]
        );
    }
}
