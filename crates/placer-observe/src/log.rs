//! Append-only event log.
//!
//! One line per event: `<YYMMDDTHHMMSS> <LEVEL>: <message>`. The file is
//! opened per append so the log survives descriptor shuffling during
//! daemonization and can be shared by the short-lived `start`/`stop`
//! processes. Appends are serialized behind a mutex; a write failure is
//! reported through tracing rather than failing the caller's request.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Severity prefix carried on each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Error => "ERROR",
        };
        f.write_str(s)
    }
}

enum Sink {
    File(PathBuf),
    Memory(Vec<String>),
}

/// Shared handle to the event log. Cheap to clone.
#[derive(Clone)]
pub struct EventLog {
    sink: Arc<Mutex<Sink>>,
}

impl EventLog {
    /// Open (or create) the log file at `path`. The file is touched once so
    /// an unwritable path fails here instead of on the first event.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        open_append(&path)?;
        Ok(Self {
            sink: Arc::new(Mutex::new(Sink::File(path))),
        })
    }

    /// In-memory log capturing lines for assertions in tests.
    pub fn in_memory() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Memory(Vec::new()))),
        }
    }

    /// Append one event line.
    pub fn append(&self, level: Level, message: &str) {
        let line = format!("{} {level}: {message}", timestamp());
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &mut *sink {
            Sink::File(path) => {
                if let Err(e) = write_line(path, &line) {
                    tracing::warn!(path = %path.display(), error = %e, "event log append failed");
                }
            }
            Sink::Memory(lines) => lines.push(line),
        }
    }

    /// Lines captured by an in-memory log. File-backed logs return an empty
    /// vec; read the file instead.
    pub fn lines(&self) -> Vec<String> {
        let sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &*sink {
            Sink::File(_) => Vec::new(),
            Sink::Memory(lines) => lines.clone(),
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%y%m%dT%H%M%S").to_string()
}

fn open_append(path: &Path) -> io::Result<std::fs::File> {
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

fn write_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = open_append(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_captures_lines() {
        let log = EventLog::in_memory();
        log.append(Level::Info, "service starting");
        log.append(Level::Error, "something broke");

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO: service starting"));
        assert!(lines[1].contains("ERROR: something broke"));
    }

    #[test]
    fn line_format_has_timestamp_prefix() {
        let log = EventLog::in_memory();
        log.append(Level::Debug, "got body");

        let line = &log.lines()[0];
        // <YYMMDDTHHMMSS> <LEVEL>: <message>
        let (ts, rest) = line.split_once(' ').unwrap();
        assert_eq!(ts.len(), 13);
        assert_eq!(ts.as_bytes()[6], b'T');
        assert!(ts.chars().filter(|c| *c != 'T').all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "DEBUG: got body");
    }

    #[test]
    fn file_log_appends_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");

        let log = EventLog::open(&path).unwrap();
        log.append(Level::Info, "first");

        // A second handle (separate open) appends, never truncates.
        let log2 = EventLog::open(&path).unwrap();
        log2.append(Level::Info, "second");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO: first"));
        assert!(lines[1].ends_with("INFO: second"));
    }

    #[test]
    fn open_fails_for_unwritable_path() {
        assert!(EventLog::open("/definitely/not/a/dir/log").is_err());
    }
}
