//! JSONL trace writer: append-only line-delimited JSON, one object per scan event.
//!
//! Each line is a self-contained JSON object assembled in memory and written
//! with a single `write_all`, so a concurrent `tail -f` never sees half a line.
//!
//! Three-level fallback chain:
//! 1. Primary file path
//! 2. Fallback path
//! 3. stderr with `[DLA-JSONL]` prefix
//!
//! and finally silent discard: a broken trace file never fails an analysis.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::trace::{ScanEvent, TraceSink};

/// A single JSONL line: timestamp, run label, then the flattened event.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord<'a> {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Which analysis produced the event (e.g. `detect:graph-deadlock`).
    pub run: &'a str,
    #[serde(flatten)]
    pub event: &'a ScanEvent,
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
}

/// Append-only JSONL trace writer with fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    run: String,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    lines_written: u64,
}

impl JsonlWriter {
    /// Open the trace file. Falls through the degradation chain on failure.
    pub fn open(config: JsonlConfig, run: impl Into<String>) -> Self {
        let mut w = Self {
            config,
            run: run.into(),
            writer: None,
            state: WriterState::Discard,
            lines_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// Write one event as one JSONL line.
    pub fn write_event(&mut self, event: &ScanEvent) {
        let record = TraceRecord {
            ts: format_utc_now(),
            run: &self.run,
            event,
        };
        let line = match serde_json::to_string(&record) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[DLA-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line); // retry at next level
                        return;
                    }
                    self.lines_written += 1;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[DLA-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
            }
            Err(_) => self.try_open_fallback(),
        }
    }

    fn try_open_fallback(&mut self) {
        if let Some(fb) = &self.config.fallback_path
            && let Ok(file) = open_append(fb)
        {
            let _ = writeln!(
                io::stderr(),
                "[DLA-JSONL] primary path failed, using fallback: {}",
                fb.display()
            );
            self.writer = Some(BufWriter::new(file));
            self.state = WriterState::Fallback;
            return;
        }
        self.writer = None;
        self.state = WriterState::Stderr;
        let _ = writeln!(
            io::stderr(),
            "[DLA-JSONL] no writable trace path, using stderr"
        );
    }

    fn degrade(&mut self) {
        match self.state {
            WriterState::Normal => self.try_open_fallback(),
            WriterState::Fallback => {
                self.writer = None;
                self.state = WriterState::Stderr;
            }
            WriterState::Stderr | WriterState::Discard => self.state = WriterState::Discard,
        }
    }
}

impl TraceSink for JsonlWriter {
    fn record(&mut self, event: &ScanEvent) {
        self.write_event(event);
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
