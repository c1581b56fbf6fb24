//! Observer hook for the progress scan.
//!
//! The engine narrates every round through a [`TraceSink`] without depending on
//! how (or whether) the narration is rendered. See `logger::text` and
//! `logger::jsonl` for the shipped renderers.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::model::matrix::ResourceVector;

/// One step of a progress scan. Process indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    ScanStarted {
        processes: usize,
        resource_types: usize,
        work: ResourceVector,
    },
    RoundStarted {
        round: usize,
        work: ResourceVector,
        finish: Vec<bool>,
    },
    ProcessChecked {
        round: usize,
        process: usize,
        demand: ResourceVector,
        work: ResourceVector,
        satisfiable: bool,
    },
    ProcessCompleted {
        round: usize,
        process: usize,
        released: ResourceVector,
        work: ResourceVector,
    },
    NoProgress {
        round: usize,
    },
    ScanFinished {
        rounds: usize,
        finished: usize,
        processes: usize,
    },
}

/// Receives scan events in the order they happen.
pub trait TraceSink {
    fn record(&mut self, event: &ScanEvent);
}

/// Keeps every event in memory.
impl TraceSink for Vec<ScanEvent> {
    fn record(&mut self, event: &ScanEvent) {
        self.push(event.clone());
    }
}

/// Forwards each event to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn record(&mut self, event: &ScanEvent) {
        self.0.record(event);
        self.1.record(event);
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn record(&mut self, event: &ScanEvent) {
        (**self).record(event);
    }
}

impl<T: TraceSink> TraceSink for Option<T> {
    fn record(&mut self, event: &ScanEvent) {
        if let Some(sink) = self {
            sink.record(event);
        }
    }
}
