//! Line-oriented human narration of a progress scan.

use std::io::Write;

use crate::engine::trace::{ScanEvent, TraceSink};
use crate::model::process_label;

/// Writes one or two readable lines per scan event. Write errors are ignored.
pub struct TextTrace<W: Write> {
    out: W,
}

impl<W: Write> TextTrace<W> {
    /// Narrate into `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Hand back the writer, e.g. to inspect captured text.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for TextTrace<W> {
    fn record(&mut self, event: &ScanEvent) {
        let _ = render(&mut self.out, event);
    }
}

fn render(out: &mut impl Write, event: &ScanEvent) -> std::io::Result<()> {
    match event {
        ScanEvent::ScanStarted {
            processes,
            resource_types,
            work,
        } => writeln!(
            out,
            "=== scan start: {processes} processes, {resource_types} resource types, available {work}"
        ),
        ScanEvent::RoundStarted {
            round,
            work,
            finish,
        } => {
            let done: Vec<String> = finish
                .iter()
                .enumerate()
                .filter(|&(_, &done)| done)
                .map(|(process, _)| process_label(process))
                .collect();
            writeln!(out, "round {round}: work {work}, finished [{}]", done.join(", "))
        }
        ScanEvent::ProcessChecked {
            process,
            demand,
            work,
            satisfiable,
            ..
        } => writeln!(
            out,
            "  {}: demand {demand} <= work {work}? {}",
            process_label(*process),
            if *satisfiable { "yes" } else { "no" }
        ),
        ScanEvent::ProcessCompleted {
            process,
            released,
            work,
            ..
        } => writeln!(
            out,
            "  >>> {} completes, releases {released}, work now {work}",
            process_label(*process)
        ),
        ScanEvent::NoProgress { round } => {
            writeln!(out, "round {round}: no satisfiable process, fixed point reached")
        }
        ScanEvent::ScanFinished {
            rounds,
            finished,
            processes,
        } => writeln!(
            out,
            "=== scan finished after {rounds} rounds: {finished}/{processes} processes finished"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detector::DeadlockDetector;
    use crate::model::matrix::{ResourceMatrix, ResourceVector};

    #[test]
    fn narrates_a_deadlocked_scan() {
        let allocation = ResourceMatrix::from_rows(vec![vec![1, 0], vec![0, 1]]).unwrap();
        let request = ResourceMatrix::from_rows(vec![vec![0, 1], vec![1, 0]]).unwrap();
        let mut trace = TextTrace::new(Vec::new());
        let report = DeadlockDetector::with_trace(&mut trace)
            .detect(&request, &allocation, &ResourceVector::from([0, 0]))
            .unwrap();
        assert_eq!(report.deadlocked, vec![0, 1]);

        let text = String::from_utf8(trace.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "=== scan start: 2 processes, 2 resource types, available [0, 0]",
                "round 1: work [0, 0], finished []",
                "  P1: demand [0, 1] <= work [0, 0]? no",
                "  P2: demand [1, 0] <= work [0, 0]? no",
                "round 1: no satisfiable process, fixed point reached",
                "=== scan finished after 1 rounds: 0/2 processes finished",
            ]
        );
    }

    #[test]
    fn completion_lines_use_one_based_labels() {
        let mut out = Vec::new();
        render(
            &mut out,
            &ScanEvent::ProcessCompleted {
                round: 1,
                process: 1,
                released: ResourceVector::from([1, 0, 0]),
                work: ResourceVector::from([1, 0, 0]),
            },
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  >>> P2 completes, releases [1, 0, 0], work now [1, 0, 0]\n"
        );
    }
}
