//! Progress scan: the fixed-point reduction shared by deadlock detection and
//! the Banker's safety check.
//!
//! Starting from `work = available`, each round walks the unfinished processes
//! in index order and commits the *first* one whose demand row fits in `work`:
//! it is marked finished, appended to the completion order, and its allocation
//! is released back into `work`. The next round restarts from index 0. The scan
//! stops when every process has finished or a full pass commits nothing.
//!
//! Committing one process per round fixes the completion order to "lowest
//! satisfiable index first", so the returned order is reproducible. `work` only
//! grows, and every round except a final stalled one finishes a process, so the
//! scan runs at most `P` rounds.

use serde::Serialize;

use crate::core::errors::Result;
use crate::engine::trace::{ScanEvent, TraceSink};
use crate::model::matrix::{ResourceMatrix, ResourceVector};

/// Result of a progress scan. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// `finish[i]` is true when process `i` could be simulated to completion.
    pub finish: Vec<bool>,
    /// Processes in the order they were marked finished.
    pub order: Vec<usize>,
    /// Working availability at the fixed point.
    pub work: ResourceVector,
    /// Rounds executed, including a final round that made no progress.
    pub rounds: usize,
}

impl ScanOutcome {
    /// True when no process is left blocked.
    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.finish.iter().all(|&done| done)
    }

    /// Processes left unfinished, ascending.
    #[must_use]
    pub fn unfinished(&self) -> Vec<usize> {
        self.finish
            .iter()
            .enumerate()
            .filter_map(|(process, &done)| (!done).then_some(process))
            .collect()
    }
}

/// Runs progress scans, optionally narrating each step to a [`TraceSink`].
#[derive(Default)]
pub struct ProgressScanEngine<'t> {
    trace: Option<&'t mut dyn TraceSink>,
}

impl<'t> ProgressScanEngine<'t> {
    /// Engine without narration.
    #[must_use]
    pub fn new() -> Self {
        Self { trace: None }
    }

    /// Engine that reports every round to `trace`.
    #[must_use]
    pub fn with_trace(trace: &'t mut dyn TraceSink) -> Self {
        Self { trace: Some(trace) }
    }

    /// Scan `demand` against `available`, releasing `allocation` rows as
    /// processes complete. The inputs are never mutated.
    ///
    /// Fails only with `DimensionMismatch`; once the shapes agree the scan
    /// always reaches a fixed point.
    pub fn scan(
        &mut self,
        demand: &ResourceMatrix,
        allocation: &ResourceMatrix,
        available: &ResourceVector,
    ) -> Result<ScanOutcome> {
        let processes = allocation.processes();
        let resource_types = available.len();
        allocation.ensure_shape(processes, resource_types, "allocation vs available")?;
        demand.ensure_shape(processes, resource_types, "demand vs allocation")?;
        Ok(self.run(demand, allocation, available))
    }

    fn run(
        &mut self,
        demand: &ResourceMatrix,
        allocation: &ResourceMatrix,
        available: &ResourceVector,
    ) -> ScanOutcome {
        let processes = allocation.processes();
        let mut work = available.clone();
        let mut finish = vec![false; processes];
        let mut order = Vec::with_capacity(processes);
        let mut rounds = 0;

        self.emit(|| ScanEvent::ScanStarted {
            processes,
            resource_types: available.len(),
            work: work.clone(),
        });

        while order.len() < processes {
            rounds += 1;
            self.emit(|| ScanEvent::RoundStarted {
                round: rounds,
                work: work.clone(),
                finish: finish.clone(),
            });

            let mut committed = None;
            for process in (0..processes).filter(|&p| !finish[p]) {
                let row = demand.row(process);
                let satisfiable = work.covers(row);
                self.emit(|| ScanEvent::ProcessChecked {
                    round: rounds,
                    process,
                    demand: ResourceVector::new(row.to_vec()),
                    work: work.clone(),
                    satisfiable,
                });
                if satisfiable {
                    committed = Some(process);
                    break;
                }
            }

            let Some(process) = committed else {
                self.emit(|| ScanEvent::NoProgress { round: rounds });
                break;
            };

            finish[process] = true;
            order.push(process);
            work.release(allocation.row(process));
            self.emit(|| ScanEvent::ProcessCompleted {
                round: rounds,
                process,
                released: ResourceVector::new(allocation.row(process).to_vec()),
                work: work.clone(),
            });
        }

        debug_assert!(rounds <= processes, "scan exceeded one round per process");
        self.emit(|| ScanEvent::ScanFinished {
            rounds,
            finished: order.len(),
            processes,
        });

        ScanOutcome {
            finish,
            order,
            work,
            rounds,
        }
    }

    fn emit(&mut self, event: impl FnOnce() -> ScanEvent) {
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.record(&event());
        }
    }
}
