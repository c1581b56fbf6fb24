//! Deadlock detection over outstanding requests.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::Result;
use crate::engine::scan::ProgressScanEngine;
use crate::engine::trace::TraceSink;
use crate::model::matrix::{ResourceMatrix, ResourceVector};
use crate::model::resources;

/// Outcome of a deadlock detection run. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlockReport {
    /// Processes that can never obtain their outstanding request, ascending.
    pub deadlocked: Vec<usize>,
    /// Processes that could complete, in the order the scan completed them.
    pub completion_order: Vec<usize>,
    /// Availability once every completable process has released its holdings.
    pub final_work: ResourceVector,
}

impl DeadlockReport {
    #[must_use]
    pub fn is_deadlock_free(&self) -> bool {
        self.deadlocked.is_empty()
    }
}

/// Reports processes left unfinished when the progress scan is fed the request matrix.
#[derive(Default)]
pub struct DeadlockDetector<'t> {
    engine: ProgressScanEngine<'t>,
}

impl<'t> DeadlockDetector<'t> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: ProgressScanEngine::new(),
        }
    }

    #[must_use]
    pub fn with_trace(trace: &'t mut dyn TraceSink) -> Self {
        Self {
            engine: ProgressScanEngine::with_trace(trace),
        }
    }

    pub fn detect(
        &mut self,
        request: &ResourceMatrix,
        allocation: &ResourceMatrix,
        available: &ResourceVector,
    ) -> Result<DeadlockReport> {
        let outcome = self.engine.scan(request, allocation, available)?;
        Ok(DeadlockReport {
            deadlocked: outcome.unfinished(),
            completion_order: outcome.order,
            final_work: outcome.work,
        })
    }

    /// Like [`Self::detect`], deriving availability from total capacity per resource type.
    pub fn detect_from_graph(
        &mut self,
        resource_nodes: &ResourceVector,
        request: &ResourceMatrix,
        allocation: &ResourceMatrix,
    ) -> Result<DeadlockReport> {
        let available = resources::available_from_graph(resource_nodes, allocation)?;
        self.detect(request, allocation, &available)
    }
}

/// One-shot detection without tracing.
pub fn detect_deadlock(
    request: &ResourceMatrix,
    allocation: &ResourceMatrix,
    available: &ResourceVector,
) -> Result<DeadlockReport> {
    DeadlockDetector::new().detect(request, allocation, available)
}
