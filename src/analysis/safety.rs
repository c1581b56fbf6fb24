//! Banker's safety check over declared maximum demand.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::Result;
use crate::engine::scan::ProgressScanEngine;
use crate::engine::trace::TraceSink;
use crate::model::matrix::{ResourceMatrix, ResourceVector};
use crate::model::resources;

/// Whether every process can reach its declared maximum in some order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SafetyVerdict {
    /// `sequence` is the witness completion order (0-based indices).
    Safe { sequence: Vec<usize> },
    /// `blocked` lists, ascending, the processes that could not finish. It is
    /// a set, not a partial schedule.
    Unsafe { blocked: Vec<usize> },
}

impl SafetyVerdict {
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe { .. })
    }

    #[must_use]
    pub fn safe_sequence(&self) -> Option<&[usize]> {
        match self {
            Self::Safe { sequence } => Some(sequence),
            Self::Unsafe { .. } => None,
        }
    }
}

/// Feeds `need = max - allocation` to the progress scan.
#[derive(Default)]
pub struct SafetyChecker<'t> {
    engine: ProgressScanEngine<'t>,
}

impl<'t> SafetyChecker<'t> {
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

    pub fn check(
        &mut self,
        available: &ResourceVector,
        max: &ResourceMatrix,
        allocation: &ResourceMatrix,
    ) -> Result<SafetyVerdict> {
        let need = resources::need(max, allocation)?;
        let outcome = self.engine.scan(&need, allocation, available)?;
        if outcome.all_finished() {
            Ok(SafetyVerdict::Safe {
                sequence: outcome.order,
            })
        } else {
            Ok(SafetyVerdict::Unsafe {
                blocked: outcome.unfinished(),
            })
        }
    }
}

/// One-shot safety check without tracing.
pub fn check_safety(
    available: &ResourceVector,
    max: &ResourceMatrix,
    allocation: &ResourceMatrix,
) -> Result<SafetyVerdict> {
    SafetyChecker::new().check(available, max, allocation)
}
