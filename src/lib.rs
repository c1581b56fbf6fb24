#![forbid(unsafe_code)]

//! Deadlock Analyzer (dla): resource-allocation-graph analysis over
//! allocation, request and maximum-demand matrices.
//!
//! Two analyses share one fixed-point core, the progress scan:
//! 1. **Deadlock detection**: scan outstanding requests; whoever cannot finish is deadlocked
//! 2. **Safety check** (Banker's algorithm): scan `max - allocation`; the state is safe
//!    only if everyone finishes, and the completion order is the safe sequence
//!
//! All process and resource indices are 0-based.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust
//! use deadlock_analyzer::prelude::*;
//!
//! let allocation = ResourceMatrix::from_rows(vec![vec![1, 0], vec![0, 1]])?;
//! let request = ResourceMatrix::from_rows(vec![vec![0, 1], vec![1, 0]])?;
//! let report = detect_deadlock(&request, &allocation, &ResourceVector::from([0, 0]))?;
//! assert_eq!(report.deadlocked, vec![0, 1]);
//! # Ok::<(), DlaError>(())
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use deadlock_analyzer::engine::scan::ProgressScanEngine;
//! use deadlock_analyzer::model::scenario::Scenario;
//! ```

pub mod prelude;

pub mod analysis;
pub mod core;
pub mod engine;
pub mod logger;
pub mod model;
