//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use deadlock_analyzer::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DlaError, Result};

// Model
pub use crate::model::matrix::{ResourceMatrix, ResourceVector};
pub use crate::model::resources::{available_from_graph, need, total_resources};
pub use crate::model::scenario::Scenario;
pub use crate::model::{format_sequence, process_label};

// Engine
pub use crate::engine::scan::{ProgressScanEngine, ScanOutcome};
pub use crate::engine::trace::{ScanEvent, TraceSink};

// Analyses
pub use crate::analysis::detector::{DeadlockDetector, DeadlockReport, detect_deadlock};
pub use crate::analysis::safety::{SafetyChecker, SafetyVerdict, check_safety};
