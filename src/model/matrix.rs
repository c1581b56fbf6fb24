//! Resource vectors and P×R matrices of non-negative unit counts.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DlaError, Result};

/// Unit counts per resource type, index-aligned across one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u64>);

impl ResourceVector {
    /// Wrap per-resource counts.
    #[must_use]
    pub fn new(counts: Vec<u64>) -> Self {
        Self(counts)
    }

    /// All-zero vector of the given width.
    #[must_use]
    pub fn zeros(resource_types: usize) -> Self {
        Self(vec![0; resource_types])
    }

    /// True when every component of `demand` fits in this vector.
    #[must_use]
    pub fn covers(&self, demand: &[u64]) -> bool {
        demand.len() == self.0.len() && demand.iter().zip(&self.0).all(|(need, have)| need <= have)
    }

    /// Elementwise `self >= other`.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        self.covers(&other.0)
    }

    /// Add `held` back into the pool (simulated completion of its holder).
    ///
    /// Saturates at `u64::MAX`. Only scan state uses this: a saturated
    /// component still covers every `u64` demand, so no verdict changes.
    /// Totals that are reported back to callers go through [`Self::accumulate`].
    pub fn release(&mut self, held: &[u64]) {
        for (slot, units) in self.0.iter_mut().zip(held) {
            *slot = slot.saturating_add(*units);
        }
    }

    /// Add `units` elementwise, failing with `CapacityOverflow` on the first
    /// component whose sum does not fit in `u64`. Leaves `self` untouched on error.
    pub fn accumulate(&mut self, units: &[u64]) -> Result<()> {
        let sums = self
            .0
            .iter()
            .zip(units)
            .enumerate()
            .map(|(resource, (&have, &add))| {
                have.checked_add(add)
                    .ok_or(DlaError::CapacityOverflow { resource })
            })
            .collect::<Result<Vec<u64>>>()?;
        self.0[..sums.len()].copy_from_slice(&sums);
        Ok(())
    }

    /// Fail with `DimensionMismatch` unless this vector has `expected` components.
    pub fn ensure_len(&self, expected: usize, context: &'static str) -> Result<()> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(DlaError::DimensionMismatch {
                context,
                expected,
                found: self.0.len(),
            })
        }
    }

    /// Unwrap into the raw counts.
    #[must_use]
    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

impl Deref for ResourceVector {
    type Target = [u64];

    fn deref(&self) -> &[u64] {
        &self.0
    }
}

impl From<Vec<u64>> for ResourceVector {
    fn from(counts: Vec<u64>) -> Self {
        Self(counts)
    }
}

impl<const N: usize> From<[u64; N]> for ResourceVector {
    fn from(counts: [u64; N]) -> Self {
        Self(counts.to_vec())
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, units) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{units}")?;
        }
        f.write_str("]")
    }
}

/// Rectangular matrix: one row per process, one column per resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u64>>", into = "Vec<Vec<u64>>")]
pub struct ResourceMatrix {
    rows: Vec<Vec<u64>>,
    resource_types: usize,
}

impl ResourceMatrix {
    /// Build from rows; every row must have the width of the first.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        Self::with_width(rows, width)
    }

    /// Build from rows of a known width (needed when there are no rows).
    pub fn with_width(rows: Vec<Vec<u64>>, resource_types: usize) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|row| row.len() != resource_types) {
            return Err(DlaError::DimensionMismatch {
                context: "matrix row width",
                expected: resource_types,
                found: bad.len(),
            });
        }
        Ok(Self {
            rows,
            resource_types,
        })
    }

    /// `processes × resource_types` matrix of zeros.
    #[must_use]
    pub fn zeros(processes: usize, resource_types: usize) -> Self {
        Self {
            rows: vec![vec![0; resource_types]; processes],
            resource_types,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn processes(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, kept even when there are no rows.
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.resource_types
    }

    /// Row of `process`. Panics when out of range.
    #[must_use]
    pub fn row(&self, process: usize) -> &[u64] {
        &self.rows[process]
    }

    /// Rows in process order.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Per-resource total across all processes.
    ///
    /// Fails with `CapacityOverflow` when a column does not fit in `u64`.
    pub fn column_sums(&self) -> Result<ResourceVector> {
        let mut sums = ResourceVector::zeros(self.resource_types);
        for row in &self.rows {
            sums.accumulate(row)?;
        }
        Ok(sums)
    }

    /// Check this matrix is `processes × resource_types`.
    ///
    /// An empty matrix is accepted for any width when no processes are expected.
    pub fn ensure_shape(
        &self,
        processes: usize,
        resource_types: usize,
        context: &'static str,
    ) -> Result<()> {
        if self.rows.len() != processes {
            return Err(DlaError::DimensionMismatch {
                context,
                expected: processes,
                found: self.rows.len(),
            });
        }
        if processes > 0 && self.resource_types != resource_types {
            return Err(DlaError::DimensionMismatch {
                context,
                expected: resource_types,
                found: self.resource_types,
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<u64>>> for ResourceMatrix {
    type Error = DlaError;

    fn try_from(rows: Vec<Vec<u64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

/// Fixed-width rows cannot be ragged, so this conversion is infallible.
impl<const R: usize> From<Vec<[u64; R]>> for ResourceMatrix {
    fn from(rows: Vec<[u64; R]>) -> Self {
        Self {
            rows: rows.into_iter().map(|row| row.to_vec()).collect(),
            resource_types: R,
        }
    }
}

impl From<ResourceMatrix> for Vec<Vec<u64>> {
    fn from(matrix: ResourceMatrix) -> Self {
        matrix.rows
    }
}
