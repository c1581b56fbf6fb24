//! Derived quantities: total capacity, availability from the graph, need from max.

use crate::core::errors::{DlaError, Result};
use crate::model::matrix::{ResourceMatrix, ResourceVector};

/// Column-sum of `allocation` plus `available`, elementwise.
///
/// Fails with `CapacityOverflow` when a total does not fit in `u64`.
pub fn total_resources(
    allocation: &ResourceMatrix,
    available: &ResourceVector,
) -> Result<ResourceVector> {
    ensure_width(allocation, available.len(), "allocation width vs available")?;
    let mut total = available.clone();
    total.accumulate(&allocation.column_sums()?)?;
    Ok(total)
}

/// `resource_nodes` (total capacity per type) minus what is already allocated.
///
/// Fails with `NegativeAvailability` for an over-allocated resource type, or
/// `CapacityOverflow` when the allocated units of a type do not fit in `u64`.
pub fn available_from_graph(
    resource_nodes: &ResourceVector,
    allocation: &ResourceMatrix,
) -> Result<ResourceVector> {
    ensure_width(allocation, resource_nodes.len(), "allocation width vs resource nodes")?;
    // A matrix with no rows may carry width 0; keep one slot per node.
    let mut allocated = ResourceVector::zeros(resource_nodes.len());
    allocated.accumulate(&allocation.column_sums()?)?;
    let mut available = Vec::with_capacity(resource_nodes.len());
    for (resource, (&capacity, &used)) in resource_nodes.iter().zip(allocated.iter()).enumerate() {
        let free = capacity
            .checked_sub(used)
            .ok_or(DlaError::NegativeAvailability {
                resource,
                capacity,
                allocated: used,
            })?;
        available.push(free);
    }
    Ok(ResourceVector::new(available))
}

/// Elementwise `max - allocation`.
///
/// Fails with `InvalidDemand` where a process holds more than it declared.
pub fn need(max: &ResourceMatrix, allocation: &ResourceMatrix) -> Result<ResourceMatrix> {
    allocation.ensure_shape(max.processes(), max.resource_types(), "allocation vs max")?;
    let mut rows = Vec::with_capacity(max.processes());
    for (process, (max_row, held_row)) in max.rows().zip(allocation.rows()).enumerate() {
        let mut row = Vec::with_capacity(max_row.len());
        for (resource, (&declared, &held)) in max_row.iter().zip(held_row).enumerate() {
            let remaining = declared
                .checked_sub(held)
                .ok_or(DlaError::InvalidDemand {
                    process,
                    resource,
                    max: declared,
                    allocated: held,
                })?;
            row.push(remaining);
        }
        rows.push(row);
    }
    ResourceMatrix::with_width(rows, max.resource_types())
}

fn ensure_width(matrix: &ResourceMatrix, width: usize, context: &'static str) -> Result<()> {
    matrix.ensure_shape(matrix.processes(), width, context)
}
