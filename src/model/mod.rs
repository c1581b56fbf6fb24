//! Resource model: vectors, matrices, derived quantities, and scenario input.
//!
//! All indices in this crate are 0-based. Only [`process_label`] switches to the
//! 1-based `P1, P2, ...` naming used in human-facing output.

pub mod matrix;
pub mod resources;
pub mod scenario;

/// Human-facing label for a 0-based process index (`0` → `"P1"`).
#[must_use]
pub fn process_label(process: usize) -> String {
    format!("P{}", process + 1)
}

/// Render a completion order as `P2 -> P4 -> P5`.
#[must_use]
pub fn format_sequence(order: &[usize]) -> String {
    order
        .iter()
        .map(|&process| process_label(process))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_one_based() {
        assert_eq!(process_label(0), "P1");
        assert_eq!(process_label(9), "P10");
    }

    #[test]
    fn sequence_joins_labels() {
        assert_eq!(format_sequence(&[1, 3, 0, 2, 4]), "P2 -> P4 -> P1 -> P3 -> P5");
        assert_eq!(format_sequence(&[]), "");
    }
}
