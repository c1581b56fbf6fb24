//! DLA-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DlaError>;

/// Top-level error type for the deadlock analyzer.
#[derive(Debug, Error)]
pub enum DlaError {
    #[error("[DLA-1001] dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(
        "[DLA-1002] negative availability for resource {resource}: capacity {capacity} < allocated {allocated}"
    )]
    NegativeAvailability {
        resource: usize,
        capacity: u64,
        allocated: u64,
    },

    #[error(
        "[DLA-1003] invalid demand for process {process}, resource {resource}: max {max} < allocated {allocated}"
    )]
    InvalidDemand {
        process: usize,
        resource: usize,
        max: u64,
        allocated: u64,
    },

    #[error("[DLA-1004] capacity overflow for resource {resource}: total exceeds u64::MAX")]
    CapacityOverflow { resource: usize },

    #[error("[DLA-1101] invalid scenario: {details}")]
    InvalidScenario { details: String },

    #[error("[DLA-2001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DLA-2002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DLA-2003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DLA-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DLA-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DlaError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "DLA-1001",
            Self::NegativeAvailability { .. } => "DLA-1002",
            Self::InvalidDemand { .. } => "DLA-1003",
            Self::CapacityOverflow { .. } => "DLA-1004",
            Self::InvalidScenario { .. } => "DLA-1101",
            Self::InvalidConfig { .. } => "DLA-2001",
            Self::MissingConfig { .. } => "DLA-2002",
            Self::ConfigParse { .. } => "DLA-2003",
            Self::Serialization { .. } => "DLA-2101",
            Self::Io { .. } => "DLA-3001",
        }
    }

    /// Whether the caller has to fix its input (as opposed to an environment
    /// or internal failure).
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::Serialization { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for DlaError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_variant() -> Vec<DlaError> {
        vec![
            DlaError::DimensionMismatch {
                context: "",
                expected: 0,
                found: 0,
            },
            DlaError::NegativeAvailability {
                resource: 0,
                capacity: 0,
                allocated: 0,
            },
            DlaError::InvalidDemand {
                process: 0,
                resource: 0,
                max: 0,
                allocated: 0,
            },
            DlaError::CapacityOverflow { resource: 0 },
            DlaError::InvalidScenario {
                details: String::new(),
            },
            DlaError::InvalidConfig {
                details: String::new(),
            },
            DlaError::MissingConfig {
                path: PathBuf::new(),
            },
            DlaError::ConfigParse {
                context: "",
                details: String::new(),
            },
            DlaError::Serialization {
                context: "",
                details: String::new(),
            },
            DlaError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = every_variant();
        let codes: Vec<&str> = errors.iter().map(DlaError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_display_includes_code() {
        for err in every_variant() {
            let msg = err.to_string();
            assert!(
                msg.contains(err.code()),
                "display should contain error code: {msg}"
            );
        }
    }

    #[test]
    fn dimension_mismatch_names_context() {
        let err = DlaError::DimensionMismatch {
            context: "allocation rows",
            expected: 4,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("allocation rows"), "{msg}");
        assert!(msg.contains("expected 4, found 3"), "{msg}");
    }

    #[test]
    fn io_and_serialization_are_not_input_errors() {
        for err in every_variant() {
            let expected = !matches!(err, DlaError::Io { .. } | DlaError::Serialization { .. });
            assert_eq!(err.is_input_error(), expected, "{}", err.code());
        }
    }

    #[test]
    fn io_convenience_constructor() {
        let err = DlaError::io(
            "/tmp/scenario.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "DLA-3001");
        assert!(err.to_string().contains("/tmp/scenario.toml"));
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: DlaError = toml_err.into();
        assert_eq!(err.code(), "DLA-2003");
    }
}
