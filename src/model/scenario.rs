//! Scenario files: a snapshot of allocations and demands read from TOML or JSON.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::LimitsConfig;
use crate::core::errors::{DlaError, Result};
use crate::model::matrix::{ResourceMatrix, ResourceVector};
use crate::model::resources;

/// Names and one-line summaries of the scenarios shipped with the crate.
pub const BUILTIN_SCENARIOS: &[(&str, &str)] = &[
    (
        "graph-no-deadlock",
        "4 processes on a fully allocated [2, 2, 1] graph; every request can be met in turn",
    ),
    (
        "graph-deadlock",
        "same graph, but P4 asks for two units of R2 so P3 and P4 block each other",
    ),
    (
        "banker-textbook",
        "5 processes, 3 resource types, available [3, 3, 2]; safe via P2 -> P4 -> P1 -> P3 -> P5",
    ),
];

/// One system state. Exactly one of `resource_nodes` / `available` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Total units per resource type (availability is derived from the allocation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_nodes: Option<ResourceVector>,
    /// Free units per resource type, supplied directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<ResourceVector>,
    pub allocation: ResourceMatrix,
    /// Outstanding requests, for deadlock detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ResourceMatrix>,
    /// Declared maximum demand, for safety checking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ResourceMatrix>,
}

impl Scenario {
    /// Read a scenario file; `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| DlaError::io(path, source))?;
        let mut scenario: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&raw).map_err(|e| DlaError::InvalidScenario {
                details: format!("{}: {e}", path.display()),
            })?
        } else {
            toml::from_str(&raw).map_err(|e| DlaError::InvalidScenario {
                details: format!("{}: {e}", path.display()),
            })?
        };
        if scenario.name.is_empty()
            && let Some(stem) = path.file_stem()
        {
            scenario.name = stem.to_string_lossy().into_owned();
        }
        Ok(scenario)
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        let graph_allocation = || {
            ResourceMatrix::from(vec![[0, 1, 0], [1, 0, 0], [0, 1, 0], [1, 0, 1]])
        };
        let description = BUILTIN_SCENARIOS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, text)| (*text).to_string());

        match name {
            "graph-no-deadlock" => Some(Self {
                name: name.to_string(),
                description,
                resource_nodes: Some(ResourceVector::from([2, 2, 1])),
                available: None,
                allocation: graph_allocation(),
                request: Some(ResourceMatrix::from(vec![
                    [1, 0, 0],
                    [0, 0, 0],
                    [0, 0, 1],
                    [0, 1, 0],
                ])),
                max: None,
            }),
            "graph-deadlock" => Some(Self {
                name: name.to_string(),
                description,
                resource_nodes: Some(ResourceVector::from([2, 2, 1])),
                available: None,
                allocation: graph_allocation(),
                request: Some(ResourceMatrix::from(vec![
                    [1, 0, 0],
                    [0, 0, 0],
                    [0, 0, 1],
                    [0, 2, 0],
                ])),
                max: None,
            }),
            "banker-textbook" => Some(Self {
                name: name.to_string(),
                description,
                resource_nodes: None,
                available: Some(ResourceVector::from([3, 3, 2])),
                allocation: ResourceMatrix::from(vec![
                    [0, 1, 0],
                    [2, 0, 0],
                    [3, 0, 2],
                    [2, 1, 1],
                    [0, 0, 2],
                ]),
                request: None,
                max: Some(ResourceMatrix::from(vec![
                    [7, 5, 3],
                    [3, 2, 2],
                    [9, 0, 2],
                    [2, 2, 2],
                    [4, 3, 3],
                ])),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn processes(&self) -> usize {
        self.allocation.processes()
    }

    /// Number of resource types, taken from whichever capacity vector is present.
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.resource_nodes
            .as_ref()
            .or(self.available.as_ref())
            .map_or(self.allocation.resource_types(), |v| v.len())
    }

    /// Free units at scan start, derived from `resource_nodes` or taken from `available`.
    pub fn resolve_available(&self) -> Result<ResourceVector> {
        match (&self.resource_nodes, &self.available) {
            (Some(nodes), None) => resources::available_from_graph(nodes, &self.allocation),
            (None, Some(available)) => {
                self.allocation.ensure_shape(
                    self.allocation.processes(),
                    available.len(),
                    "allocation width vs available",
                )?;
                Ok(available.clone())
            }
            (Some(_), Some(_)) => Err(DlaError::InvalidScenario {
                details: format!(
                    "{}: set either resource_nodes or available, not both",
                    self.label()
                ),
            }),
            (None, None) => Err(DlaError::InvalidScenario {
                details: format!(
                    "{}: one of resource_nodes or available is required",
                    self.label()
                ),
            }),
        }
    }

    /// Total capacity per resource type.
    pub fn total_resources(&self) -> Result<ResourceVector> {
        match &self.resource_nodes {
            Some(nodes) if self.available.is_none() => {
                // Validates the allocation against capacity as a side effect.
                self.resolve_available()?;
                Ok(nodes.clone())
            }
            _ => resources::total_resources(&self.allocation, &self.resolve_available()?),
        }
    }

    /// The request matrix; required for deadlock detection.
    pub fn request(&self) -> Result<&ResourceMatrix> {
        self.request.as_ref().ok_or_else(|| DlaError::InvalidScenario {
            details: format!("{}: deadlock detection needs a request matrix", self.label()),
        })
    }

    /// The declared-maximum matrix; required for safety checking.
    pub fn max(&self) -> Result<&ResourceMatrix> {
        self.max.as_ref().ok_or_else(|| DlaError::InvalidScenario {
            details: format!("{}: safety checking needs a max matrix", self.label()),
        })
    }

    /// Reject scenarios larger than the configured caps.
    pub fn check_limits(&self, limits: &LimitsConfig) -> Result<()> {
        if self.processes() > limits.max_processes {
            return Err(DlaError::InvalidScenario {
                details: format!(
                    "{}: {} processes exceeds limits.max_processes = {}",
                    self.label(),
                    self.processes(),
                    limits.max_processes
                ),
            });
        }
        if self.resource_types() > limits.max_resource_types {
            return Err(DlaError::InvalidScenario {
                details: format!(
                    "{}: {} resource types exceeds limits.max_resource_types = {}",
                    self.label(),
                    self.resource_types(),
                    limits.max_resource_types
                ),
            });
        }
        Ok(())
    }

    fn label(&self) -> &str {
        if self.name.is_empty() {
            "scenario"
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH_TOML: &str = r"
name = 'lab'
resource_nodes = [2, 2, 1]
allocation = [[0, 1, 0], [1, 0, 0], [0, 1, 0], [1, 0, 1]]
request = [[1, 0, 0], [0, 0, 0], [0, 0, 1], [0, 1, 0]]
";

    #[test]
    fn every_builtin_resolves() {
        for (name, _) in BUILTIN_SCENARIOS {
            let scenario = Scenario::builtin(name).expect("builtin exists");
            assert_eq!(scenario.name, *name);
            assert!(scenario.resolve_available().is_ok(), "{name}");
            assert!(scenario.description.is_some());
            assert!(scenario.processes() > 0, "{name} has no processes");
            assert_eq!(scenario.resource_types(), 3, "{name}");
            for demand in [&scenario.request, &scenario.max].into_iter().flatten() {
                demand
                    .ensure_shape(scenario.processes(), 3, "builtin demand")
                    .unwrap_or_else(|e| panic!("{name}: {e}"));
            }
        }
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn toml_scenario_derives_availability() {
        let scenario: Scenario = toml::from_str(GRAPH_TOML).unwrap();
        assert_eq!(
            scenario.resolve_available().unwrap(),
            ResourceVector::from([0, 0, 0])
        );
        assert_eq!(
            scenario.total_resources().unwrap(),
            ResourceVector::from([2, 2, 1])
        );
        assert_eq!(scenario.request().unwrap().processes(), 4);
        assert!(scenario.max().is_err());
    }

    #[test]
    fn both_capacity_vectors_rejected() {
        let mut scenario = Scenario::builtin("graph-deadlock").unwrap();
        scenario.available = Some(ResourceVector::from([0, 0, 0]));
        let err = scenario.resolve_available().unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn missing_capacity_vector_rejected() {
        let mut scenario = Scenario::builtin("graph-deadlock").unwrap();
        scenario.resource_nodes = None;
        assert!(matches!(
            scenario.resolve_available(),
            Err(DlaError::InvalidScenario { .. })
        ));
    }

    #[test]
    fn banker_total_resources() {
        let scenario = Scenario::builtin("banker-textbook").unwrap();
        assert_eq!(
            scenario.total_resources().unwrap(),
            ResourceVector::from([10, 5, 7])
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let raw = format!("{GRAPH_TOML}\nextra = 1\n");
        assert!(toml::from_str::<Scenario>(&raw).is_err());
    }

    #[test]
    fn load_json_by_extension_and_name_from_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two-procs.json");
        std::fs::write(
            &path,
            r#"{"available":[1,0],"allocation":[[0,1],[1,0]],"request":[[1,0],[0,1]]}"#,
        )
        .unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.name, "two-procs");
        assert_eq!(scenario.processes(), 2);
    }

    #[test]
    fn load_reports_parse_errors_as_invalid_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "allocation = [[1, 2], [3]]\navailable = [1, 1]\n").unwrap();
        let err = Scenario::load(&path).unwrap_err();
        assert_eq!(err.code(), "DLA-1101");
    }

    #[test]
    fn limits_enforced() {
        let scenario = Scenario::builtin("banker-textbook").unwrap();
        let limits = LimitsConfig {
            max_processes: 4,
            max_resource_types: 8,
        };
        let err = scenario.check_limits(&limits).unwrap_err();
        assert!(err.to_string().contains("max_processes"));
        assert!(scenario.check_limits(&LimitsConfig::default()).is_ok());
    }
}
