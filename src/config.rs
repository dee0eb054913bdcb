//! Gate Configuration - Explicit Document Locations
//!
//! Every path the gate reads or writes is a field here. Nothing falls back to
//! process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gate::{load_document, GateError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    pub contract_schema: PathBuf,
    pub registry_schema: PathBuf,
    pub registry: PathBuf,
    pub constitution: PathBuf,
    pub ruleset: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            contract_schema: PathBuf::from("schemas/renderer-output.schema.json"),
            registry_schema: PathBuf::from("schemas/renderer-registry.schema.json"),
            registry: PathBuf::from("renderers/registry.json"),
            constitution: PathBuf::from("governance/visual-constitution.json"),
            ruleset: PathBuf::from("governance/taste-ruleset.json"),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl GateConfig {
    /// Load a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, GateError> {
        load_document(path)
    }

    /// Resolve relative paths against `root`; absolute paths are kept.
    pub fn rooted(self, root: &Path) -> Self {
        let join = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        Self {
            contract_schema: join(self.contract_schema),
            registry_schema: join(self.registry_schema),
            registry: join(self.registry),
            constitution: join(self.constitution),
            ruleset: join(self.ruleset),
            reports_dir: join(self.reports_dir),
        }
    }
}
