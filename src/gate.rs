//! Compliance Gate - Single Entry Point for File-Backed Runs
//!
//! Loads documents, hands them to the evaluators, persists reports.
//! Setup failures surface as `GateError`; rule failures never do.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::GateConfig;
use crate::contract::RendererContractValidator;
use crate::documents::{DesignIntentTaste, RendererOutputManifest, TasteRuleset, VisualConstitution};
use crate::rules::{RendererIdentity, RendererValidationReport, TasteReport};
use crate::schema::SchemaCompileError;
use crate::taste::{TasteEvaluator, TasteOptions};

pub const MANIFEST_SUFFIX: &str = ".manifest.json";

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaCompileError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read and deserialize one JSON document.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, GateError> {
    let content = fs::read_to_string(path).map_err(|source| GateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| GateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively find `*.manifest.json` files under `dir`, sorted by path.
///
/// Symlinks are not followed. A missing directory yields an empty list.
pub fn discover_manifests(dir: &Path) -> Result<Vec<PathBuf>, GateError> {
    let mut found = vec![];
    if !dir.exists() {
        return Ok(found);
    }

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| GateError::Io {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        let is_manifest = entry
            .file_name()
            .to_str()
            .map_or(false, |n| n.ends_with(MANIFEST_SUFFIX));
        if entry.file_type().is_file() && is_manifest {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Write `report` as pretty JSON to `dir/file_name`, creating `dir`.
pub fn write_report<T: Serialize>(dir: &Path, file_name: &str, report: &T) -> Result<PathBuf, GateError> {
    fs::create_dir_all(dir).map_err(|source| GateError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(report)?;
    fs::write(&path, body + "\n").map_err(|source| GateError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Report file stem: the renderer slug, or the manifest file stem when the
/// renderer could not be identified.
fn report_stem(manifest_path: &Path, renderer: &RendererIdentity) -> String {
    if *renderer != RendererIdentity::unknown() {
        return renderer.slug();
    }
    let file_name = manifest_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    file_name
        .strip_suffix(MANIFEST_SUFFIX)
        .or_else(|| file_name.strip_suffix(".json"))
        .unwrap_or(file_name)
        .to_string()
}

pub fn contract_report_name(manifest_path: &Path, renderer: &RendererIdentity) -> String {
    format!("{}.contract.json", report_stem(manifest_path, renderer))
}

pub fn taste_report_name(manifest_path: &Path, renderer: &RendererIdentity) -> String {
    format!("{}.taste.json", report_stem(manifest_path, renderer))
}

/// Explicit document overrides for a taste run
#[derive(Debug, Clone, Default)]
pub struct TasteSources {
    pub constitution: Option<PathBuf>,
    pub intent: Option<PathBuf>,
}

/// The gate - loads documents and delegates to the pure evaluators
pub struct ComplianceGate {
    config: GateConfig,
    contract: RendererContractValidator,
}

impl ComplianceGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            contract: RendererContractValidator::new(),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Taste evaluator over the configured ruleset.
    pub fn evaluator(&self) -> Result<TasteEvaluator, GateError> {
        let ruleset: TasteRuleset = load_document(&self.config.ruleset)?;
        Ok(TasteEvaluator::new(ruleset))
    }

    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, GateError> {
        discover_manifests(dir)
    }

    /// Contract check for one manifest file against the configured registry.
    pub fn check_contract(&self, manifest_path: &Path) -> Result<RendererValidationReport, GateError> {
        let manifest: Value = load_document(manifest_path)?;
        let registry: Value = load_document(&self.config.registry)?;
        let contract_schema: Value = load_document(&self.config.contract_schema)?;
        let registry_schema: Value = load_document(&self.config.registry_schema)?;

        tracing::debug!(manifest = %manifest_path.display(), "checking renderer contract");
        Ok(self
            .contract
            .validate(&manifest, &registry, &contract_schema, &registry_schema)?)
    }

    /// Taste check for one manifest file.
    ///
    /// Constitution: override, else the manifest's reference when it exists,
    /// else the configured constitution. Intent: override, else the manifest's
    /// reference. Manifest references resolve against the manifest's directory.
    pub fn check_taste(
        &self,
        manifest_path: &Path,
        sources: &TasteSources,
        options: &TasteOptions,
    ) -> Result<TasteReport, GateError> {
        let evaluator = self.evaluator()?;
        let manifest: RendererOutputManifest = load_document(manifest_path)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let constitution_path = match &sources.constitution {
            Some(path) => path.clone(),
            None => {
                let referenced = base.join(&manifest.inputs.constitution.path);
                if referenced.is_file() {
                    referenced
                } else {
                    self.config.constitution.clone()
                }
            }
        };
        let intent_path = sources
            .intent
            .clone()
            .unwrap_or_else(|| base.join(&manifest.inputs.design_intent.path));

        tracing::debug!(
            manifest = %manifest_path.display(),
            constitution = %constitution_path.display(),
            intent = %intent_path.display(),
            "checking renderer taste"
        );

        let constitution: VisualConstitution = load_document(&constitution_path)?;
        let intent: DesignIntentTaste = load_document(&intent_path)?;

        Ok(evaluator.evaluate(&manifest, &constitution, &intent, options))
    }

    pub fn persist_contract(
        &self,
        manifest_path: &Path,
        report: &RendererValidationReport,
    ) -> Result<PathBuf, GateError> {
        let name = contract_report_name(manifest_path, &report.renderer);
        write_report(&self.config.reports_dir, &name, report)
    }

    pub fn persist_taste(&self, manifest_path: &Path, report: &TasteReport) -> Result<PathBuf, GateError> {
        let name = taste_report_name(manifest_path, &report.renderer);
        write_report(&self.config.reports_dir, &name, report)
    }
}

impl Default for ComplianceGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}
