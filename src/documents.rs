//! Document Models - Typed Governance Inputs
//!
//! Typed views of the manifest, constitution, design intent, registry and
//! ruleset. Manifests and registries only reach this shape after passing
//! their schema; see `schema::upgrade`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::rules::{RendererIdentity, RuleMetadata};

// --- Renderer Output Manifest ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererOutputManifest {
    pub contract: ContractRef,
    pub renderer: RendererDeclaration,
    pub inputs: ManifestInputs,
    pub outputs: ManifestOutputs,
    #[serde(default)]
    pub taste: TasteDeclaration,
}

impl RendererOutputManifest {
    pub fn identity(&self) -> RendererIdentity {
        RendererIdentity::new(
            self.renderer.name.clone(),
            self.renderer.version.clone(),
            self.renderer.target.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererDeclaration {
    pub name: String,
    pub version: String,
    pub target: String,
    pub declares_contract: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestInputs {
    pub design_intent: DesignIntentRef,
    pub constitution: DocumentRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern_registries: Vec<DocumentRef>,
}

/// Reference to the design intent the renderer consumed. The checksum pins
/// the exact document revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignIntentRef {
    pub path: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestOutputs {
    pub artifact: ArtifactDescriptor,
    #[serde(default)]
    pub tokens: TokenUsage,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub constitution_violations: Vec<String>,
    pub determinism: Determinism,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub path: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub declared: Vec<String>,
    #[serde(default)]
    pub undeclared: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Determinism {
    pub deterministic: bool,
    #[serde(default)]
    pub markers: Vec<String>,
}

// --- Taste declaration (manifest side) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasteDeclaration {
    #[serde(default)]
    pub typography: TypographyDeclaration,
    #[serde(default)]
    pub spacing: SpacingDeclaration,
    #[serde(default)]
    pub color: ColorDeclaration,
    #[serde(default)]
    pub density: DensityDeclaration,
    #[serde(default)]
    pub consistency: ConsistencyDeclaration,
    #[serde(default)]
    pub patterns: Vec<PatternUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypographyDeclaration {
    #[serde(default)]
    pub sizes: Vec<f64>,
    #[serde(default)]
    pub roles: Vec<RoleSize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSize {
    pub role: String,
    pub size: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpacingDeclaration {
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorDeclaration {
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub contrast_pairs: Vec<ContrastPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContrastPair {
    pub foreground: String,
    pub background: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DensityDeclaration {
    #[serde(default)]
    pub interactions_per_view: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyAxis {
    Radius,
    Elevation,
    Motion,
}

impl ConsistencyAxis {
    pub const ALL: [ConsistencyAxis; 3] = [Self::Radius, Self::Elevation, Self::Motion];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Radius => "radius",
            Self::Elevation => "elevation",
            Self::Motion => "motion",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyDeclaration {
    #[serde(default)]
    pub radius: Vec<ConsistencyValue>,
    #[serde(default)]
    pub elevation: Vec<ConsistencyValue>,
    #[serde(default)]
    pub motion: Vec<ConsistencyValue>,
}

impl ConsistencyDeclaration {
    pub fn values(&self, axis: ConsistencyAxis) -> &[ConsistencyValue] {
        match axis {
            ConsistencyAxis::Radius => &self.radius,
            ConsistencyAxis::Elevation => &self.elevation,
            ConsistencyAxis::Motion => &self.motion,
        }
    }
}

/// A consistency value is a number (radius, elevation) or a named token (motion curves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsistencyValue {
    Number(f64),
    Text(String),
}

impl ConsistencyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ConsistencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternUsage {
    pub pattern: String,
    pub intent: String,
}

// --- Visual Constitution ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConstitution {
    pub version: String,
    pub typography: TypographyPolicy,
    pub spacing: SpacingPolicy,
    pub color: ColorPolicy,
    pub density: DensityPolicy,
    #[serde(default)]
    pub consistency: ConsistencyPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypographyPolicy {
    pub max_sizes: usize,
    #[serde(default)]
    pub roles: BTreeMap<String, SizeRange>,
    /// Role names ordered from largest to smallest.
    #[serde(default)]
    pub hierarchy: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

impl SizeRange {
    pub fn contains(&self, size: f64) -> bool {
        size >= self.min && size <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingPolicy {
    pub allowed: Vec<f64>,
    pub max_variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorPolicy {
    pub allowed_tokens: Vec<String>,
    pub min_contrast: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityPolicy {
    pub max_interactions_per_view: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyPolicy {
    #[serde(default)]
    pub radius: ConsistencyBand,
    #[serde(default)]
    pub elevation: ConsistencyBand,
    #[serde(default)]
    pub motion: ConsistencyBand,
}

impl ConsistencyPolicy {
    pub fn band(&self, axis: ConsistencyAxis) -> &ConsistencyBand {
        match axis {
            ConsistencyAxis::Radius => &self.radius,
            ConsistencyAxis::Elevation => &self.elevation,
            ConsistencyAxis::Motion => &self.motion,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyBand {
    #[serde(default)]
    pub allowed: Vec<ConsistencyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_variance: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternPolicy {
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub intents: BTreeMap<String, Vec<String>>,
}

// --- Design Intent ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignIntentTaste {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub density: IntentDensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<IntentPatterns>,
}

impl DesignIntentTaste {
    /// Project-level intent override for one pattern, if declared.
    pub fn pattern_intents(&self, pattern: &str) -> Option<&[String]> {
        self.patterns
            .as_ref()
            .and_then(|p| p.intents.get(pattern))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentDensity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentPatterns {
    #[serde(default)]
    pub intents: BTreeMap<String, Vec<String>>,
}

// --- Renderer Registry ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererRegistry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub renderers: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub version: String,
    pub target: String,
    pub contract_id: String,
}

impl RendererRegistry {
    /// Match on (name, version, target). Contract id is not part of identity.
    pub fn find(&self, identity: &RendererIdentity) -> Option<&RegistryEntry> {
        self.renderers.iter().find(|e| {
            e.name == identity.name && e.version == identity.version && e.target == identity.target
        })
    }
}

// --- Taste Ruleset ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasteRuleset {
    pub version: String,
    #[serde(default)]
    pub rules: Vec<RulesetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetEntry {
    pub id: String,
    #[serde(flatten)]
    pub metadata: RuleMetadata,
}

/// Ruleset indexed by rule id
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    version: String,
    entries: BTreeMap<String, RuleMetadata>,
}

impl RuleCatalog {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Metadata for `id`, or the placeholder when the ruleset lacks it.
    pub fn metadata(&self, id: &str) -> RuleMetadata {
        match self.entries.get(id) {
            Some(meta) => meta.clone(),
            None => {
                tracing::warn!(rule = id, ruleset = %self.version, "rule metadata missing from ruleset");
                RuleMetadata::placeholder()
            }
        }
    }
}

impl From<TasteRuleset> for RuleCatalog {
    fn from(ruleset: TasteRuleset) -> Self {
        // Later duplicates win, matching a plain object keyed by id.
        let entries = ruleset
            .rules
            .into_iter()
            .map(|entry| (entry.id, entry.metadata))
            .collect();
        Self { version: ruleset.version, entries }
    }
}
