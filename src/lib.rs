//! RenderGate Core - Renderer Compliance Gate
//!
//! # The Gate Laws
//! 1. Metadata Is Evidence (no pixels are inspected)
//! 2. Schemas Guard the Door
//! 3. Rules Report, Never Throw
//! 4. Same Documents, Same Verdict
//! 5. Intent Overrides Constitution

pub mod rules;
pub mod documents;
pub mod schema;
pub mod contract;
pub mod taste;
pub mod hashing;
pub mod config;
pub mod gate;

pub use rules::{RendererIdentity, RendererValidationReport, ReportStatus, RuleMetadata, RuleResult, TasteReport};
pub use documents::{DesignIntentTaste, RendererOutputManifest, RendererRegistry, TasteRuleset, VisualConstitution};
pub use schema::{JsonSchemaValidator, SchemaCompileError, SchemaError, SchemaValidator, Validated};
pub use contract::RendererContractValidator;
pub use taste::{TasteEvaluator, TasteOptions};
pub use hashing::{canonical_json, rules_fingerprint, sha256_hex};
pub use config::GateConfig;
pub use gate::{ComplianceGate, GateError, TasteSources};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
