//! Renderer Contract Validation
//!
//! Two schema gates, then six semantic rules. The schema gates always both
//! run; the semantic rules only see documents that passed them.

use serde_json::Value;

use crate::documents::{RendererOutputManifest, RendererRegistry};
use crate::rules::{RendererIdentity, RendererValidationReport, RuleResult};
use crate::schema::{
    format_schema_errors, upgrade, JsonSchemaValidator, SchemaCompileError, SchemaError, SchemaValidator,
    Validated,
};

pub const MANIFEST_SCHEMA_RULE: &str = "renderer-manifest.schema";
pub const REGISTRY_SCHEMA_RULE: &str = "renderer-registry.schema";
pub const DECLARED_CONTRACT_RULE: &str = "renderer-contract.declared.rule";
pub const REGISTRATION_RULE: &str = "renderer-registration.rule";
pub const REGISTRY_CONTRACT_RULE: &str = "renderer-contract.registry.rule";
pub const TOKEN_USAGE_RULE: &str = "token-usage.declared.rule";
pub const CONSTITUTION_COMPLIANCE_RULE: &str = "constitution-compliance.rule";
pub const DETERMINISTIC_OUTPUT_RULE: &str = "deterministic-output.rule";

/// Semantic contract rule - one result per manifest
pub trait ContractRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn check(&self, manifest: &RendererOutputManifest, registry: &RendererRegistry) -> RuleResult;
}

// --- Concrete Rules ---

pub struct DeclaredContractRule;

impl ContractRule for DeclaredContractRule {
    fn id(&self) -> &'static str { DECLARED_CONTRACT_RULE }

    fn check(&self, manifest: &RendererOutputManifest, _registry: &RendererRegistry) -> RuleResult {
        let declared = &manifest.renderer.declares_contract;
        let contract = &manifest.contract.id;

        if declared == contract {
            RuleResult::pass(self.id(), format!("Renderer declares contract {}.", contract))
        } else {
            RuleResult::fail(
                self.id(),
                format!("Renderer declares contract {} but manifest targets {}.", declared, contract),
                declared.clone(),
            )
        }
    }
}

pub struct RegistrationRule;

impl ContractRule for RegistrationRule {
    fn id(&self) -> &'static str { REGISTRATION_RULE }

    fn check(&self, manifest: &RendererOutputManifest, registry: &RendererRegistry) -> RuleResult {
        let identity = manifest.identity();
        match registry.find(&identity) {
            Some(_) => RuleResult::pass(self.id(), format!("Renderer {} is registered.", identity)),
            None => RuleResult::fail(
                self.id(),
                format!("Renderer {} is not registered.", identity),
                identity.to_string(),
            ),
        }
    }
}

pub struct RegistryContractRule;

impl ContractRule for RegistryContractRule {
    fn id(&self) -> &'static str { REGISTRY_CONTRACT_RULE }

    fn check(&self, manifest: &RendererOutputManifest, registry: &RendererRegistry) -> RuleResult {
        let identity = manifest.identity();
        let contract = &manifest.contract.id;

        match registry.find(&identity) {
            None => RuleResult::fail(
                self.id(),
                format!("No registry entry for {}; registered contract cannot be confirmed.", identity),
                identity.to_string(),
            ),
            Some(entry) if entry.contract_id == *contract => RuleResult::pass(
                self.id(),
                format!("Registered contract {} matches manifest.", contract),
            ),
            Some(entry) => RuleResult::fail(
                self.id(),
                format!(
                    "Registered contract {} does not match manifest contract {}.",
                    entry.contract_id, contract
                ),
                entry.contract_id.clone(),
            ),
        }
    }
}

pub struct TokenUsageRule;

impl ContractRule for TokenUsageRule {
    fn id(&self) -> &'static str { TOKEN_USAGE_RULE }

    fn check(&self, manifest: &RendererOutputManifest, _registry: &RendererRegistry) -> RuleResult {
        let undeclared = &manifest.outputs.tokens.undeclared;
        if undeclared.is_empty() {
            RuleResult::pass(self.id(), "All tokens used are declared.")
        } else {
            RuleResult::fail(
                self.id(),
                format!("{} undeclared token(s) used.", undeclared.len()),
                undeclared.join(", "),
            )
        }
    }
}

pub struct ConstitutionComplianceRule;

impl ContractRule for ConstitutionComplianceRule {
    fn id(&self) -> &'static str { CONSTITUTION_COMPLIANCE_RULE }

    fn check(&self, manifest: &RendererOutputManifest, _registry: &RendererRegistry) -> RuleResult {
        let violations = &manifest.outputs.constitution_violations;
        if violations.is_empty() {
            RuleResult::pass(self.id(), "No constitution violations reported.")
        } else {
            RuleResult::fail(
                self.id(),
                format!("Renderer reported {} constitution violation(s).", violations.len()),
                violations.join(", "),
            )
        }
    }
}

pub struct DeterministicOutputRule;

impl ContractRule for DeterministicOutputRule {
    fn id(&self) -> &'static str { DETERMINISTIC_OUTPUT_RULE }

    fn check(&self, manifest: &RendererOutputManifest, _registry: &RendererRegistry) -> RuleResult {
        let determinism = &manifest.outputs.determinism;
        let markers = &determinism.markers;

        match (determinism.deterministic, markers.is_empty()) {
            (true, true) => RuleResult::pass(self.id(), "Renderer output is deterministic."),
            (false, true) => RuleResult::fail(
                self.id(),
                "Renderer output is explicitly nondeterministic.",
                "deterministic=false",
            ),
            (true, false) => RuleResult::fail(
                self.id(),
                "Renderer output has nondeterminism markers present.",
                markers.join(", "),
            ),
            (false, false) => RuleResult::fail(
                self.id(),
                "Renderer output is explicitly nondeterministic and has nondeterminism markers present.",
                format!("deterministic=false; {}", markers.join(", ")),
            ),
        }
    }
}

fn schema_rule(id: &str, subject: &str, errors: &[SchemaError]) -> RuleResult {
    if errors.is_empty() {
        RuleResult::pass(id, format!("{} conforms to schema.", subject))
    } else {
        RuleResult::fail(
            id,
            format!("{} failed schema validation.", subject),
            format_schema_errors(errors),
        )
    }
}

/// Validator orchestrates the schema gates and the semantic rules
pub struct RendererContractValidator {
    schema_validator: Box<dyn SchemaValidator + Send + Sync>,
    rules: Vec<Box<dyn ContractRule>>,
}

impl RendererContractValidator {
    pub fn new() -> Self {
        Self::with_schema_validator(Box::new(JsonSchemaValidator))
    }

    pub fn with_schema_validator(schema_validator: Box<dyn SchemaValidator + Send + Sync>) -> Self {
        Self {
            schema_validator,
            rules: vec![
                Box::new(DeclaredContractRule),
                Box::new(RegistrationRule),
                Box::new(RegistryContractRule),
                Box::new(TokenUsageRule),
                Box::new(ConstitutionComplianceRule),
                Box::new(DeterministicOutputRule),
            ],
        }
    }

    /// Evaluate one manifest against the registry.
    ///
    /// `Err` only when a schema itself cannot be compiled.
    pub fn validate(
        &self,
        manifest_document: &Value,
        registry_document: &Value,
        contract_schema: &Value,
        registry_schema: &Value,
    ) -> Result<RendererValidationReport, SchemaCompileError> {
        let validator = self.schema_validator.as_ref();
        let manifest: Validated<RendererOutputManifest> =
            upgrade(validator, manifest_document, contract_schema)?;
        let registry: Validated<RendererRegistry> =
            upgrade(validator, registry_document, registry_schema)?;

        let rules = vec![
            schema_rule(MANIFEST_SCHEMA_RULE, "Renderer manifest", manifest.errors()),
            schema_rule(REGISTRY_SCHEMA_RULE, "Renderer registry", registry.errors()),
        ];

        let (manifest, registry) = match (manifest.into_valid(), registry.into_valid()) {
            (Some(m), Some(r)) => (m, r),
            _ => {
                tracing::info!("renderer documents failed schema validation; skipping semantic rules");
                return Ok(RendererValidationReport::from_rules(RendererIdentity::unknown(), rules));
            }
        };

        Ok(self.check(&manifest, &registry, rules))
    }

    /// Run the semantic rules against already validated documents.
    pub fn check_typed(
        &self,
        manifest: &RendererOutputManifest,
        registry: &RendererRegistry,
    ) -> RendererValidationReport {
        self.check(manifest, registry, vec![])
    }

    fn check(
        &self,
        manifest: &RendererOutputManifest,
        registry: &RendererRegistry,
        mut rules: Vec<RuleResult>,
    ) -> RendererValidationReport {
        for rule in &self.rules {
            let result = rule.check(manifest, registry);
            tracing::debug!(rule = result.id.as_str(), passed = result.passed, "contract rule evaluated");
            rules.push(result);
        }

        let report = RendererValidationReport::from_rules(manifest.identity(), rules);
        tracing::info!(
            renderer = %report.renderer,
            status = ?report.status,
            failures = report.errors.len(),
            "contract evaluation complete"
        );
        report
    }
}

impl Default for RendererContractValidator {
    fn default() -> Self {
        Self::new()
    }
}
