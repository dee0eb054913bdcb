//! Gate Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of both evaluators
//! against the shipped schemas and ruleset.

use rendergate_core::{
    contract::{DETERMINISTIC_OUTPUT_RULE, MANIFEST_SCHEMA_RULE, REGISTRY_SCHEMA_RULE},
    gate::load_document,
    taste::{DENSITY_LIMIT_RULE, HIERARCHY_RULE, MAX_SIZES_RULE, PATTERN_INTENT_RULE},
    ComplianceGate, DesignIntentTaste, GateConfig, RendererContractValidator, RendererIdentity,
    RendererOutputManifest, ReportStatus, RuleMetadata, TasteEvaluator, TasteOptions, TasteReport,
    TasteRuleset, TasteSources, VisualConstitution,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn repo_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn contract_schema() -> Value {
    load_document(&repo_path("schemas/renderer-output.schema.json")).unwrap()
}

fn registry_schema() -> Value {
    load_document(&repo_path("schemas/renderer-registry.schema.json")).unwrap()
}

fn ruleset() -> TasteRuleset {
    load_document(&repo_path("governance/taste-ruleset.json")).unwrap()
}

fn manifest_doc() -> Value {
    json!({
        "contract": {"id": "renderer-output/v1"},
        "renderer": {
            "name": "web-shell",
            "version": "2.1.0",
            "target": "web",
            "declares_contract": "renderer-output/v1"
        },
        "inputs": {
            "design_intent": {"path": "intent.json", "checksum": "sha256:9f2c"},
            "constitution": {"path": "constitution.json", "version": "1.0.0"}
        },
        "outputs": {
            "artifact": {"path": "dist/index.html", "kind": "html"},
            "tokens": {"declared": ["color.ink", "color.paper"], "undeclared": []},
            "patterns": ["modal", "toast"],
            "constitution_violations": [],
            "determinism": {"deterministic": true, "markers": []}
        },
        "taste": {
            "typography": {
                "sizes": [32, 24, 16],
                "roles": [
                    {"role": "h1", "size": 32},
                    {"role": "h2", "size": 24},
                    {"role": "body", "size": 16}
                ]
            },
            "spacing": {"values": [4, 8, 16, 24]},
            "color": {
                "tokens": ["color.ink", "color.paper"],
                "contrast_pairs": [{"foreground": "color.ink", "background": "color.paper", "ratio": 7.2}]
            },
            "density": {"interactions_per_view": 6},
            "consistency": {"radius": [4, 4, 8], "elevation": [0, 1], "motion": ["ease-out"]},
            "patterns": [
                {"pattern": "modal", "intent": "confirm"},
                {"pattern": "toast", "intent": "notify"}
            ]
        }
    })
}

fn registry_doc() -> Value {
    json!({
        "version": "2026.10",
        "renderers": [{
            "name": "web-shell",
            "version": "2.1.0",
            "target": "web",
            "contract_id": "renderer-output/v1"
        }]
    })
}

fn constitution_doc() -> Value {
    json!({
        "version": "1.0.0",
        "typography": {
            "max_sizes": 4,
            "roles": {
                "h1": {"min": 24, "max": 40},
                "h2": {"min": 18, "max": 28},
                "body": {"min": 14, "max": 18}
            },
            "hierarchy": ["h1", "h2", "body"]
        },
        "spacing": {"allowed": [4, 8, 12, 16, 24], "max_variance": 20},
        "color": {"allowed_tokens": ["color.ink", "color.paper", "color.accent"], "min_contrast": 4.5},
        "density": {"max_interactions_per_view": 12},
        "consistency": {
            "radius": {"allowed": [2, 4, 8], "max_variance": 6},
            "elevation": {"allowed": [0, 1, 2], "max_variance": 2},
            "motion": {"allowed": ["ease-out", "linear"], "max_variance": 0}
        },
        "patterns": {
            "allowed": ["modal", "toast"],
            "intents": {"modal": ["confirm", "alert"], "toast": ["notify"]}
        }
    })
}

fn intent_doc() -> Value {
    json!({"project": "storefront", "density": {"limit": 8}})
}

fn typed<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

fn evaluate_taste(manifest: Value, constitution: Value, intent: Value, options: TasteOptions) -> TasteReport {
    let manifest: RendererOutputManifest = typed(manifest);
    let constitution: VisualConstitution = typed(constitution);
    let intent: DesignIntentTaste = typed(intent);
    TasteEvaluator::new(ruleset()).evaluate(&manifest, &constitution, &intent, &options)
}

fn verbose() -> TasteOptions {
    TasteOptions { fail_fast: true, verbose: true }
}

fn rule<'a>(report: &'a TasteReport, id: &str) -> &'a rendergate_core::RuleResult {
    report.rules.iter().find(|r| r.id == id).unwrap()
}

// --- Contract ---

#[test]
fn invariant_valid_manifest_passes_contract() {
    let report = RendererContractValidator::new()
        .validate(&manifest_doc(), &registry_doc(), &contract_schema(), &registry_schema())
        .unwrap();

    assert_eq!(report.status, ReportStatus::Passed);
    assert_eq!(report.rules.len(), 8);
    assert!(report.errors.is_empty());
    assert_eq!(report.renderer, RendererIdentity::new("web-shell", "2.1.0", "web"));
}

#[test]
fn invariant_schema_invalid_manifest_yields_two_rules() {
    let mut manifest = manifest_doc();
    manifest["renderer"]["rogue"] = json!("x");

    let report = RendererContractValidator::new()
        .validate(&manifest, &registry_doc(), &contract_schema(), &registry_schema())
        .unwrap();

    assert_eq!(report.status, ReportStatus::Failed);
    assert_eq!(report.rules.len(), 2);
    assert_eq!(report.rules[0].id, MANIFEST_SCHEMA_RULE);
    assert!(!report.rules[0].passed);
    assert!(report.rules[1].passed);
    assert_eq!(report.renderer, RendererIdentity::unknown());
    assert_eq!(
        report.rules[0].counterexample.as_deref(),
        Some("renderer.rogue is not allowed")
    );
}

#[test]
fn invariant_schema_invalid_registry_yields_two_rules() {
    let report = RendererContractValidator::new()
        .validate(&manifest_doc(), &json!({"entries": []}), &contract_schema(), &registry_schema())
        .unwrap();

    assert_eq!(report.rules.len(), 2);
    assert_eq!(report.rules[1].id, REGISTRY_SCHEMA_RULE);
    assert!(report.rules[0].passed);
    assert!(!report.rules[1].passed);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.renderer, RendererIdentity::unknown());
}

#[test]
fn invariant_missing_root_field_renders_root_token() {
    let mut manifest = manifest_doc();
    manifest.as_object_mut().unwrap().remove("contract");

    let report = RendererContractValidator::new()
        .validate(&manifest, &registry_doc(), &contract_schema(), &registry_schema())
        .unwrap();

    let counterexample = report.rules[0].counterexample.clone().unwrap();
    assert!(counterexample.starts_with("(root) "), "{}", counterexample);
    assert!(counterexample.contains("contract"));
}

#[test]
fn invariant_determinism_requires_flag_and_no_markers() {
    let validator = RendererContractValidator::new();
    let cases = [
        (true, json!([]), true),
        (false, json!([]), false),
        (true, json!(["Math.random"]), false),
        (false, json!(["Math.random"]), false),
    ];

    for (deterministic, markers, expected) in cases {
        let mut manifest = manifest_doc();
        manifest["outputs"]["determinism"] = json!({"deterministic": deterministic, "markers": markers.clone()});

        let report = validator
            .validate(&manifest, &registry_doc(), &contract_schema(), &registry_schema())
            .unwrap();
        let result = report.rules.iter().find(|r| r.id == DETERMINISTIC_OUTPUT_RULE).unwrap();
        assert_eq!(result.passed, expected, "deterministic={} markers={}", deterministic, markers);
    }
}

#[test]
fn invariant_contract_evaluation_is_repeatable() {
    let mut manifest = manifest_doc();
    manifest["outputs"]["tokens"]["undeclared"] = json!(["color.neon"]);
    let validator = RendererContractValidator::new();

    let first = validator
        .validate(&manifest, &registry_doc(), &contract_schema(), &registry_schema())
        .unwrap();
    let second = validator
        .validate(&manifest, &registry_doc(), &contract_schema(), &registry_schema())
        .unwrap();

    assert_eq!(first.rules, second.rules);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.status, second.status);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

// --- Taste ---

#[test]
fn invariant_compliant_manifest_passes_all_taste_rules() {
    let report = evaluate_taste(manifest_doc(), constitution_doc(), intent_doc(), TasteOptions::default());

    assert_eq!(report.status, ReportStatus::Passed, "{:?}", report.errors);
    assert_eq!(report.rules.len(), 10);
    assert_eq!(report.rules.last().unwrap().id, PATTERN_INTENT_RULE);
    assert_eq!(report.ruleset_version, "1.0.0");
}

#[test]
fn invariant_fail_fast_truncates_after_first_failure() {
    let mut manifest = manifest_doc();
    manifest["taste"]["typography"]["sizes"] = json!([12, 14, 16, 20, 24]);

    let report = evaluate_taste(manifest, constitution_doc(), intent_doc(), TasteOptions::default());

    assert_eq!(report.rules.len(), 1);
    assert_eq!(report.rules[0].id, MAX_SIZES_RULE);
    assert_eq!(report.status, ReportStatus::Failed);
}

#[test]
fn invariant_verbose_runs_every_rule() {
    let mut manifest = manifest_doc();
    manifest["taste"]["typography"]["sizes"] = json!([12, 14, 16, 20, 24]);

    let report = evaluate_taste(manifest, constitution_doc(), json!({}), verbose());

    assert_eq!(report.rules.len(), 10);
    assert_eq!(report.rules.last().unwrap().id, PATTERN_INTENT_RULE);
    let failed: Vec<_> = report.errors.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(failed, vec![MAX_SIZES_RULE, DENSITY_LIMIT_RULE]);
}

#[test]
fn invariant_fail_fast_off_runs_every_rule() {
    let mut manifest = manifest_doc();
    manifest["taste"]["typography"]["sizes"] = json!([12, 14, 16, 20, 24]);

    let options = TasteOptions { fail_fast: false, verbose: false };
    let report = evaluate_taste(manifest, constitution_doc(), intent_doc(), options);
    assert_eq!(report.rules.len(), 10);
}

#[test]
fn invariant_hierarchy_inversion_names_both_roles() {
    let mut manifest = manifest_doc();
    manifest["taste"]["typography"] = json!({
        "sizes": [16, 20],
        "roles": [{"role": "h1", "size": 16}, {"role": "body", "size": 20}]
    });
    let mut constitution = constitution_doc();
    constitution["typography"]["roles"] = json!({"h1": {"min": 12, "max": 40}, "body": {"min": 12, "max": 24}});
    constitution["typography"]["hierarchy"] = json!(["h1", "body"]);

    let report = evaluate_taste(manifest, constitution, intent_doc(), verbose());
    let result = rule(&report, HIERARCHY_RULE);

    assert!(!result.passed);
    assert_eq!(result.counterexample.as_deref(), Some("h1(16) vs body(20)"));
}

#[test]
fn invariant_missing_density_limit_fails() {
    let mut manifest = manifest_doc();
    manifest["taste"]["density"]["interactions_per_view"] = json!(0);

    let report = evaluate_taste(manifest, constitution_doc(), json!({"project": "storefront"}), verbose());
    let result = rule(&report, DENSITY_LIMIT_RULE);

    assert!(!result.passed);
    assert_eq!(result.message, "Design intent missing density limit.");
}

#[test]
fn invariant_intent_pattern_mapping_replaces_constitution_mapping() {
    let mut manifest = manifest_doc();
    manifest["taste"]["patterns"] = json!([{"pattern": "modal", "intent": "alert"}]);

    let with_override = json!({"density": {"limit": 8}, "patterns": {"intents": {"modal": ["confirm"]}}});
    let report = evaluate_taste(manifest.clone(), constitution_doc(), with_override, TasteOptions::default());
    let result = rule(&report, PATTERN_INTENT_RULE);
    assert!(!result.passed);
    assert_eq!(result.counterexample.as_deref(), Some("modal:alert"));

    let without_override = evaluate_taste(manifest, constitution_doc(), intent_doc(), TasteOptions::default());
    assert!(rule(&without_override, PATTERN_INTENT_RULE).passed);
}

#[test]
fn invariant_no_pattern_policy_fails_any_usage() {
    let mut constitution = constitution_doc();
    constitution.as_object_mut().unwrap().remove("patterns");

    let report = evaluate_taste(manifest_doc(), constitution, intent_doc(), TasteOptions::default());
    let result = rule(&report, PATTERN_INTENT_RULE);
    assert!(!result.passed);
    assert_eq!(result.counterexample.as_deref(), Some("modal:confirm"));
}

#[test]
fn invariant_metadata_copied_from_ruleset_or_placeholder() {
    let report = evaluate_taste(manifest_doc(), constitution_doc(), intent_doc(), TasteOptions::default());
    let meta = rule(&report, HIERARCHY_RULE).metadata.clone().unwrap();
    assert_eq!(meta.clause, "TYP-2");

    let empty = TasteRuleset { version: "0.0.0".to_string(), rules: vec![] };
    let manifest: RendererOutputManifest = typed(manifest_doc());
    let report = TasteEvaluator::new(empty).evaluate(
        &manifest,
        &typed(constitution_doc()),
        &typed(intent_doc()),
        &TasteOptions::default(),
    );

    assert_eq!(report.status, ReportStatus::Passed);
    for r in &report.rules {
        assert_eq!(r.metadata, Some(RuleMetadata::placeholder()));
    }
}

#[test]
fn invariant_taste_evaluation_is_repeatable() {
    let mut manifest = manifest_doc();
    manifest["taste"]["spacing"]["values"] = json!([4, 6]);

    let first = evaluate_taste(manifest.clone(), constitution_doc(), intent_doc(), verbose());
    let second = evaluate_taste(manifest, constitution_doc(), intent_doc(), verbose());

    assert_eq!(first.rules, second.rules);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.status, second.status);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn invariant_shipped_ruleset_covers_every_rule() {
    let gate = ComplianceGate::new(GateConfig::default().rooted(Path::new(env!("CARGO_MANIFEST_DIR"))));
    let evaluator = gate.evaluator().unwrap();
    let ids: Vec<String> = ruleset().rules.into_iter().map(|r| r.id).collect();

    for id in evaluator.rule_ids() {
        assert!(ids.iter().any(|known| known == id), "ruleset missing {}", id);
    }
}

// --- Gate ---

fn write(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn gate_workspace() -> (TempDir, ComplianceGate) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("schemas")).unwrap();
    fs::copy(repo_path("schemas/renderer-output.schema.json"), root.join("schemas/renderer-output.schema.json")).unwrap();
    fs::copy(repo_path("schemas/renderer-registry.schema.json"), root.join("schemas/renderer-registry.schema.json")).unwrap();
    write(&root.join("governance/taste-ruleset.json"), &serde_json::to_value(ruleset()).unwrap());
    write(&root.join("renderers/registry.json"), &registry_doc());
    write(&root.join("out/web/constitution.json"), &constitution_doc());
    write(&root.join("out/web/intent.json"), &intent_doc());
    write(&root.join("out/web/shell.manifest.json"), &manifest_doc());

    let gate = ComplianceGate::new(GateConfig::default().rooted(root));
    (dir, gate)
}

#[test]
fn invariant_gate_runs_both_checks_from_files() {
    let (dir, gate) = gate_workspace();
    let manifests = gate.discover(&dir.path().join("out")).unwrap();
    assert_eq!(manifests, vec![dir.path().join("out/web/shell.manifest.json")]);

    let contract = gate.check_contract(&manifests[0]).unwrap();
    assert_eq!(contract.status, ReportStatus::Passed);

    let taste = gate
        .check_taste(&manifests[0], &TasteSources::default(), &TasteOptions::default())
        .unwrap();
    assert_eq!(taste.status, ReportStatus::Passed, "{:?}", taste.errors);

    let written = gate.persist_taste(&manifests[0], &taste).unwrap();
    assert_eq!(written, dir.path().join("reports/web-shell-2.1.0-web.taste.json"));
    let persisted: Value = load_document(&written).unwrap();
    assert_eq!(persisted["status"], "passed");
    assert_eq!(persisted["rules"].as_array().unwrap().len(), 10);
}

#[test]
fn invariant_gate_intent_override_wins() {
    let (dir, gate) = gate_workspace();
    let manifest = dir.path().join("out/web/shell.manifest.json");
    let strict_intent = dir.path().join("strict-intent.json");
    write(&strict_intent, &json!({"density": {"limit": 2}}));

    let sources = TasteSources { constitution: None, intent: Some(strict_intent) };
    let report = gate.check_taste(&manifest, &sources, &TasteOptions::default()).unwrap();

    assert_eq!(report.status, ReportStatus::Failed);
    assert_eq!(report.rules.last().unwrap().id, DENSITY_LIMIT_RULE);
}

#[test]
fn invariant_gate_missing_registry_is_setup_error() {
    let (dir, gate) = gate_workspace();
    fs::remove_file(dir.path().join("renderers/registry.json")).unwrap();

    let result = gate.check_contract(&dir.path().join("out/web/shell.manifest.json"));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("registry.json"));
}
