//! Rule/Report Model - Shared Outcome Shapes
//!
//! A rule produces exactly one `RuleResult`.
//! A report is the ordered rule list plus the failing subsequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::rules_fingerprint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
}

impl ReportStatus {
    pub fn from_errors(errors: &[RuleResult]) -> Self {
        if errors.is_empty() {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub fn is_passed(&self) -> bool {
        *self == Self::Passed
    }
}

/// Human-facing metadata attached to a taste rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleMetadata {
    pub description: String,
    pub clause: String,
    pub intent_reference: String,
    pub remediation: String,
}

impl RuleMetadata {
    /// Stand-in for ids the ruleset does not know about.
    pub fn placeholder() -> Self {
        Self {
            description: "Rule metadata not found; update ruleset.".to_string(),
            clause: "unspecified".to_string(),
            intent_reference: "unspecified".to_string(),
            remediation: "Review rule definition.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleResult {
    pub id: String,
    pub passed: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterexample: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RuleMetadata>,
}

impl RuleResult {
    pub fn new(
        id: impl Into<String>,
        passed: bool,
        message: impl Into<String>,
        counterexample: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            passed,
            message: message.into(),
            counterexample,
            metadata: None,
        }
    }

    pub fn pass(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, true, message, None)
    }

    pub fn fail(id: impl Into<String>, message: impl Into<String>, counterexample: impl Into<String>) -> Self {
        Self::new(id, false, message, Some(counterexample.into()))
    }

    pub fn with_metadata(mut self, metadata: RuleMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Renderer identity echoed into every report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RendererIdentity {
    pub name: String,
    pub version: String,
    pub target: String,
}

impl RendererIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            target: target.into(),
        }
    }

    /// Used when the manifest failed its schema and cannot be read further.
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown", "unknown")
    }

    /// `name-version-target`, used for report file names.
    pub fn slug(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.target)
    }
}

impl std::fmt::Display for RendererIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.target)
    }
}

fn failing(rules: &[RuleResult]) -> Vec<RuleResult> {
    rules.iter().filter(|r| !r.passed).cloned().collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererValidationReport {
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
    pub renderer: RendererIdentity,
    pub rules: Vec<RuleResult>,
    pub errors: Vec<RuleResult>,
}

impl RendererValidationReport {
    pub fn from_rules(renderer: RendererIdentity, rules: Vec<RuleResult>) -> Self {
        Self::from_rules_at(renderer, rules, Utc::now())
    }

    pub fn from_rules_at(
        renderer: RendererIdentity,
        rules: Vec<RuleResult>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let errors = failing(&rules);
        Self {
            status: ReportStatus::from_errors(&errors),
            generated_at,
            renderer,
            rules,
            errors,
        }
    }

    pub fn first_failure(&self) -> Option<&RuleResult> {
        self.errors.first()
    }

    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        rules_fingerprint(self.status, &self.rules)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasteReport {
    pub status: ReportStatus,
    pub generated_at: DateTime<Utc>,
    pub ruleset_version: String,
    pub renderer: RendererIdentity,
    pub rules: Vec<RuleResult>,
    pub errors: Vec<RuleResult>,
}

impl TasteReport {
    pub fn from_rules(
        renderer: RendererIdentity,
        ruleset_version: impl Into<String>,
        rules: Vec<RuleResult>,
    ) -> Self {
        Self::from_rules_at(renderer, ruleset_version, rules, Utc::now())
    }

    pub fn from_rules_at(
        renderer: RendererIdentity,
        ruleset_version: impl Into<String>,
        rules: Vec<RuleResult>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let errors = failing(&rules);
        Self {
            status: ReportStatus::from_errors(&errors),
            generated_at,
            ruleset_version: ruleset_version.into(),
            renderer,
            rules,
            errors,
        }
    }

    pub fn first_failure(&self) -> Option<&RuleResult> {
        self.errors.first()
    }

    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        rules_fingerprint(self.status, &self.rules)
    }
}
