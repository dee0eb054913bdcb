//! Taste Evaluation - Ordered Style Governance Rules
//!
//! Rules run in a fixed order through a single loop. With fail-fast on and
//! verbose off, the loop stops at the first failing rule and the report holds
//! only what ran. The pattern rule is always last.

use std::collections::BTreeSet;

use crate::documents::{
    ConsistencyAxis, DesignIntentTaste, RendererOutputManifest, RuleCatalog, TasteRuleset,
    VisualConstitution,
};
use crate::rules::{RuleResult, TasteReport};

pub const MAX_SIZES_RULE: &str = "typography.max-sizes.rule";
pub const HIERARCHY_RULE: &str = "typography.hierarchy.rule";
pub const SPACING_ALLOWED_RULE: &str = "spacing.allowed-values.rule";
pub const SPACING_VARIANCE_RULE: &str = "spacing.variance.rule";
pub const COLOR_ALLOWED_RULE: &str = "color.allowed.rule";
pub const COLOR_CONTRAST_RULE: &str = "color.contrast.rule";
pub const DENSITY_LIMIT_RULE: &str = "density.limit.rule";
pub const CONSISTENCY_ALLOWED_RULE: &str = "consistency.allowed.rule";
pub const CONSISTENCY_VARIANCE_RULE: &str = "consistency.variance.rule";
pub const PATTERN_INTENT_RULE: &str = "patterns.intent.rule";

/// Documents one evaluation reads
pub struct TasteContext<'a> {
    pub manifest: &'a RendererOutputManifest,
    pub constitution: &'a VisualConstitution,
    pub intent: &'a DesignIntentTaste,
}

#[derive(Debug, Clone, Copy)]
pub struct TasteOptions {
    pub fail_fast: bool,
    pub verbose: bool,
}

impl TasteOptions {
    fn stops_on_failure(&self) -> bool {
        self.fail_fast && !self.verbose
    }
}

impl Default for TasteOptions {
    fn default() -> Self {
        Self { fail_fast: true, verbose: false }
    }
}

/// Outcome of one rule before metadata is attached
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub message: String,
    pub counterexample: Option<String>,
}

impl RuleOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { passed: true, message: message.into(), counterexample: None }
    }

    pub fn fail(message: impl Into<String>, counterexample: impl Into<String>) -> Self {
        Self { passed: false, message: message.into(), counterexample: Some(counterexample.into()) }
    }
}

pub trait TasteRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome;
}

fn spread(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn join_numbers(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

// --- Typography ---

pub struct MaxSizesRule;

impl TasteRule for MaxSizesRule {
    fn id(&self) -> &'static str { MAX_SIZES_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let mut distinct = ctx.manifest.taste.typography.sizes.clone();
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();

        let max = ctx.constitution.typography.max_sizes;
        if distinct.len() <= max {
            RuleOutcome::pass(format!("{} distinct font sizes within limit of {}.", distinct.len(), max))
        } else {
            RuleOutcome::fail(
                format!("Declared {} distinct font sizes; constitution allows {}.", distinct.len(), max),
                join_numbers(&distinct),
            )
        }
    }
}

pub struct HierarchyRule;

impl TasteRule for HierarchyRule {
    fn id(&self) -> &'static str { HIERARCHY_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let declared = &ctx.manifest.taste.typography.roles;
        let policy = &ctx.constitution.typography;

        for decl in declared {
            let Some(range) = policy.roles.get(&decl.role) else {
                return RuleOutcome::fail(
                    format!("Typography role '{}' is not defined by the constitution.", decl.role),
                    decl.role.clone(),
                );
            };
            if !range.contains(decl.size) {
                return RuleOutcome::fail(
                    format!(
                        "Typography role '{}' size {} is outside [{}, {}].",
                        decl.role, decl.size, range.min, range.max
                    ),
                    format!("{}({})", decl.role, decl.size),
                );
            }
        }

        // Hierarchy runs largest to smallest; undeclared roles drop out.
        let present: Vec<(&str, f64)> = policy
            .hierarchy
            .iter()
            .filter_map(|name| {
                declared
                    .iter()
                    .find(|d| d.role == *name)
                    .map(|d| (name.as_str(), d.size))
            })
            .collect();

        for pair in present.windows(2) {
            let (upper, upper_size) = pair[0];
            let (lower, lower_size) = pair[1];
            if upper_size < lower_size {
                return RuleOutcome::fail(
                    format!("Typography hierarchy inverted: {} is smaller than {}.", upper, lower),
                    format!("{}({}) vs {}({})", upper, upper_size, lower, lower_size),
                );
            }
        }

        RuleOutcome::pass("Typography roles are within range and in hierarchy order.")
    }
}

// --- Spacing ---

pub struct SpacingAllowedRule;

impl TasteRule for SpacingAllowedRule {
    fn id(&self) -> &'static str { SPACING_ALLOWED_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let allowed = &ctx.constitution.spacing.allowed;
        let offending = ctx
            .manifest
            .taste
            .spacing
            .values
            .iter()
            .find(|v| !allowed.contains(v));

        match offending {
            None => RuleOutcome::pass("All spacing values are on the allowed scale."),
            Some(v) => RuleOutcome::fail(
                format!("Spacing value {} is not on the allowed scale.", v),
                v.to_string(),
            ),
        }
    }
}

pub struct SpacingVarianceRule;

impl TasteRule for SpacingVarianceRule {
    fn id(&self) -> &'static str { SPACING_VARIANCE_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let max_variance = ctx.constitution.spacing.max_variance;
        let (lo, hi) = spread(ctx.manifest.taste.spacing.values.iter().copied()).unwrap_or((0.0, 0.0));
        let variance = hi - lo;

        if variance <= max_variance {
            RuleOutcome::pass(format!("Spacing variance {} within {}.", variance, max_variance))
        } else {
            RuleOutcome::fail(
                format!("Spacing variance {} exceeds {}.", variance, max_variance),
                format!("{} to {}", lo, hi),
            )
        }
    }
}

// --- Color ---

pub struct ColorAllowedRule;

impl TasteRule for ColorAllowedRule {
    fn id(&self) -> &'static str { COLOR_ALLOWED_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let allowed = &ctx.constitution.color.allowed_tokens;
        match ctx.manifest.taste.color.tokens.iter().find(|t| !allowed.contains(t)) {
            None => RuleOutcome::pass("All color tokens are allowed."),
            Some(token) => RuleOutcome::fail(
                format!("Color token {} is not allowed by the constitution.", token),
                token.clone(),
            ),
        }
    }
}

pub struct ContrastRule;

impl TasteRule for ContrastRule {
    fn id(&self) -> &'static str { COLOR_CONTRAST_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let floor = ctx.constitution.color.min_contrast;
        let offending = ctx
            .manifest
            .taste
            .color
            .contrast_pairs
            .iter()
            .find(|pair| pair.ratio < floor);

        match offending {
            None => RuleOutcome::pass(format!("All contrast pairs meet {}.", floor)),
            Some(pair) => RuleOutcome::fail(
                format!(
                    "Contrast {} for {} on {} is below {}.",
                    pair.ratio, pair.foreground, pair.background, floor
                ),
                format!("{}/{} ({})", pair.foreground, pair.background, pair.ratio),
            ),
        }
    }
}

// --- Density ---

pub struct DensityRule;

impl TasteRule for DensityRule {
    fn id(&self) -> &'static str { DENSITY_LIMIT_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        let interactions = ctx.manifest.taste.density.interactions_per_view;

        // A missing limit is a policy gap, not a skip. No manifest value is at fault.
        let Some(limit) = ctx.intent.density.limit else {
            return RuleOutcome {
                passed: false,
                message: "Design intent missing density limit.".to_string(),
                counterexample: None,
            };
        };

        if interactions <= limit {
            RuleOutcome::pass(format!("{} interactions per view within limit of {}.", interactions, limit))
        } else {
            RuleOutcome::fail(
                format!("{} interactions per view exceeds limit of {}.", interactions, limit),
                format!("interactions_per_view={}", interactions),
            )
        }
    }
}

// --- Consistency ---

pub struct ConsistencyAllowedRule;

impl TasteRule for ConsistencyAllowedRule {
    fn id(&self) -> &'static str { CONSISTENCY_ALLOWED_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        for axis in ConsistencyAxis::ALL {
            let band = ctx.constitution.consistency.band(axis);
            let values = ctx.manifest.taste.consistency.values(axis);

            if let Some(v) = values.iter().find(|v| !band.allowed.contains(v)) {
                return RuleOutcome::fail(
                    format!("Consistency {} value {} is not allowed.", axis.name(), v),
                    format!("{}={}", axis.name(), v),
                );
            }
        }
        RuleOutcome::pass("All consistency values are allowed.")
    }
}

pub struct ConsistencyVarianceRule;

impl TasteRule for ConsistencyVarianceRule {
    fn id(&self) -> &'static str { CONSISTENCY_VARIANCE_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        for axis in ConsistencyAxis::ALL {
            let Some(max_variance) = ctx.constitution.consistency.band(axis).max_variance else {
                continue;
            };
            let values = ctx.manifest.taste.consistency.values(axis);

            let numbers: Option<Vec<f64>> = values.iter().map(|v| v.as_number()).collect();
            match numbers {
                Some(numbers) => {
                    let Some((lo, hi)) = spread(numbers) else { continue };
                    if hi - lo > max_variance {
                        return RuleOutcome::fail(
                            format!(
                                "Consistency {} variance {} exceeds {}.",
                                axis.name(),
                                hi - lo,
                                max_variance
                            ),
                            format!("{}: {} to {}", axis.name(), lo, hi),
                        );
                    }
                }
                None => {
                    // Named values have no numeric spread; only a zero band forbids disagreement.
                    let distinct: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
                    if max_variance == 0.0 && distinct.len() > 1 {
                        return RuleOutcome::fail(
                            format!("Consistency {} values disagree but variance is fixed at 0.", axis.name()),
                            format!(
                                "{}: {}",
                                axis.name(),
                                distinct.into_iter().collect::<Vec<_>>().join(", ")
                            ),
                        );
                    }
                }
            }
        }
        RuleOutcome::pass("Consistency variance within bands.")
    }
}

// --- Patterns ---

pub struct PatternIntentRule;

impl TasteRule for PatternIntentRule {
    fn id(&self) -> &'static str { PATTERN_INTENT_RULE }

    fn evaluate(&self, ctx: &TasteContext<'_>) -> RuleOutcome {
        for usage in &ctx.manifest.taste.patterns {
            let usage_ref = format!("{}:{}", usage.pattern, usage.intent);

            let Some(policy) = ctx.constitution.patterns.as_ref() else {
                return RuleOutcome::fail(
                    format!("Constitution defines no pattern policy; {} cannot be used.", usage.pattern),
                    usage_ref,
                );
            };

            if !policy.allowed.contains(&usage.pattern) {
                return RuleOutcome::fail(
                    format!("Pattern {} is not allowed by the constitution.", usage.pattern),
                    usage_ref,
                );
            }

            // Intent mapping replaces the constitution mapping for this pattern.
            let permitted: &[String] = ctx
                .intent
                .pattern_intents(&usage.pattern)
                .or_else(|| policy.intents.get(&usage.pattern).map(Vec::as_slice))
                .unwrap_or(&[]);

            if !permitted.contains(&usage.intent) {
                return RuleOutcome::fail(
                    format!("Pattern {} is not permitted for intent {}.", usage.pattern, usage.intent),
                    usage_ref,
                );
            }
        }
        RuleOutcome::pass("All pattern usages match permitted intents.")
    }
}

/// Evaluator owns the rule order and the ruleset metadata
pub struct TasteEvaluator {
    catalog: RuleCatalog,
    rules: Vec<Box<dyn TasteRule>>,
}

impl TasteEvaluator {
    pub fn new(ruleset: TasteRuleset) -> Self {
        Self {
            catalog: ruleset.into(),
            rules: vec![
                Box::new(MaxSizesRule),
                Box::new(HierarchyRule),
                Box::new(SpacingAllowedRule),
                Box::new(SpacingVarianceRule),
                Box::new(ColorAllowedRule),
                Box::new(ContrastRule),
                Box::new(DensityRule),
                Box::new(ConsistencyAllowedRule),
                Box::new(ConsistencyVarianceRule),
                Box::new(PatternIntentRule),
            ],
        }
    }

    pub fn ruleset_version(&self) -> &str {
        self.catalog.version()
    }

    /// Rule ids in evaluation order
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn evaluate(
        &self,
        manifest: &RendererOutputManifest,
        constitution: &VisualConstitution,
        intent: &DesignIntentTaste,
        options: &TasteOptions,
    ) -> TasteReport {
        let ctx = TasteContext { manifest, constitution, intent };
        let mut results = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let outcome = rule.evaluate(&ctx);
            let passed = outcome.passed;
            tracing::debug!(rule = rule.id(), passed, "taste rule evaluated");

            results.push(
                RuleResult::new(rule.id(), outcome.passed, outcome.message, outcome.counterexample)
                    .with_metadata(self.catalog.metadata(rule.id())),
            );

            if !passed && options.stops_on_failure() {
                break;
            }
        }

        let report = TasteReport::from_rules(manifest.identity(), self.catalog.version(), results);
        tracing::info!(
            renderer = %report.renderer,
            status = ?report.status,
            evaluated = report.rules.len(),
            failures = report.errors.len(),
            "taste evaluation complete"
        );
        report
    }
}
