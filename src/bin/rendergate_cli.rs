//! RenderGate CLI - Build-Time Compliance Gate
//!
//! Commands: contract, taste, discover
//! Writes one JSON report per manifest, prints a summary line per report.
//! Exit 0 when every report passed, 1 when any failed, 2 on setup errors.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use rendergate_core::{
    ComplianceGate, GateConfig, GateError, RuleResult, TasteOptions, TasteSources, ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "rendergate-cli")]
#[command(about = "RenderGate CLI - renderer contract and taste gate")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root that relative config paths resolve against
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// JSON config file overriding default document locations
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ManifestSelection {
    /// A single renderer output manifest
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Check every *.manifest.json under this directory
    #[arg(long)]
    all: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check renderer manifests against the output contract and registry
    Contract {
        #[command(flatten)]
        selection: ManifestSelection,
    },

    /// Check renderer manifests against the visual constitution
    Taste {
        #[command(flatten)]
        selection: ManifestSelection,

        /// Constitution to use instead of the manifest's reference
        #[arg(long)]
        constitution: Option<PathBuf>,

        /// Design intent to use instead of the manifest's reference
        #[arg(long)]
        intent: Option<PathBuf>,

        /// Keep evaluating after the first failing rule
        #[arg(long)]
        no_fail_fast: bool,

        /// Run every rule regardless of failures
        #[arg(short, long)]
        verbose: bool,
    },

    /// List discovered manifests as JSON
    Discover {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<GateConfig, GateError> {
    let config = match &cli.config {
        Some(path) => GateConfig::load(path)?,
        None => GateConfig::default(),
    };
    Ok(config.rooted(&cli.root))
}

fn select_manifests(gate: &ComplianceGate, selection: &ManifestSelection) -> Result<Vec<PathBuf>, GateError> {
    match (&selection.manifest, &selection.all) {
        (Some(path), _) => Ok(vec![path.clone()]),
        (None, Some(dir)) => gate.discover(dir),
        (None, None) => Ok(vec![]),
    }
}

fn print_failure(manifest: &Path, rule: &RuleResult) {
    println!("FAIL {} [{}] {}", manifest.display(), rule.id, rule.message);
    if let Some(counterexample) = &rule.counterexample {
        println!("     counterexample: {}", counterexample);
    }
    if let Some(meta) = &rule.metadata {
        println!("     clause: {}  intent: {}", meta.clause, meta.intent_reference);
    }
}

fn run(cli: Cli) -> Result<bool, GateError> {
    let gate = ComplianceGate::new(resolve_config(&cli)?);
    let mut all_passed = true;

    match &cli.command {
        Commands::Contract { selection } => {
            for manifest in select_manifests(&gate, selection)? {
                let report = gate.check_contract(&manifest)?;
                let written = gate.persist_contract(&manifest, &report)?;
                tracing::info!(report = %written.display(), "contract report written");

                match report.first_failure() {
                    None => println!("PASS {} ({})", manifest.display(), report.renderer),
                    Some(rule) => {
                        all_passed = false;
                        print_failure(&manifest, rule);
                    }
                }
            }
        }

        Commands::Taste { selection, constitution, intent, no_fail_fast, verbose } => {
            let sources = TasteSources {
                constitution: constitution.clone(),
                intent: intent.clone(),
            };
            let options = TasteOptions {
                fail_fast: !*no_fail_fast,
                verbose: *verbose,
            };

            for manifest in select_manifests(&gate, selection)? {
                let report = gate.check_taste(&manifest, &sources, &options)?;
                let written = gate.persist_taste(&manifest, &report)?;
                tracing::info!(
                    report = %written.display(),
                    ruleset = %report.ruleset_version,
                    fingerprint = %report.fingerprint()?,
                    "taste report written"
                );

                match report.first_failure() {
                    None => println!("PASS {} ({})", manifest.display(), report.renderer),
                    Some(rule) => {
                        all_passed = false;
                        print_failure(&manifest, rule);
                    }
                }
            }
        }

        Commands::Discover { dir } => {
            let manifests = gate.discover(dir)?;
            println!("{}", serde_json::to_string_pretty(&manifests)?);
        }
    }

    Ok(all_passed)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    tracing::debug!(engine = ENGINE_VERSION, "rendergate starting");

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            ExitCode::from(2)
        }
    }
}
