//! Tollgate Hospital Reference Runtime — Demo CLI
//!
//! Runs one or all of the three hospital scenarios, or previews how the
//! active policy classifies a single action. Each scenario uses real Tollgate
//! components (classifier, payload verifier, audit chain, governance engine)
//! wired together with mock hospital data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- procurement
//!   cargo run -p demo -- advisory
//!   cargo run -p demo -- kill-switch-drill
//!   cargo run -p demo -- classify PURCHASE_ORDER 300000
//!   cargo run -p demo -- --policy policies/strict.toml run-all

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollgate_contracts::{action::ActionKind, error::GovernanceResult};
use tollgate_core::traits::RiskClassifier;
use tollgate_policy::ThresholdClassifier;
use tollgate_ref_hospital::{
    scenarios::{advisory, kill_switch_drill, procurement},
    HospitalRuntime,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tollgate — governance for autonomous hospital agents.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Tollgate hospital reference runtime demo",
    long_about = "Runs Tollgate hospital scenarios showing risk tiering, human approval,\n\
                  the kill switch, payload checks, and audit chain integrity."
)]
struct Cli {
    /// Policy TOML to use instead of TOLLGATE_POLICY_PATH or the bundled policy.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three hospital scenarios in sequence.
    RunAll,
    /// Scenario 1: Quartermaster procurement (tiers, quorum, rejection).
    Procurement,
    /// Scenario 2: Press secretary advisories (payload checks, expiry).
    Advisory,
    /// Scenario 3: Kill switch drill (block, defer, resume).
    KillSwitchDrill,
    /// Show the tier and approval quorum for one action without proposing it.
    Classify {
        /// Action kind, e.g. PURCHASE_ORDER.
        kind: String,
        /// Cost, hours, recipients or value, depending on the kind.
        magnitude: f64,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Classify { kind, magnitude } => classify(cli.policy.as_ref(), &kind, magnitude),
        command => {
            print_banner();
            run_scenarios(cli.policy.as_ref(), command)
        }
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

fn load_classifier(policy: Option<&PathBuf>) -> GovernanceResult<ThresholdClassifier> {
    match policy {
        Some(path) => {
            info!(path = %path.display(), "using policy from command line");
            ThresholdClassifier::from_file(path)
        }
        None => ThresholdClassifier::from_env(),
    }
}

/// Every scenario gets a fresh runtime so their audit chains stay separate.
fn runtime(policy: Option<&PathBuf>) -> GovernanceResult<HospitalRuntime> {
    HospitalRuntime::with_classifier(load_classifier(policy)?)
}

fn run_scenarios(policy: Option<&PathBuf>, command: Command) -> GovernanceResult<()> {
    match command {
        Command::RunAll => {
            procurement::run(&runtime(policy)?)?;
            advisory::run(&runtime(policy)?)?;
            kill_switch_drill::run(&runtime(policy)?)?;
        }
        Command::Procurement => procurement::run(&runtime(policy)?)?,
        Command::Advisory => advisory::run(&runtime(policy)?)?,
        Command::KillSwitchDrill => kill_switch_drill::run(&runtime(policy)?)?,
        Command::Classify { .. } => {}
    }
    println!("All selected scenarios completed successfully.");
    Ok(())
}

fn classify(policy: Option<&PathBuf>, kind: &str, magnitude: f64) -> GovernanceResult<()> {
    let classifier = load_classifier(policy)?;
    let kind = ActionKind::from(kind);
    let tier = classifier.classify(&kind, magnitude)?;
    let requirement = classifier.requirement(&kind, tier);

    println!("{} @ {} → {}", kind, magnitude, tier);
    println!("  {}", classifier.explain(&kind, magnitude, tier));
    if requirement.is_autonomous() {
        println!("  executes autonomously");
    } else {
        println!("  requires {}", requirement);
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Tollgate — Governance for Autonomous Hospital Agents");
    println!("Hospital Reference Demo");
    println!("====================================================");
    println!();
    println!("Tollgate pipeline per proposed action:");
    println!("  [1] Payload checked against the kind's schema and custom checks");
    println!("  [2] Magnitude classified into LOW / MEDIUM / HIGH / CRITICAL");
    println!("  [3] Kill switch active → BLOCKED, whatever the tier");
    println!("  [4] LOW → executed once, autonomously");
    println!("  [5] Otherwise → held until the approval quorum is met; one REJECT ends it");
    println!("  [6] Every disposition appended to the SHA-256 audit chain");
    println!();
}
