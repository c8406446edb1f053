//! CLI entrypoint for the riskgate harness.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use riskgate_core::ControllerConfig;
use riskgate_harness::seed::{parse_seed, seed_from_env};
use riskgate_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, check_trace_segment, validate_log_file,
};
use riskgate_harness::{ScenarioReport, ScenarioRunner, ScenarioSet, TracingSink};
use tracing_subscriber::EnvFilter;

/// Scenario replay and decision-log tooling for riskgate.
#[derive(Debug, Parser)]
#[command(name = "riskgate-harness")]
#[command(about = "Scenario replay and decision-log tooling for riskgate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the built-in demo session and print the final stats as JSON.
    Demo {
        /// RNG seed, decimal or 0x-prefixed hex (e.g. "0xDEAD_BEEF").
        #[arg(long)]
        seed: Option<String>,
        /// Write every decision record to this JSONL file.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Replay a scenario fixture and check its expectations.
    RunScenario {
        /// Scenario fixture JSON path.
        #[arg(long)]
        fixture: PathBuf,
        /// Controller configuration JSON; overrides the fixture's own.
        #[arg(long)]
        config: Option<PathBuf>,
        /// RNG seed; overrides the fixture's seed and RISKGATE_SEED.
        #[arg(long)]
        seed: Option<String>,
        /// Write every decision record to this JSONL file.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Write the JSON report here instead of stdout.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Controller identity used in trace ids; must not contain "::".
        #[arg(long, default_value = "riskgate", value_parser = parse_controller_id)]
        controller_id: String,
    },
    /// Schema-check a JSONL decision log.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_controller_id(raw: &str) -> Result<String, String> {
    check_trace_segment("controller id", raw)
        .map(|()| raw.to_string())
        .map_err(|err| err.to_string())
}

/// `--seed` wins over `RISKGATE_SEED`, which wins over the fixture.
fn resolve_seed(flag: Option<&str>) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    match flag {
        Some(raw) => Ok(Some(parse_seed(raw)?)),
        None => Ok(seed_from_env()),
    }
}

fn run_id() -> String {
    format!("run-{}", chrono::Utc::now().timestamp())
}

/// Replay `set`, teeing records to `tracing` and, when requested, a JSONL log.
fn replay(
    runner: &ScenarioRunner,
    set: &ScenarioSet,
    controller_id: &str,
    log: Option<&Path>,
) -> Result<ScenarioReport, Box<dyn std::error::Error>> {
    let run_id = run_id();
    let emitter = match log {
        Some(path) => {
            Some(LogEmitter::to_file(path, controller_id, &run_id)?.with_scenario(&set.name))
        }
        None => None,
    };

    let started = Instant::now();
    let (report, (_, emitter)) =
        runner.run_with_sink(set, (TracingSink::new(controller_id), emitter))?;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if let (Some(mut emitter), Some(path)) = (emitter, log) {
        let outcome = if report.all_passed() {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        let index_path = path.with_extension("index.json");
        emitter.emit_entry(
            LogEntry::new("", LogLevel::Info, "scenario_finished")
                .with_outcome(outcome)
                .with_duration_ms(duration_ms)
                .with_artifacts(vec![index_path.display().to_string()])
                .with_details(serde_json::to_value(report.stats)?),
        )?;
        emitter.finish()?;

        let mut index = ArtifactIndex::new(&run_id, controller_id);
        index.add_file(path, "decision_log")?;
        std::fs::write(&index_path, index.to_json()?)?;
        eprintln!(
            "Decision log: {} (index {})",
            path.display(),
            index_path.display()
        );
    }
    Ok(report)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Demo { seed, log } => {
            let set = ScenarioSet::demo();
            let runner = ScenarioRunner::new("demo").with_seed(resolve_seed(seed.as_deref())?);
            let report = replay(&runner, &set, "demo", log.as_deref())?;
            for step in &report.steps {
                eprintln!("[{:02}] {:<14} {}", step.index, step.op, step.detail);
            }
            println!("{}", serde_json::to_string_pretty(&report.stats)?);
        }
        Command::RunScenario {
            fixture,
            config,
            seed,
            log,
            report,
            controller_id,
        } => {
            eprintln!("Replaying scenario {}", fixture.display());
            let set = ScenarioSet::from_file(&fixture)?;
            let config = config
                .map(|path| ControllerConfig::from_file(&path))
                .transpose()?;
            let runner = ScenarioRunner::new(&controller_id)
                .with_seed(resolve_seed(seed.as_deref())?)
                .with_config(config);
            let result = replay(&runner, &set, &controller_id, log.as_deref())?;

            let json = result.to_json()?;
            match report {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    eprintln!("Report written to {}", path.display());
                }
                None => println!("{json}"),
            }

            eprintln!(
                "Scenario '{}': {} passed, {} failed",
                result.scenario, result.passed, result.failed
            );
            if !result.all_passed() {
                for step in result.failures() {
                    let mismatches = step.mismatches.join("; ");
                    eprintln!("  step {} ({}): {mismatches}", step.index, step.op);
                }
                std::process::exit(1);
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            if errors.is_empty() {
                eprintln!("{}: {lines} lines, all valid", log.display());
            } else {
                for err in &errors {
                    eprintln!("{err}");
                }
                return Err(format!(
                    "{}: {} violation(s) in {lines} lines",
                    log.display(),
                    errors.len()
                )
                .into());
            }
        }
    }

    Ok(())
}
