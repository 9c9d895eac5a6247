//! Gridpilot command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use grid_locator::{GridLocator, VisualOracle};
use gridpilot_cli::llm::{HttpOracle, OracleClientConfig};
use gridpilot_cli::rehearsal;
use gridpilot_cli::report;
use gridpilot_cli::scenario::ScenarioFile;
use gridpilot_core_types::TestStatus;
use runner_core::{ExecutionCoordinator, RunnerConfig, RunnerError, RunnerOracle};
use scroll_control::ScrollController;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// Autonomous visual UI test runner.
#[derive(Parser)]
#[command(name = "gridpilot", version, long_version = LONG_VERSION, about)]
struct Cli {
    /// Path to a JSON test scenario file.
    scenario: Option<PathBuf>,

    /// Validate and print the plan without executing it.
    #[arg(long)]
    plan_only: bool,

    /// Verify oracle endpoint connectivity and credentials, then exit.
    #[arg(long)]
    check_api: bool,

    /// Oracle backing the run.
    #[arg(long, value_enum, default_value_t = OracleMode::Rehearsal)]
    oracle: OracleMode,

    /// Override the scenario's entry URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Run-level timeout (e.g. `300s`, `5m`). Defaults to the scenario's
    /// timeout, or 300s.
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Output directory for summary and journal files.
    #[arg(short, long, default_value = "reports")]
    output: PathBuf,

    /// Oracle endpoint for `--oracle http`.
    #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
    api_url: Url,

    /// Model identifier for `--oracle http`.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OracleMode {
    /// Deterministic offline oracle; interactions are simulated.
    Rehearsal,

    /// Live reasoning oracle over HTTP.
    Http,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.check_api {
        let oracle = http_oracle(&cli)?;
        oracle.check().await?;
        println!("Oracle endpoint reachable and responding.");
        return Ok(ExitCode::SUCCESS);
    }

    let Some(path) = cli.scenario.as_ref() else {
        bail!("no scenario file given; see --help");
    };

    let mut scenario = ScenarioFile::load(path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    if let Some(url) = &cli.url {
        scenario.url = url.clone();
        scenario.validate()?;
    }

    let run_timeout = cli
        .timeout
        .or_else(|| scenario.timeout_secs.map(Duration::from_secs))
        .unwrap_or(Duration::from_secs(300));
    let scenario_name = scenario.name.clone();
    let plan = scenario.into_plan()?;

    if cli.plan_only {
        println!("Test plan: {} ({} steps)", plan.name, plan.steps.len());
        for step in &plan.steps {
            let target = step.instruction.target.as_deref().unwrap_or("-");
            println!(
                "  {:>3}. [{}] {} -> {}",
                step.step_number, step.instruction.kind, target, step.description
            );
        }
        // Validation runs in the scheduler so cycles are reported here too.
        step_scheduler::StepScheduler::new(&plan)?;
        println!("Plan is valid.");
        return Ok(ExitCode::SUCCESS);
    }

    info!(scenario = %scenario_name, url = %plan.url, "starting run");

    let executor = rehearsal::rehearsal_executor();
    let (visual_oracle, runner_oracle): (Arc<dyn VisualOracle>, Arc<dyn RunnerOracle>) =
        match cli.oracle {
            OracleMode::Rehearsal => (
                rehearsal::rehearsal_visual_oracle(),
                rehearsal::rehearsal_runner_oracle(),
            ),
            OracleMode::Http => {
                // Interactions still go through the simulated executor; a
                // browser adapter plugs in at the ActionExecutor seam.
                warn!("no browser adapter configured; interactions are simulated");
                let oracle = Arc::new(http_oracle(&cli)?);
                (oracle.clone(), oracle)
            }
        };

    let locator = Arc::new(GridLocator::new(visual_oracle));
    let scroller = ScrollController::new(locator.clone(), executor.clone());
    let coordinator = ExecutionCoordinator::new(
        runner_oracle,
        locator,
        scroller,
        executor,
        RunnerConfig::default()
            .run_timeout(run_timeout)
            .scenario_name(scenario_name),
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling run");
            signal_token.cancel();
        }
    });

    match coordinator.run(plan, cancel).await {
        Ok(report) => {
            report::print_summary(&report);
            let (summary_path, journal_path) = report::write_reports(&cli.output, &report)?;
            println!();
            println!("Summary written to {}", summary_path.display());
            println!("Journal written to {}", journal_path.display());
            if report.summary.status == TestStatus::Completed {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
        Err(RunnerError::RunTimeout(budget)) => {
            eprintln!("Error: run timed out after {budget:?}");
            Ok(ExitCode::from(2))
        }
        Err(RunnerError::Cancelled) => {
            eprintln!("Run cancelled.");
            Ok(ExitCode::from(130))
        }
        Err(err) => Err(err.into()),
    }
}

fn http_oracle(cli: &Cli) -> anyhow::Result<HttpOracle> {
    let api_key = std::env::var("GRIDPILOT_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .context("set GRIDPILOT_API_KEY (or OPENAI_API_KEY) for --oracle http")?;
    HttpOracle::new(OracleClientConfig::new(
        cli.api_url.clone(),
        cli.model.clone(),
        api_key,
    ))
}
