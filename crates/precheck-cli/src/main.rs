//! precheck - local pre-commit CI checks
//!
//! Runs, in order, the formatter, linter, type checker and tests-with-coverage
//! against the project that contains DIRECTORY (default: current directory),
//! stopping at the first failure. Suitable as a pre-commit hook: the exit
//! code is 0 only when every step passed.

use anyhow::Result;
use clap::{Args, Parser};
use precheck_ci::{init_tracing, Check, CheckError, CheckReport, Step, Toolchain};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "precheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run format, lint, type and test checks before committing", long_about = None)]
struct Cli {
    /// Directory inside the project to check (default: current directory)
    directory: Option<PathBuf>,

    /// Let the formatter and linter rewrite files
    #[arg(long)]
    fix: bool,

    /// Steps to skip (comma-separated: format,lint,types,tests)
    #[arg(long, value_delimiter = ',', env = "PRECHECK_SKIP")]
    skip: Vec<Step>,

    /// Kill any tool that runs longer than this many seconds
    #[arg(long, env = "PRECHECK_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the run report as JSON on success
    #[arg(long)]
    json: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    log_json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    tools: ToolArgs,
}

/// Overrides for the external programs.
#[derive(Args, Debug)]
struct ToolArgs {
    /// Program that launches each tool as `<runner> run <tool>` [default: uv]
    #[arg(long, env = "PRECHECK_RUNNER")]
    runner: Option<String>,

    /// Formatter [default: ruff]
    #[arg(long, env = "PRECHECK_FORMATTER")]
    formatter: Option<String>,

    /// Linter [default: ruff]
    #[arg(long, env = "PRECHECK_LINTER")]
    linter: Option<String>,

    /// Type checker [default: pyright]
    #[arg(long, env = "PRECHECK_TYPE_CHECKER")]
    type_checker: Option<String>,

    /// Test runner with coverage support [default: pytest]
    #[arg(long, env = "PRECHECK_TEST_TOOL")]
    test_tool: Option<String>,

    /// File that marks the project root [default: pyproject.toml]
    #[arg(long, env = "PRECHECK_MARKER")]
    marker: Option<String>,
}

impl ToolArgs {
    fn into_toolchain(self, timeout_secs: Option<u64>) -> Toolchain {
        let defaults = Toolchain::default();
        Toolchain {
            runner: self.runner.unwrap_or(defaults.runner),
            formatter: self.formatter.unwrap_or(defaults.formatter),
            linter: self.linter.unwrap_or(defaults.linter),
            type_checker: self.type_checker.unwrap_or(defaults.type_checker),
            test_tool: self.test_tool.unwrap_or(defaults.test_tool),
            marker: self.marker.unwrap_or(defaults.marker),
            timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress markers already go to stderr; keep logs quiet unless asked.
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.log_json, level);

    let json = cli.json;
    let report = cmd_check(cli).await.map_err(name_failed_step)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Build the pipeline from command-line options and run it.
async fn cmd_check(cli: Cli) -> Result<CheckReport> {
    let toolchain = cli.tools.into_toolchain(cli.timeout);
    let check = cli
        .skip
        .iter()
        .fold(Check::new(toolchain), |check, step| check.skip(*step));

    let report = check.run(cli.directory.as_deref(), cli.fix).await?;
    Ok(report)
}

/// Prefix a step failure with the step's label; the tool output stays in the
/// cause chain.
fn name_failed_step(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<CheckError>().and_then(CheckError::step) {
        Some(step) => err.context(format!("{} step failed", step.label())),
        None => err,
    }
}
