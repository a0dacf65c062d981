mod config;
mod logging;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use resalloc_solver::report::{ComparisonReport, SolveReport};
use resalloc_solver::scenario::{Portfolio, ProductionMix, ProductionWhatIf};
use resalloc_solver::{
    ComparisonOutcome, DualityAnalyzer, IntegerResolver, Problem, ProblemDefinition, SensitivityEngine, SolveStatus,
    Solver,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::logging::LogFormat;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "resalloc")]
#[command(about = "Optimal allocation of limited resources with shadow prices and what-if analysis", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level or filter directive, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a JSON problem definition
    Solve {
        /// The problem definition file
        file: PathBuf,
        /// Also look for a whole-unit allocation
        #[arg(long)]
        integer: bool,
        /// Price constraints by re-solving with relaxed limits
        #[arg(long)]
        finite_difference: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Solve two versions of a problem and show what changed
    Compare {
        /// The baseline problem definition
        base: PathBuf,
        /// The modified problem definition
        perturbed: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Check a problem definition for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Solve a built-in scenario
    Demo {
        #[arg(value_enum)]
        scenario: Scenario,
        /// Material cost change, percent
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        material_change: f64,
        /// Workers added or removed
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        worker_change: f64,
        /// Phone profit change, percent
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        phone_profit_change: f64,
        /// Tablet profit change, percent
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        tablet_profit_change: f64,
        /// Also look for a whole-unit allocation
        #[arg(long)]
        integer: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Production,
    Portfolio,
}

#[derive(Serialize)]
struct DemoReport {
    solve: SolveReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    what_if: Option<ComparisonReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match AppConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e:#}");
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    config.logging.init();

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        // Solved, but not to optimality
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every solve reached an optimum
fn run(command: Commands, config: &AppConfig) -> Result<bool> {
    match command {
        Commands::Solve {
            file,
            integer,
            finite_difference,
            format,
        } => {
            let problem = load_problem(&file)?;
            info!(file = %file.display(), variables = problem.num_variables(), "solving");
            let report = solve_report(&problem, config, integer, finite_difference);
            match format {
                OutputFormat::Json => output::print_json(&report)?,
                OutputFormat::Text => output::print_solve(&report),
            }
            Ok(report.status == SolveStatus::Optimal)
        }
        Commands::Compare {
            base,
            perturbed,
            format,
        } => {
            let base_problem = load_problem(&base)?;
            let perturbed_problem = load_problem(&perturbed)?;
            let comparison = SensitivityEngine::from_config(&config.solver)
                .compare(&base_problem, &perturbed_problem)
                .with_context(|| format!("cannot compare {} with {}", base.display(), perturbed.display()))?;
            let report = ComparisonReport::from(&comparison);
            match format {
                OutputFormat::Json => output::print_json(&report)?,
                OutputFormat::Text => output::print_comparison(&report),
            }
            Ok(report.outcome == ComparisonOutcome::Compared)
        }
        Commands::Check { file } => match load_problem(&file) {
            Ok(problem) => {
                println!("✓ {} is valid", file.display());
                output::print_summary(&problem);
                Ok(true)
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {e:#}");
                Ok(false)
            }
        },
        Commands::Demo {
            scenario,
            material_change,
            worker_change,
            phone_profit_change,
            tablet_profit_change,
            integer,
            format,
        } => {
            let what_if = ProductionWhatIf {
                material_cost_change: material_change,
                worker_change,
                phone_profit_change,
                tablet_profit_change,
            };
            let report = demo(scenario, &what_if, config, integer)?;
            match format {
                OutputFormat::Json => output::print_json(&report)?,
                OutputFormat::Text => {
                    output::print_solve(&report.solve);
                    if let Some(what_if) = &report.what_if {
                        println!();
                        println!("What if:");
                        output::print_comparison(what_if);
                    }
                }
            }
            Ok(report.solve.status == SolveStatus::Optimal)
        }
    }
}

fn load_problem(path: &Path) -> Result<Problem> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let definition: ProblemDefinition = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid problem definition", path.display()))?;
    Problem::from_definition(&definition).with_context(|| format!("{} describes an invalid problem", path.display()))
}

fn solve_report(problem: &Problem, config: &AppConfig, integer: bool, finite_difference: bool) -> SolveReport {
    let solution = Solver::from_config(&config.solver).solve(problem);
    info!(status = ?solution.status, iterations = solution.iterations, "solved");

    let mut analysis = config.analysis;
    analysis.finite_difference |= finite_difference;
    let prices = DualityAnalyzer::from_config(&config.solver, &analysis).analyze(problem, &solution);

    let integer = integer.then(|| {
        IntegerResolver::from_config(&config.integer)
            .with_tolerance(config.solver.binding_tolerance)
            .round_to_feasible(problem, &solution)
    });
    SolveReport::new(&solution, &prices, integer.as_ref())
}

fn demo(scenario: Scenario, what_if: &ProductionWhatIf, config: &AppConfig, integer: bool) -> Result<DemoReport> {
    match scenario {
        Scenario::Production => {
            let mix = ProductionMix::default();
            let problem = mix.problem()?;
            let solve = solve_report(&problem, config, integer, false);
            let what_if = if what_if.is_empty() {
                None
            } else {
                let comparison =
                    SensitivityEngine::from_config(&config.solver).what_if(&problem, &what_if.perturbations(&mix))?;
                Some(ComparisonReport::from(&comparison))
            };
            Ok(DemoReport { solve, what_if })
        }
        Scenario::Portfolio => {
            if !what_if.is_empty() {
                warn!("what-if flags only apply to the production scenario");
            }
            let problem = Portfolio::default().problem()?;
            Ok(DemoReport {
                solve: solve_report(&problem, config, integer, false),
                what_if: None,
            })
        }
    }
}
