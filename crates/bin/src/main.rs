//! Sipfolio CLI binary.
//!
//! Provides a command-line interface to the SIP portfolio planner.

use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use sipfolio::allocation::OptimizationMethod;
use sipfolio::data::{InstrumentUniverse, load_universe_csv};
use sipfolio::output::{ExportError, ExportFormat, Exporter, ReportError};
use sipfolio::selection::{PegSelector, SelectionResult};
use sipfolio::{PlanConfig, PlanEngine, PlanError, PlanRequest, Projection, project};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "sipfolio")]
#[command(about = "Sipfolio: PEG-driven SIP portfolio planner", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// JSON configuration file (defaults to the per-user config).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a complete plan: selection, weights, shares and projection.
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Monthly contribution.
        #[arg(long, default_value = "50000")]
        monthly: f64,

        /// Weight optimization method (max_sharpe, equal_weight, risk_parity).
        #[arg(long)]
        method: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write holdings to a CSV or JSON file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the month-by-month schedule to a CSV or JSON file.
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Write the full timestamped report as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Run instrument selection only and show the rationale.
    Select {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Project the growth of a monthly contribution.
    Project {
        /// Monthly contribution.
        #[arg(long, default_value = "50000")]
        monthly: f64,

        /// Horizon in months.
        #[arg(long, default_value = "24")]
        horizon: u32,

        /// Annual growth rate as a decimal.
        #[arg(long, default_value = "0.15")]
        rate: f64,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the schedule to a CSV or JSON file.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Summarize an instrument universe.
    Universe {
        /// Instrument table (CSV).
        #[arg(long, short)]
        universe: PathBuf,

        /// Show the instruments of one sector.
        #[arg(long)]
        sector: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Selection parameters shared by `plan` and `select`.
#[derive(Args)]
struct SelectionArgs {
    /// Instrument table (CSV).
    #[arg(long, short)]
    universe: PathBuf,

    /// Horizon in months.
    #[arg(long, default_value = "24")]
    horizon: u32,

    /// Target annual growth rate as a decimal.
    #[arg(long, default_value = "0.15")]
    target: f64,

    /// Maximum number of instruments.
    #[arg(long)]
    max_stocks: Option<usize>,

    /// Minimum number of instruments for a feasible plan.
    #[arg(long)]
    min_stocks: Option<usize>,

    /// Round-2 PEG threshold.
    #[arg(long)]
    peg_threshold: Option<f64>,
}

impl SelectionArgs {
    fn request(&self, monthly_amount: f64) -> PlanRequest {
        PlanRequest {
            max_count: self.max_stocks,
            min_count: self.min_stocks,
            peg_threshold: self.peg_threshold,
            ..PlanRequest::new(monthly_amount, self.horizon, self.target)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    const fn code(&self) -> &'static str {
        match self {
            Self::Plan(e) => e.code(),
            Self::Export(_) | Self::Report(_) | Self::Json(_) => "OUTPUT_ERROR",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error [{}]: {}", e.code(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => PlanConfig::load(path)?,
        None => PlanConfig::load_default()?,
    };
    debug!("Configuration: {config:?}");

    match cli.command {
        Commands::Plan {
            selection,
            monthly,
            method,
            format,
            export,
            schedule,
            report,
        } => {
            let outputs = PlanOutputs {
                export,
                schedule,
                report,
            };
            run_plan(config, &selection, monthly, method.as_deref(), format, &outputs)?;
        }
        Commands::Select { selection, format } => {
            run_select(&config, &selection, format)?;
        }
        Commands::Project {
            monthly,
            horizon,
            rate,
            format,
            export,
        } => {
            run_project(monthly, horizon, rate, format, export.as_deref())?;
        }
        Commands::Universe {
            universe,
            sector,
            format,
        } => {
            show_universe(&universe, sector.as_deref(), format)?;
        }
    }

    Ok(())
}

fn load_universe(path: &Path) -> Result<InstrumentUniverse, PlanError> {
    info!("Loading universe from {}", path.display());
    Ok(load_universe_csv(path)?)
}

/// Optional files written after a plan is built.
struct PlanOutputs {
    export: Option<PathBuf>,
    schedule: Option<PathBuf>,
    report: Option<PathBuf>,
}

fn run_plan(
    config: PlanConfig,
    args: &SelectionArgs,
    monthly: f64,
    method: Option<&str>,
    format: OutputFormat,
    outputs: &PlanOutputs,
) -> Result<(), CliError> {
    let request = args.request(monthly);
    request.validate(&config.limits)?;

    let mut config = request.apply(&config);
    if let Some(name) = method {
        config.optimizer.method = name.parse::<OptimizationMethod>().map_err(PlanError::from)?;
    }

    let universe = load_universe(&args.universe)?;
    let plan = PlanEngine::new(config).run(&universe, monthly)?;

    let title = "SIP Portfolio Plan";
    match format {
        OutputFormat::Text => println!("{}", plan.to_summary(title).to_ascii_table()),
        OutputFormat::Markdown => println!("{}", plan.to_summary(title).to_markdown()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    if let Some(path) = &outputs.export {
        let today = Local::now().date_naive();
        plan.to_portfolio_export(title, today)
            .export_to_file(path, ExportFormat::from_path(path)?)?;
        info!("Holdings written to {}", path.display());
    }
    if let Some(path) = &outputs.schedule {
        plan.projection
            .to_export()
            .export_to_file(path, ExportFormat::from_path(path)?)?;
        info!("Schedule written to {}", path.display());
    }
    if let Some(path) = &outputs.report {
        plan.to_report(title)?.write_to(path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn run_select(
    config: &PlanConfig,
    args: &SelectionArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = args.request(config.limits.min_monthly_amount).apply(config);
    let universe = load_universe(&args.universe)?;
    let result = PegSelector::with_config(config.selection)
        .select(&universe)
        .map_err(PlanError::from)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text | OutputFormat::Markdown => print_selection(&result),
    }
    Ok(())
}

fn print_selection(result: &SelectionResult) {
    let rationale = &result.rationale;

    println!("\n{}", "=".repeat(80));
    println!("{:^80}", "INSTRUMENT SELECTION");
    println!("{}", "=".repeat(80));
    println!("Method:            {}", rationale.selection_method);
    println!("Universe:          {} instruments", rationale.total_universe);
    println!("Quality gate:      {} passed", rationale.after_quality_gate);
    println!("Sectors:           {}", rationale.sectors_available);
    println!("Selected:          {}", rationale.instruments_selected);
    println!("Forecast horizon:  {}", rationale.forecast_horizon);
    println!("Achieved rate:     {}", rationale.achieved_rate);
    println!(
        "Feasible:          {}",
        if rationale.feasible { "yes" } else { "no" }
    );

    println!("\nRound 1: lowest PEG per sector");
    println!("{}", "-".repeat(80));
    println!(
        "{:<26} {:<14} {:>8} {:>8} {:>8} {:>8}",
        "Sector", "Ticker", "Growth", "P/E", "PEG", "Size"
    );
    for pick in &rationale.sector_picks {
        println!(
            "{:<26} {:<14} {:>7.1}% {:>8.2} {:>8.3} {:>8}",
            pick.sector, pick.ticker, pick.growth, pick.pe_ratio, pick.peg_ratio, pick.sector_size
        );
    }

    if !rationale.round_two_additions.is_empty() {
        println!("\nRound 2: additions below the PEG threshold");
        println!("{}", "-".repeat(80));
        for addition in &rationale.round_two_additions {
            println!(
                "{:<26} {:<14} {:>8.3}",
                addition.sector, addition.ticker, addition.peg_ratio
            );
        }
    }

    if let Some(note) = &rationale.feasibility_note {
        println!("\nNote: {note}");
    }
    for note in &rationale.notes {
        println!("Note: {note}");
    }
    println!("{}", "=".repeat(80));
}

fn run_project(
    monthly: f64,
    horizon: u32,
    rate: f64,
    format: OutputFormat,
    export: Option<&Path>,
) -> Result<(), CliError> {
    let projection = project(monthly, horizon, rate)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&projection)?),
        OutputFormat::Text | OutputFormat::Markdown => print_projection(&projection),
    }

    if let Some(path) = export {
        projection
            .to_export()
            .export_to_file(path, ExportFormat::from_path(path)?)?;
        info!("Schedule written to {}", path.display());
    }
    Ok(())
}

fn print_projection(projection: &Projection) {
    println!("\n{}", "=".repeat(80));
    println!(
        "{:^80}",
        format!(
            "SIP PROJECTION: {:.0}/month at {:.1}% for {} months",
            projection.monthly_amount,
            projection.annual_growth_rate * 100.0,
            projection.horizon_months
        )
    );
    println!("{}", "=".repeat(80));
    println!(
        "{:>6} {:>20} {:>20} {:>20}",
        "Month", "Invested", "Value", "Gain"
    );
    println!("{}", "-".repeat(80));
    for point in &projection.points {
        println!(
            "{:>6} {:>20.0} {:>20.0} {:>20.0}",
            point.month, point.cumulative_invested, point.projected_value, point.gain
        );
    }
    println!("{}", "-".repeat(80));

    let s = &projection.summary;
    println!("Final value:       {:.0}", s.final_value);
    println!("Total invested:    {:.0}", s.total_investment);
    println!("Total gain:        {:.0}", s.total_gain);
    println!("Money multiplier:  {:.2}x", s.money_multiplier);
    println!("Total return:      {:.1}%", s.total_return_percentage);
    println!("{}", "=".repeat(80));
}

fn show_universe(
    path: &Path,
    sector: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let universe = load_universe(path)?;

    let Some(name) = sector else {
        let summary = universe.market_summary();
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text | OutputFormat::Markdown => {
                println!("Universe: {} instruments", summary.total_instruments);
                println!("=============\n");
                println!("Passing quality gate: {}", summary.usable_instruments);
                println!("Mean growth: {:.2}%", summary.avg_growth);
                println!("Mean P/E:    {:.2}", summary.avg_pe_ratio);
                println!("Mean P/B:    {:.2}\n", summary.avg_pb_ratio);
                for sector in &summary.sector_summaries {
                    println!("  {sector}");
                }
            }
        }
        return Ok(());
    };

    let sector = universe
        .sectors()
        .into_iter()
        .find(|s| s.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| PlanError::InvalidParameters(format!("Unknown sector: {name}")))?;
    let members = universe.instruments_in_sector(sector);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&members)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("{sector}: {} instruments", members.len());
            println!("{}", "-".repeat(60));
            println!(
                "{:<14} {:>12} {:>8} {:>8} {:>8}",
                "Ticker", "Price", "P/E", "Growth", "PEG"
            );
            for inst in members {
                println!(
                    "{:<14} {:>12.2} {:>8} {:>8} {:>8}",
                    inst.ticker,
                    inst.current_price,
                    fmt_opt(inst.pe_ratio, 2),
                    fmt_opt(inst.avg_historical_growth, 1),
                    fmt_opt(inst.peg_ratio(), 3)
                );
            }
        }
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.precision$}"))
}
