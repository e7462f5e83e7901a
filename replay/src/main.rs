//! @ai:module:intent CLI for replaying request traces against rate limits
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ratelimit_replay::{
    config::ReplayConfig,
    create_executor, format_report, load_trace,
    report::{JsonReporter, JsonReporterTrait},
    OutputFormat,
};
use ratelimiting::format_period;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "limits.toml";

#[derive(Parser)]
#[command(name = "ratelimit-replay")]
#[command(about = "Replay request traces through token bucket rate limits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a trace and report allow/deny decisions
    Run {
        /// Path to configuration file (defaults to limits.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trace file with `<offset_ms> <limit> <key>` lines
        trace: PathBuf,

        /// Replay start time as RFC 3339 (defaults to now)
        #[arg(long)]
        start: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with a non-zero status when any request is denied
        #[arg(long)]
        fail_on_deny: bool,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,
    },

    /// Validate a configuration file and list its limits
    CheckConfig {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ratelimit_replay=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            trace,
            start,
            format,
            output,
            fail_on_deny,
        } => run_replay(RunArgs {
            config,
            trace,
            start,
            format,
            output,
            fail_on_deny,
        }),
        Commands::Init { output } => init_config(output).map(|_| ExitCode::SUCCESS),
        Commands::CheckConfig { config } => check_config(config).map(|_| ExitCode::SUCCESS),
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    trace: PathBuf,
    start: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
    fail_on_deny: bool,
}

/// @ai:intent Replay a trace file and print the report
/// @ai:effects fs:read, fs:write, io
fn run_replay(args: RunArgs) -> Result<ExitCode> {
    let config = load_or_default_config(args.config)?;
    let start = parse_start(args.start.as_deref())?;
    let requests = load_trace(&args.trace)?;

    tracing::info!(
        "Replaying {} requests from {}",
        requests.len(),
        args.trace.display()
    );

    let executor = create_executor(&config, start)?;
    let report = executor.replay(&requests)?;

    println!("{}", format_report(&report, args.format)?);

    if let Some(path) = args.output {
        JsonReporter::new().generate(&report, &path)?;
    }

    if args.fail_on_deny && report.summary.has_denials() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// @ai:intent Parse the replay start time or fall back to the wall clock
/// @ai:effects time
fn parse_start(start: Option<&str>) -> Result<DateTime<Utc>> {
    match start {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .with_context(|| format!("Invalid --start timestamp: {}", s)),
        None => Ok(Utc::now()),
    }
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = ReplayConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load a config file and print the limits it defines
/// @ai:effects fs:read, io
fn check_config(path: PathBuf) -> Result<()> {
    let config = ReplayConfig::load(&path)?;
    let limits = config.rate_limits()?;

    println!("{} {}", "OK".green().bold(), path.display());
    for (name, limit) in &limits {
        println!(
            "  {:<16} {} tokens per {}",
            name,
            limit.tokens_per_period(),
            format_period(limit.period())
        );
    }
    match config.cache.ttl {
        Some(ttl) => println!("  cache ttl: {}", format_period(ttl)),
        None => println!("  cache ttl: {}", "none".dimmed()),
    }
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<ReplayConfig> {
    match path {
        Some(p) => ReplayConfig::load(&p),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG);

            if default_path.exists() {
                ReplayConfig::load(&default_path)
            } else {
                tracing::debug!("No {} found, using default limits", DEFAULT_CONFIG);
                Ok(ReplayConfig::default())
            }
        }
    }
}
