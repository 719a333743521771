//! touchpoint — command-line driver for the attribution pipeline
//!
//! # Subcommands
//! - `generate --seed <n> --out <dir>`             — write a synthetic dataset
//! - `attribute --sessions <file> [--json]`        — first/last-touch per activated user
//! - `cpa --sessions <file> --spend <file> [...]`  — cost per activation breakdown
//! - `check --sessions <file>`                     — activation/attribution correlation check
//!
//! Logs go to stderr; stdout carries only results.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use touchpoint_core::{
    check_quality, compute_cpa, generate, resolve_attribution, summarize, AttributionConfig,
    AttributionResult, CpaRow, CpaSummary, Granularity, QualityReport, TouchModel, Touch,
    TouchpointConfig,
};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CONFIG: &str = "touchpoint.toml";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "touchpoint",
    version,
    about = "Synthetic sessions, first/last-touch attribution and cost per activation"
)]
struct Cli {
    /// TOML config file (defaults to ./touchpoint.toml when present)
    #[arg(short, long, env = "TOUCHPOINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a synthetic sessions + campaign spend dataset
    Generate {
        /// RNG seed; the same seed and --now reproduce the same dataset
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of sessions (overrides generator.session_count)
        #[arg(long)]
        sessions: Option<usize>,

        /// Number of distinct users (overrides generator.user_count)
        #[arg(long)]
        users: Option<usize>,

        /// Days of history (overrides generator.history_days)
        #[arg(long)]
        days: Option<u32>,

        /// Reference instant, RFC 3339 (defaults to the current time)
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Resolve first/last-touch attribution for every activated user
    Attribute {
        /// Sessions file (.json or .jsonl)
        #[arg(long)]
        sessions: PathBuf,

        /// Attribution window in days (overrides attribution.window_days)
        #[arg(long)]
        window_days: Option<u32>,

        /// Also write the results as JSON to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Cost per activation by day, campaign, source or ad
    Cpa {
        /// Sessions file (.json or .jsonl)
        #[arg(long)]
        sessions: PathBuf,

        /// Campaign spend file (.json or .jsonl)
        #[arg(long)]
        spend: PathBuf,

        /// daily | campaign | source | ad
        #[arg(short, long, default_value = "daily")]
        granularity: Granularity,

        /// Which touch receives credit: first | last
        #[arg(short, long, default_value = "last")]
        model: TouchModel,

        /// Attribution window in days (overrides attribution.window_days)
        #[arg(long)]
        window_days: Option<u32>,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check that every activation produced exactly one attribution row
    Check {
        /// Sessions file (.json or .jsonl)
        #[arg(long)]
        sessions: PathBuf,

        /// Campaign spend file (.json or .jsonl), counted when given
        #[arg(long)]
        spend: Option<PathBuf>,

        /// Attribution window in days (overrides attribution.window_days)
        #[arg(long)]
        window_days: Option<u32>,
    },
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CpaReport {
    granularity: Granularity,
    model: TouchModel,
    rows: Vec<CpaRow>,
    summary: CpaSummary,
}

// ============================================================================
// Config + Logging
// ============================================================================

fn load_config(path: Option<&Path>) -> anyhow::Result<TouchpointConfig> {
    match path {
        Some(p) => TouchpointConfig::load(&p.to_string_lossy())
            .with_context(|| format!("failed to load config from {}", p.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => TouchpointConfig::load(DEFAULT_CONFIG)
            .with_context(|| format!("failed to load config from {}", DEFAULT_CONFIG)),
        None => Ok(TouchpointConfig::default()),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn attribution_config(config: &TouchpointConfig, window_days: Option<u32>) -> AttributionConfig {
    AttributionConfig {
        window_days: window_days.unwrap_or(config.attribution.window_days),
    }
}

// ============================================================================
// Commands
// ============================================================================

struct GenerateArgs {
    seed: u64,
    sessions: Option<usize>,
    users: Option<usize>,
    days: Option<u32>,
    now: Option<DateTime<Utc>>,
    out: PathBuf,
}

fn do_generate(config: &TouchpointConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let mut generator = config.generator.clone();
    if let Some(n) = args.sessions {
        generator.session_count = n;
    }
    if let Some(n) = args.users {
        generator.user_count = n;
    }
    if let Some(d) = args.days {
        generator.history_days = d;
    }

    let now = args.now.unwrap_or_else(Utc::now);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let data = generate(&generator, now, &mut rng)?;
    let (sessions_path, spend_path) = touchpoint_ingest::write_dataset(&args.out, &data)?;

    println!("Sessions:       {} → {}", data.sessions.len(), sessions_path.display());
    println!("Campaign spend: {} → {}", data.campaign_spend.len(), spend_path.display());
    println!(
        "Activations:    {}",
        data.sessions.iter().filter(|s| s.activated).count()
    );
    Ok(())
}

fn attribute_file(sessions: &Path, config: &AttributionConfig) -> anyhow::Result<Vec<AttributionResult>> {
    let sessions = touchpoint_ingest::load_sessions(sessions)?;
    let results = resolve_attribution(&sessions, config)?;
    Ok(results)
}

fn do_attribute(
    sessions: &Path,
    config: &AttributionConfig,
    out: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let results = attribute_file(sessions, config)?;

    if let Some(path) = out {
        touchpoint_ingest::write_json(path, &results)?;
        tracing::info!("Wrote {} attribution rows to {}", results.len(), path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        eprintln!("No activated users found in {}", sessions.display());
    } else {
        print!("{}", format_attribution_table(&results));
    }
    Ok(())
}

fn build_cpa_report(
    sessions: &Path,
    spend: &Path,
    granularity: Granularity,
    model: TouchModel,
    config: &AttributionConfig,
) -> anyhow::Result<CpaReport> {
    let results = attribute_file(sessions, config)?;
    let spend_rows = touchpoint_ingest::load_spend(spend)?;
    let rows = compute_cpa(&spend_rows, &results, granularity, model);
    let summary = summarize(&rows);
    Ok(CpaReport {
        granularity,
        model,
        rows,
        summary,
    })
}

fn do_cpa(
    sessions: &Path,
    spend: &Path,
    granularity: Granularity,
    model: TouchModel,
    config: &AttributionConfig,
    json: bool,
) -> anyhow::Result<()> {
    let report = build_cpa_report(sessions, spend, granularity, model, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_cpa_table(&report.rows, &report.summary));
    }
    Ok(())
}

fn build_quality_report(
    sessions: &Path,
    spend: Option<&Path>,
    config: &AttributionConfig,
) -> anyhow::Result<QualityReport> {
    let sessions = touchpoint_ingest::load_sessions(sessions)?;
    let spend = match spend {
        Some(path) => touchpoint_ingest::load_spend(path)?,
        None => Vec::new(),
    };
    let results = resolve_attribution(&sessions, config)?;
    Ok(check_quality(&sessions, &spend, &results))
}

fn do_check(sessions: &Path, spend: Option<&Path>, config: &AttributionConfig) -> anyhow::Result<bool> {
    let report = build_quality_report(sessions, spend, config)?;

    println!("Sessions:               {}", report.sessions);
    println!("Activations:            {}", report.activations);
    if spend.is_some() {
        println!("Campaign spend rows:    {}", report.spend_rows);
        println!("Unique campaigns:       {}", report.campaigns);
    }
    println!("Attribution results:    {}", report.attributions);
    println!("Marketing attributions: {}", report.marketing_attributions);
    if report.consistent {
        println!("✅ Data correlation check passed");
    } else {
        println!(
            "❌ Data correlation issue: {} activations vs {} attributions",
            report.activations, report.attributions
        );
    }
    Ok(report.consistent)
}

// ============================================================================
// Formatting
// ============================================================================

fn touch_label(touch: &Touch) -> String {
    match &touch.campaign_id {
        Some(campaign) => format!("{}/{}", touch.source, campaign),
        None => touch.source.clone(),
    }
}

fn format_attribution_table(results: &[AttributionResult]) -> String {
    let mut out = format!(
        "{:<14} {:<28} {:<28} {}\n",
        "USER ID", "FIRST TOUCH", "LAST TOUCH", "ACTIVATED AT"
    );
    for r in results {
        out.push_str(&format!(
            "{:<14} {:<28} {:<28} {}\n",
            r.user_id,
            touch_label(&r.first_touch),
            touch_label(&r.last_touch),
            r.activation_time.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("${:.2}", v)).unwrap_or_else(|| "N/A".to_string())
}

fn format_cpa_table(rows: &[CpaRow], summary: &CpaSummary) -> String {
    let mut out = format!("{:<44} {:>12} {:>11} {:>10}\n", "KEY", "SPEND", "ACTIVATIONS", "CPA");
    for row in rows {
        out.push_str(&format!(
            "{:<44} {:>12} {:>11} {:>10}\n",
            row.key,
            money(Some(row.spend)),
            row.activations,
            money(row.cost_per_activation)
        ));
    }
    out.push_str(&format!(
        "{:<44} {:>12} {:>11} {:>10}\n",
        "TOTAL",
        money(Some(summary.total_spend)),
        summary.total_activations,
        money(summary.cost_per_activation)
    ));
    out
}

// ============================================================================
// Main
// ============================================================================

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.service.log_level);

    match cli.command {
        Commands::Generate {
            seed,
            sessions,
            users,
            days,
            now,
            out,
        } => do_generate(
            &config,
            GenerateArgs {
                seed,
                sessions,
                users,
                days,
                now,
                out,
            },
        )
        .map(|_| true),
        Commands::Attribute {
            sessions,
            window_days,
            out,
            json,
        } => do_attribute(
            &sessions,
            &attribution_config(&config, window_days),
            out.as_deref(),
            json,
        )
        .map(|_| true),
        Commands::Cpa {
            sessions,
            spend,
            granularity,
            model,
            window_days,
            json,
        } => do_cpa(
            &sessions,
            &spend,
            granularity,
            model,
            &attribution_config(&config, window_days),
            json,
        )
        .map(|_| true),
        Commands::Check {
            sessions,
            spend,
            window_days,
        } => do_check(
            &sessions,
            spend.as_deref(),
            &attribution_config(&config, window_days),
        ),
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("touchpoint: {:#}", e);
            std::process::exit(1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
