//! Market panel CLI: run, fetch, and config commands.
//!
//! Commands:
//! - `run`: fetch (or read offline), build the panel, derive valuation tables, export
//! - `fetch`: download every configured instrument into the data directory as CSV
//! - `config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use marketpanel_runner::config::PipelineConfig;
use marketpanel_runner::pipeline::{fetch_window, run_pipeline, PipelineOutput};
use marketpanel_runner::reporting::{export_run_with_report, NarrativeGenerator, SnapshotDigest};
use marketpanel_runner::source::{
    fetch_all, write_series_csv, CsvDirSource, SeriesSource, YahooSource,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "marketpanel",
    about = "Daily cross-market panel with valuation indicators"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the panel and snapshot, then write every artifact.
    Run {
        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read raw series from the data directory instead of the network.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Directory holding auxiliary tables (and raw CSVs when offline).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Lookback in years for the fetch window.
        #[arg(long)]
        years: Option<u32>,

        /// Skip the analysis report.
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },
    /// Download raw series for every configured instrument into CSV files.
    Fetch {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        years: Option<u32>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            offline,
            data_dir,
            output_dir,
            years,
            no_report,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.offline |= offline;
            if let Some(dir) = data_dir {
                cfg.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                cfg.export.output_dir = dir;
            }
            if let Some(y) = years {
                cfg.lookback_years = y;
            }
            run_cmd(&cfg, !no_report)
        }
        Commands::Fetch {
            config,
            data_dir,
            years,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(dir) = data_dir {
                cfg.data_dir = dir;
            }
            if let Some(y) = years {
                cfg.lookback_years = y;
            }
            fetch_cmd(&cfg)
        }
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Today's date in the report timezone.
fn today(cfg: &PipelineConfig) -> Result<NaiveDate> {
    let tz = cfg.export.tz()?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

fn run_cmd(cfg: &PipelineConfig, with_report: bool) -> Result<()> {
    let tz = cfg.export.tz()?;
    let now = Utc::now().with_timezone(&tz);

    let source: Box<dyn SeriesSource> = if cfg.offline {
        Box::new(CsvDirSource::new(&cfg.data_dir))
    } else {
        Box::new(YahooSource::new()?)
    };

    tracing::info!(source = source.name(), today = %now.date_naive(), "starting run");
    let output = run_pipeline(cfg, source.as_ref(), now.date_naive())?;

    let digest = SnapshotDigest;
    let generator: Option<&dyn NarrativeGenerator> = if with_report { Some(&digest) } else { None };
    let paths = export_run_with_report(&cfg.export.output_dir, &output, &cfg.export, now, generator)?;

    print_summary(&output);
    println!();
    println!("Artifacts:");
    for p in paths.all() {
        println!("  {}", p.display());
    }
    Ok(())
}

fn print_summary(output: &PipelineOutput) {
    let snap = &output.snapshot;
    println!("Latest date:  {}", snap.latest_date);
    println!("Rows:         {}", output.panel.len());
    println!("Columns:      {}", output.panel.columns().len());
    if !output.dropped.is_empty() {
        println!("Dropped:      {}", output.dropped.join(", "));
    }
    for (ticker, err) in &output.failed {
        println!("Failed:       {ticker}: {err}");
    }
    for w in output.diagnostics.warnings() {
        println!("Warning:      {w}");
    }
    match &snap.buffett_indicator {
        Some(b) => println!(
            "Buffett:      {} ({})",
            b.get("indicator_value")
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "N/A".into()),
            b.date
        ),
        None => println!("Buffett:      not available"),
    }
    match &snap.equity_bond_spread {
        Some(s) => println!(
            "Spread:       {} ({})",
            s.get("spread_value")
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "N/A".into()),
            s.date
        ),
        None => println!("Spread:       not available"),
    }
    println!("Fingerprint:  {}", output.panel.fingerprint());
}

fn fetch_cmd(cfg: &PipelineConfig) -> Result<()> {
    let (start, end) = fetch_window(today(cfg)?, cfg.lookback_years);
    let source = YahooSource::new()?;
    let written = fetch_to_dir(&source, cfg, start, end)?;
    for (ticker, rows, path) in &written {
        println!("{ticker:<12} {rows:>5} rows -> {}", path.display());
    }
    Ok(())
}

/// Fetch every instrument through `fetch_all` and persist the successful
/// series under `cfg.data_dir`. Returns `(ticker, rows, path)` per file.
fn fetch_to_dir(
    source: &dyn SeriesSource,
    cfg: &PipelineConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(String, usize, PathBuf)>> {
    let report = fetch_all(source, &cfg.instruments, start, end);
    for (ticker, err) in &report.failed {
        eprintln!("Error for {ticker}: {err}");
    }
    if report.succeeded() == 0 && !cfg.instruments.is_empty() {
        bail!("every fetch failed ({} instruments)", report.failed.len());
    }

    let mut written = Vec::new();
    // Series come back in instrument order.
    for (inst, series) in cfg.instruments.iter().zip(&report.series) {
        if report.failed.iter().any(|(t, _)| t == &inst.ticker) {
            continue;
        }
        let path = write_series_csv(&cfg.data_dir, &inst.ticker, &series.points)?;
        written.push((inst.ticker.clone(), series.points.len(), path));
    }
    Ok(written)
}
