//! DayTape CLI: browse, extract and prepare intraday day data.
//!
//! Commands:
//! - `tickers`: list tickers from the local directory or remote tree
//! - `dates`: list available dates for a ticker
//! - `day`: load one day through the fallback chain and print a snapshot
//! - `extract`: stream one day's array out of a monolithic file
//! - `manifest`: write `manifest.json` and `<T>.dates.json` for a data tree
//! - `split`: split monolithic ticker files into per-day files

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use daytape_core::analytics::Snapshot;
use daytape_core::data::extract_day;
use daytape_core::domain::is_date_key;
use daytape_core::tree::{generate_manifest, split_by_day};
use daytape_core::{DatesState, DayState, DayTapeConfig, Viewer};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "daytape",
    about = "DayTape CLI: load and inspect single days of intraday data"
)]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the remote data tree (e.g. http://localhost:8000/data_json).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Local data directory.
    #[arg(long, global = true)]
    local_dir: Option<PathBuf>,

    /// Offline mode: no network access.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tickers.
    Tickers,
    /// List available dates for a ticker.
    Dates {
        ticker: String,
    },
    /// Load one day and print a snapshot.
    Day {
        ticker: String,

        /// Date (YYYY-MM-DD).
        date: String,

        /// Record index to show. Defaults to the last record; clamped into range.
        #[arg(long)]
        at: Option<usize>,

        /// Print the snapshot as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Stream one day's array out of a monolithic ticker file.
    Extract {
        file: PathBuf,

        /// Date (YYYY-MM-DD).
        date: String,

        /// Bytes per read. Defaults to the configured chunk size.
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Write manifest.json and <TICKER>.dates.json for a data directory.
    Manifest {
        #[arg(default_value = "data_json")]
        dir: PathBuf,
    },
    /// Split <TICKER>.json files into <TICKER>/<DATE>.json day files.
    Split {
        #[arg(default_value = "data_json")]
        dir: PathBuf,

        /// Tickers to split. Defaults to every ticker file in the directory.
        tickers: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Tickers => run_tickers(&config),
        Commands::Dates { ticker } => run_dates(&config, &ticker),
        Commands::Day {
            ticker,
            date,
            at,
            json,
        } => run_day(&config, &ticker, &date, at, json),
        Commands::Extract {
            file,
            date,
            chunk_size,
        } => run_extract(&config, &file, &date, chunk_size),
        Commands::Manifest { dir } => run_manifest(&dir),
        Commands::Split { dir, tickers } => run_split(&dir, &tickers),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (if any) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<DayTapeConfig> {
    let mut config = match &cli.config {
        Some(path) => DayTapeConfig::from_file(path)?,
        None => DayTapeConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.remote.base_url = Some(url.clone());
    }
    if let Some(dir) = &cli.local_dir {
        config.local.root = Some(dir.clone());
    }
    if cli.offline {
        config.remote.base_url = None;
    }
    config.validate()?;
    debug!(?config, "effective configuration");
    Ok(config)
}

fn open_viewer(config: &DayTapeConfig) -> Result<Viewer> {
    if config.remote.base_url.is_none() && config.local.root.is_none() {
        bail!("no data source: pass --local-dir, --base-url, or a --config with either");
    }
    Ok(Viewer::from_config(config)?)
}

fn run_tickers(config: &DayTapeConfig) -> Result<()> {
    let mut viewer = open_viewer(config)?;
    let tickers = viewer.tickers();
    if tickers.is_empty() {
        eprintln!("No tickers found.");
    }
    for ticker in tickers {
        println!("{ticker}");
    }
    Ok(())
}

fn run_dates(config: &DayTapeConfig, ticker: &str) -> Result<()> {
    let mut viewer = open_viewer(config)?;
    match viewer.select_ticker(ticker) {
        DatesState::Loaded(dates) => {
            if dates.is_empty() {
                eprintln!("No dates for {ticker}.");
            }
            for date in dates {
                println!("{date}");
            }
            Ok(())
        }
        DatesState::Unavailable(message) => bail!(message),
    }
}

fn run_day(
    config: &DayTapeConfig,
    ticker: &str,
    date: &str,
    at: Option<usize>,
    json: bool,
) -> Result<()> {
    if !is_date_key(date) {
        bail!("invalid date '{date}', expected YYYY-MM-DD");
    }
    let mut viewer = open_viewer(config)?;
    viewer.focus_ticker(ticker);
    if let DayState::Empty { diagnostic } = viewer.select_date(date) {
        bail!("{ticker} {date}: {diagnostic}");
    }
    if let Some(index) = at {
        viewer.scrub(index);
    }
    let Some(snapshot) = viewer.render() else {
        bail!("{ticker} {date}: no records");
    };
    let strategy = viewer.strategy().unwrap_or("unknown");

    if json {
        let out = serde_json::json!({
            "ticker": ticker,
            "date": date,
            "strategy": strategy,
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_snapshot(ticker, date, strategy, &snapshot);
    }
    Ok(())
}

fn print_snapshot(ticker: &str, date: &str, strategy: &str, s: &Snapshot) {
    let r = &s.record;
    println!("{ticker} {date} via {strategy} ({} records)", s.total);
    println!("Index:        {}/{}", s.index, s.total.saturating_sub(1));
    println!("Time:         {}", if r.t.is_empty() { "-" } else { &r.t });
    println!(
        "OHLC:         {} / {} / {} / {}",
        format_price(r.o),
        format_price(r.h),
        format_price(r.l),
        format_price(r.c)
    );
    println!("Volume:       {}", format_count(r.v));
    println!("Trades:       {}", format_count(r.cnt));
    println!("Cum volume:   {}", format_count(s.cum_volume));
    println!("Cum trades:   {}", format_count(s.cum_count));
    println!("Return:       {:+.2}%", s.pct_return);
    match s.volatility {
        Some(v) => println!("Volatility:   {:.2}% (annualized)", v * 100.0),
        None => println!("Volatility:   -"),
    }
}

fn format_price(v: f64) -> String {
    if v.is_nan() {
        "-".into()
    } else if v.abs() < 1.0 {
        format!("{v:.4}")
    } else {
        format!("{v:.2}")
    }
}

/// Whole number with thousands separators.
fn format_count(v: f64) -> String {
    if !v.is_finite() {
        return "-".into();
    }
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out
}

fn run_extract(
    config: &DayTapeConfig,
    file: &Path,
    date: &str,
    chunk_size: Option<usize>,
) -> Result<()> {
    let mut opts = config.extract.clone();
    if let Some(n) = chunk_size {
        if n == 0 {
            bail!("--chunk-size must be > 0");
        }
        opts.chunk_size = n;
    }
    let reader = File::open(file).with_context(|| format!("open {}", file.display()))?;
    let day = extract_day(reader, date, &opts)?;
    println!("{}", serde_json::to_string_pretty(&day)?);
    Ok(())
}

fn run_manifest(dir: &Path) -> Result<()> {
    let summary = generate_manifest(dir)?;
    for (ticker, count) in &summary.date_counts {
        println!("{ticker:<8} {count:>6} dates");
    }
    for ticker in &summary.unscanned {
        println!("{ticker:<8} (compressed, not scanned)");
    }
    println!(
        "Wrote manifest with {} tickers to {}",
        summary.tickers.len(),
        summary.manifest_path.display()
    );
    Ok(())
}

fn run_split(dir: &Path, tickers: &[String]) -> Result<()> {
    let summary = split_by_day(dir, tickers)?;
    for (ticker, count) in &summary.written {
        println!("{ticker:<8} {count:>6} day files -> {}", dir.join(ticker).display());
    }
    for ticker in &summary.missing {
        eprintln!("Skipped {ticker}: {}.json not found", ticker);
    }
    println!("Wrote {} day files", summary.total_files());
    Ok(())
}
