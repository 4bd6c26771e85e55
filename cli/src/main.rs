use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Error, Result};
use clap::{Parser, ValueEnum};
use stock_lake::{
    client::YahooClient,
    companion,
    config::{normalize_ticker, Config, Settings},
    projector::project,
    Ingestion, Period, Service, StorageTarget,
};
use std::fs;
use tracing::info;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, EnvFilter};

mod prompt;

use prompt::Prompter;

const LOG_FILE: &str = "stock-lake.log";
const RULE_WIDTH: usize = 70;

/// Download daily prices for one ticker and store each day as a partition
#[derive(Parser, Debug)]
#[command(name = "stock-lake", version)]
struct Args {
    /// Ticker symbol. NSE: RELIANCE.NS, BSE: 500325.BO, MF: AXISBLUECHIP.NS.
    /// Asked for interactively when omitted
    #[clap(short, long)]
    ticker: Option<String>,
    /// How much history to fetch: 7d, 1mo, 1y, 3y, 5y or max.
    /// Asked for interactively when omitted
    #[clap(short, long, value_parser = Period::from_str)]
    period: Option<Period>,
    /// Where to write partitions: local or gcp.
    /// Asked for interactively when omitted
    #[clap(short, long, value_parser = StorageTarget::from_str)]
    storage: Option<StorageTarget>,
    /// What to do with the data afterwards.
    /// Asked for interactively when omitted
    #[clap(long, value_enum)]
    processing: Option<Processing>,
    /// Settings file (.toml, .yaml, .yml or .json)
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// The folder for local partitions. Will be saved
    /// in this structure: `$data_lake_dir/ticker=$TICKER/date=$YYYY-MM-DD.csv`
    #[clap(long)]
    data_lake_dir: Option<PathBuf>,
    /// Folder for the daily `stock-lake.log`. Kept apart from the data lake
    /// so partition readers only ever see `ticker=` directories
    #[clap(long, default_value = ".")]
    log_dir: PathBuf,
    /// Bucket for the gcp target. Overrides the settings file
    #[clap(long, env = "STOCK_LAKE_BUCKET")]
    bucket: Option<String>,
    /// How many partition writes may be in flight at once
    #[clap(long)]
    concurrency: Option<usize>,
    /// How many of the latest rows to print for local processing
    #[clap(long, default_value_t = 5)]
    tail: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Processing {
    /// Print the latest rows in the terminal
    Local,
    /// Print PySpark code that reads the bucket from Databricks
    Databricks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let processing = fill_missing(&mut args, &mut prompter)?;
    drop(prompter);

    let tail = args.tail;
    let log_dir = args.log_dir.clone();
    let config: Config = args.try_into()?;

    let (non_blocking, _guard) =
        tracing_appender::non_blocking(file_logger(&log_dir));
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .with(EnvFilter::from_default_env())
        .init();
    info!(
        ticker = %config.ticker,
        period = %config.period,
        storage = %config.storage,
        "starting run"
    );

    println!(
        "\n[1] Fetching data for '{}' | Target: {}",
        config.ticker,
        config.storage.to_string().to_uppercase()
    );
    let client = YahooClient::new().context("Failed to set up the data source")?;
    let service = Service::new(client).with_concurrency(config.concurrency);
    let ingestion = service
        .run(&config)
        .await
        .with_context(|| format!("Run for '{}' did not complete", config.ticker))?;
    report_ingestion(&ingestion);

    match processing {
        Processing::Local => print_tail(&ingestion, config.period, tail),
        Processing::Databricks => {
            print_databricks(&config.ticker, &config.object_store.bucket_name)
        }
    }
    Ok(())
}

/// Ask for whatever the command line left out, in the order an operator
/// expects: storage, processing, then ticker and period.
fn fill_missing<R: BufRead, W: Write>(
    args: &mut Args,
    prompter: &mut Prompter<R, W>,
) -> Result<Processing> {
    if args.storage.is_none() {
        args.storage = Some(prompter.choose(
            "Select storage target (local/gcp): ",
            &[
                ("local", StorageTarget::Local),
                ("gcp", StorageTarget::ObjectStore),
            ],
        )?);
    }
    let processing = match args.processing {
        Some(processing) => processing,
        None => prompter.choose(
            "Select processing target (local/databricks): ",
            &[
                ("local", Processing::Local),
                ("databricks", Processing::Databricks),
            ],
        )?,
    };
    if args.ticker.is_none() || args.period.is_none() {
        prompter.say("\n--- Asset & Period Selection ---")?;
    }
    if args.ticker.is_none() {
        prompter.say(
            "Formats: NSE -> RELIANCE.NS | BSE -> 500325.BO | MF -> AXISBLUECHIP.NS",
        )?;
        args.ticker = Some(prompter.ask("Enter ticker symbol: ")?);
    }
    if args.period.is_none() {
        let periods = [
            ("1", Period::Week),
            ("2", Period::Month),
            ("3", Period::Year),
            ("4", Period::ThreeYears),
            ("5", Period::FiveYears),
            ("6", Period::Max),
        ];
        prompter.say("\nSelect time period:")?;
        for (choice, period) in &periods {
            prompter.say(&format!("  {choice}: {}", period.label()))?;
        }
        args.period = Some(prompter.choose("Enter choice (1-6): ", &periods)?);
    }
    Ok(processing)
}

impl TryFrom<Args> for Config {
    type Error = Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let ticker = normalize_ticker(args.ticker.as_deref().unwrap_or_default())
            .context("Invalid ticker")?;
        let period = args
            .period
            .ok_or_else(|| Error::msg("no period selected"))?;
        let storage = args
            .storage
            .ok_or_else(|| Error::msg("no storage target selected"))?;
        let settings = match args.config {
            Some(path) => parse_config(path)?,
            None => Settings::default(),
        };

        let mut config = Config::new(&ticker, period, storage).with_settings(settings);
        if let Some(dir) = args.data_lake_dir {
            config.data_lake_dir = dir;
        }
        if let Some(bucket) = args.bucket {
            config.object_store.bucket_name = bucket;
        }
        if let Some(concurrency) = args.concurrency {
            config.concurrency = concurrency;
        }
        config
            .validate()
            .with_context(|| format!("Invalid configuration for '{ticker}'"))?;
        Ok(config)
    }
}

fn file_logger(log_dir: &Path) -> RollingFileAppender {
    tracing_appender::rolling::daily(log_dir, LOG_FILE)
}

fn parse_config(path: PathBuf) -> Result<Settings, Error> {
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| "Failed to parse YAML"),
        "toml" => {
            toml::from_str(&contents).with_context(|| "Failed to parse TOML")
        }
        "json" => serde_json::from_str(&contents)
            .with_context(|| "Failed to parse JSON"),
        _ => {
            bail!("Unknown extension")
        }
    }
}

fn report_ingestion(ingestion: &Ingestion) {
    println!("-> Fetched {} data points.", ingestion.total());
    if ingestion.is_complete() {
        println!("-> Data ingestion complete.");
    } else {
        println!(
            "-> Data ingestion finished with errors: {}/{} partitions written, {} failed (see {LOG_FILE}).",
            ingestion.written,
            ingestion.total(),
            ingestion.failed
        );
    }
}

fn print_tail(ingestion: &Ingestion, period: Period, tail: usize) {
    let ticker = ingestion.series.ticker();
    println!("\n[2] Processing data locally for '{ticker}'...");
    let table = project(&ingestion.series);
    if let (Some(first), Some(last)) =
        (ingestion.series.first_date(), ingestion.series.last_date())
    {
        println!(
            "-> {} rows from {first} to {last} (Period: {})",
            table.len(),
            period.to_string().to_uppercase()
        );
    }
    println!("--- Data for {ticker} ---");
    print!("{}", table.tail(tail));
}

fn print_databricks(ticker: &str, bucket_name: &str) {
    let rule = "-".repeat(RULE_WIDTH);
    println!("\n[2] Data is ready for Databricks analysis.");
    println!("-> Paste the following PySpark code into a Databricks notebook cell:");
    println!("{rule}");
    print!("{}", companion::databricks_snippet(ticker, bucket_name));
    println!("{rule}");
}
