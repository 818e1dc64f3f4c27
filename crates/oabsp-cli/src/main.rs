use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use oabsp::export::export_all;
use oabsp::utils::CollectionStats;
use oabsp::{CollectEvent, ScraperConfig, WebScraper};

#[derive(Parser)]
#[command(name = "oabsp")]
#[command(
    about = "Collects contact details for every OAB SP subsection and exports them as CSV and XLSX",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        value_name = "STEM",
        default_value = "oabsp_subsecoes_full",
        help = "Output file name without extension; .csv and .xlsx are appended"
    )]
    output: PathBuf,

    #[arg(long, value_name = "MS", help = "Pause between subsection pages in milliseconds")]
    delay_ms: Option<u64>,

    #[arg(
        long,
        help = "Only visit the first N subsection pages",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    limit: Option<u16>,

    #[arg(
        short = 'o',
        long = "format",
        value_enum,
        default_value = "text",
        help = "Summary printed after export"
    )]
    format: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mut config = ScraperConfig::default();
    if let Some(ms) = cli.delay_ms {
        config.request_delay = Duration::from_millis(ms);
    }

    let scraper = WebScraper::with_config(config).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    log::info!(
        "Collecting subsections from {} ({:?} between pages)",
        scraper.config().index_url(),
        scraper.config().request_delay
    );

    let mut links = scraper.fetch_chapter_links().await.unwrap_or_else(|e| {
        log::error!("Error fetching subsection index: {}", e);
        process::exit(1);
    });

    if let Some(limit) = cli.limit {
        links.truncate(limit.into());
    }

    println!(
        "Found {} subsection links, starting collection...",
        links.len()
    );

    let records = scraper
        .collect_contacts(&links, |event| match event {
            CollectEvent::Started { index, total, url } => println!("[{index}/{total}] {url}"),
            CollectEvent::Failed { url, error } => println!("Error: {error} at {url}"),
        })
        .await;

    let paths = export_all(&records, &cli.output).unwrap_or_else(|e| {
        log::error!("Error writing output files: {}", e);
        process::exit(1);
    });

    println!(
        "Done. Files written: {} and {}",
        paths.csv.display(),
        paths.xlsx.display()
    );

    match cli.format {
        OutputFormat::Text => print!("{}", CollectionStats::from_records(&records)),
        OutputFormat::Json => match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
    }
}
