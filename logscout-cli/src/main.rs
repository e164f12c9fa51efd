use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use logscout::{
    collect_log_files, combine_patterns,
    config::{EncodingMode, SearchConfig},
    source::LogRecord,
    FileMatchRecord, SearchEngine, SearchError, SearchEvent, SearchSummary,
};
use serde::Serialize;
use std::{
    num::NonZeroUsize,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Pattern to search for (can be specified multiple times)
    #[arg(short = 'p', long = "pattern")]
    patterns: Vec<String>,

    /// Root directory to search in
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// File extensions to include (e.g. dlt,log)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Number of records to show before each match
    #[arg(short = 'B', long, default_value = "0")]
    context_before: usize,

    /// Number of records to show after each match
    #[arg(short = 'A', long, default_value = "0")]
    context_after: usize,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Print the final results as JSON
    #[arg(long)]
    json: bool,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop searching after this long and report what was found (e.g. 30s, 2m)
    #[arg(short, long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search log files for patterns
    Search(Box<CliSearchConfig>),
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a SearchSummary,
    files_searched: usize,
    timed_out: bool,
}

/// What the event loop saw before the search ended
struct Outcome {
    timed_out: bool,
    elapsed: Duration,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search(*args),
    }
}

fn search(args: CliSearchConfig) -> Result<()> {
    let file_config = SearchConfig::load_from(args.config.as_deref())
        .map_err(|e| SearchError::config_error(format!("Failed to load configuration: {}", e)))?;
    let defaults = SearchConfig::default();

    let encoding_mode = match args.encoding.as_deref().map(str::to_lowercase).as_deref() {
        None => defaults.encoding_mode,
        Some("lossy") => EncodingMode::Lossy,
        Some("failfast") => EncodingMode::FailFast,
        Some(other) => {
            return Err(SearchError::config_error(format!(
                "Unknown encoding mode '{}', expected failfast or lossy",
                other
            )))
        }
    };

    let cli_config = SearchConfig {
        patterns: args.patterns,
        root_path: args.root,
        file_extensions: args
            .extensions
            .map(|e| {
                e.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .or(defaults.file_extensions),
        ignore_patterns: args.ignore,
        stats_only: args.stats,
        context_before: args.context_before,
        context_after: args.context_after,
        thread_count: args.threads.unwrap_or(file_config.thread_count),
        log_level: args.log_level.unwrap_or(defaults.log_level),
        encoding_mode,
    };
    let config = file_config.merge_with_cli(cli_config);

    init_tracing(&config.log_level);

    let expression = combine_patterns(&config.patterns)?;
    let files = collect_log_files(&config)?;
    if files.is_empty() {
        println!(
            "No log files found under {}",
            config.root_path.display().to_string().blue()
        );
        return Ok(());
    }
    let files_searched = files.len();

    let engine = SearchEngine::new(&config)?;
    let live_output = !config.stats_only && !args.json;
    let outcome = consume_events(&engine, files, &expression, args.timeout, live_output)?;

    let summary = engine.results().summary();
    engine.metrics().log_stats();
    info!(
        "Search over {} files took {}",
        files_searched,
        humantime::format_duration(outcome.elapsed)
    );

    if args.json {
        let report = JsonReport {
            summary: &summary,
            files_searched,
            timed_out: outcome.timed_out,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| SearchError::config_error(format!("Failed to serialize results: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if outcome.timed_out {
        println!(
            "{}",
            format!(
                "Search stopped after {}, results are partial",
                humantime::format_duration(outcome.elapsed)
            )
            .yellow()
        );
    }
    let records = engine.results().records();
    print_search_results(&summary, &records, &config);
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Starts the search and reports progress until it finishes, is stopped, or
/// `timeout` elapses (which soft-cancels it)
fn consume_events(
    engine: &SearchEngine,
    files: Vec<PathBuf>,
    expression: &str,
    timeout: Option<Duration>,
    live_output: bool,
) -> Result<Outcome> {
    let spinner = if live_output {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("searching {} files", files.len()));

    let events = engine.events();
    let started = Instant::now();
    let mut deadline = timeout.map(|t| started + t);
    let mut timed_out = false;
    let (mut found, mut partials) = (0usize, 0usize);

    engine.search(files, expression)?;

    loop {
        if deadline.is_some_and(|at| Instant::now() >= at) {
            debug!("Timeout reached, stopping search");
            engine.cancel(false);
            timed_out = true;
            deadline = None;
        }

        let received = match deadline {
            Some(at) => events.recv_deadline(at).map_err(|e| e.is_timeout()),
            None => events.recv().map_err(|_| false),
        };
        let event = match received {
            Ok(event) => event,
            Err(true) => continue,
            Err(false) => break,
        };

        match event {
            SearchEvent::FoundFile { index } => {
                found += 1;
                if let Some(record) = engine.results().at(index) {
                    if live_output {
                        spinner.suspend(|| {
                            println!(
                                "{} {} (record {})",
                                "found".green(),
                                record.path().display().to_string().blue(),
                                record.first_match()
                            )
                        });
                    }
                }
            }
            SearchEvent::ResultPartial { .. } => partials += 1,
            SearchEvent::Started => {}
            SearchEvent::Stopped { .. } | SearchEvent::SearchFinished => break,
        }
        spinner.set_message(format!(
            "{} matches in {} files",
            found + partials,
            found
        ));
    }

    spinner.finish_and_clear();
    Ok(Outcome {
        timed_out,
        elapsed: started.elapsed(),
    })
}

fn print_search_results(
    summary: &SearchSummary,
    records: &[Arc<FileMatchRecord>],
    config: &SearchConfig,
) {
    if config.stats_only {
        println!(
            "Found {} matches in {} files",
            summary.total_matches, summary.files_with_matches
        );
        return;
    }

    let with_context = config.context_before > 0 || config.context_after > 0;
    for record in records {
        println!("\n{}", record.path().display().to_string().blue());
        for (i, position) in record.matches().into_iter().enumerate() {
            if with_context && i > 0 {
                println!("{}", "--".dimmed());
            }
            for entry in record.context(position, config.context_before, config.context_after) {
                if entry.position == position {
                    println!("{} {}", ">".yellow(), format_record(&entry).bold());
                } else {
                    println!("  {}", format_record(&entry));
                }
            }
        }
    }

    println!(
        "\nFound {} matches in {} files",
        summary.total_matches, summary.files_with_matches
    );
}

/// One row of the result view: index, timestamp, app id, context id, payload
fn format_record(record: &LogRecord) -> String {
    let timestamp = record
        .timestamp
        .map(|ts| humantime::format_rfc3339_seconds(ts).to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>6} {:<20} {:<8} {:<8} {}",
        record.position,
        timestamp,
        record.app_id.as_deref().unwrap_or("-"),
        record.context_id.as_deref().unwrap_or("-"),
        record.payload
    )
}
