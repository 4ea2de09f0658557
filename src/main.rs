//! Command-line interface for tm-tools-rs
//!
//! Usage:
//!   tm-tools segment --lang bo text.txt
//!   tm-tools qc ~/.monlamAI/data/TMs --tm-ids TM0001 TM0002
//!   tm-tools parse-logs logs/ --errors

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, LevelFilter};

use tm_tools::pipeline::{BatchReport, DirSourceProvider, Pipeline};
use tm_tools::qc_log::{parse_failed_downloads, parse_ranks, qc_log_files, read_logs};
use tm_tools::tm::list_records;
use tm_tools::{
    find_split_affix, fix_split_affix, AlignmentMetric, Config, Lang, Result, SentTokenizer,
    SyllableTokenizer, TmId,
};

#[derive(Parser)]
#[command(name = "tm-tools")]
#[command(version)]
#[command(about = "Segmentation and QC of Tibetan/English translation memories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug output; QC also logs every ranked pair
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a text into one sentence per line
    Segment {
        /// Language of the text
        #[arg(short, long)]
        lang: Lang,

        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Re-attach genitive affixes split off their stem, in place
    FixAffix {
        /// Tibetan sentence-per-line files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Score, mark and save TM records
    Qc {
        /// Directory of TM records
        tms_path: PathBuf,

        /// Records to check
        #[arg(long, num_args = 1.., required_unless_present = "all")]
        tm_ids: Vec<TmId>,

        /// Every record of the collection
        #[arg(long, conflicts_with = "tm_ids")]
        all: bool,

        /// Alignment metric
        #[arg(short, long, value_enum, default_value = "similarity")]
        metric: MetricKind,
    },

    /// Restore the source wording of TM records, keeping their segmentation
    Reconcile {
        /// Records to reconcile
        #[arg(long, num_args = 1.., required_unless_present = "all")]
        tm_ids: Vec<TmId>,

        /// Every record of the collection
        #[arg(long, conflicts_with = "tm_ids")]
        all: bool,

        /// Directory of TM records (default from config)
        #[arg(long)]
        tms_path: Option<PathBuf>,

        /// Directory of source texts (default from config)
        #[arg(long)]
        texts_path: Option<PathBuf>,
    },

    /// Strip placeholders and template markup from TM records
    Clean {
        /// Records to clean
        #[arg(long, num_args = 1.., required_unless_present = "all")]
        tm_ids: Vec<TmId>,

        /// Every record of the collection
        #[arg(long, conflicts_with = "tm_ids")]
        all: bool,

        /// Directory of TM records (default from config)
        #[arg(long)]
        tms_path: Option<PathBuf>,
    },

    /// Summarize QC logs
    ParseLogs {
        /// Log files, or directories holding qc-*.log files
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// List records whose sources failed to download instead of ranks
        #[arg(long)]
        errors: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricKind {
    /// Embedding similarity, marked with rank glyphs
    Similarity,
    /// Character length ratio, marked with notice signs
    CharLen,
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error opening log file: {}", e);
        std::process::exit(1);
    }

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Segment { lang, file } => segment(lang, file.as_deref()),
        Commands::FixAffix { files } => fix_affix_files(&files),
        Commands::Qc {
            tms_path,
            tm_ids,
            all,
            metric,
        } => qc(&config, &tms_path, &tm_ids, all, metric, cli.verbose),
        Commands::Reconcile {
            tm_ids,
            all,
            tms_path,
            texts_path,
        } => reconcile(&config, &tm_ids, all, tms_path, texts_path),
        Commands::Clean {
            tm_ids,
            all,
            tms_path,
        } => clean(&config, &tm_ids, all, tms_path),
        Commands::ParseLogs { logs, errors, json } => parse_logs(&logs, errors, json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn segment(lang: Lang, file: Option<&Path>) -> Result<bool> {
    let text = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let segmented = SentTokenizer::new(SyllableTokenizer).sent_tokenize(&text, lang)?;
    print!("{}", segmented);
    if !segmented.is_empty() && !segmented.ends_with('\n') {
        println!();
    }
    Ok(true)
}

fn fix_affix_files(files: &[PathBuf]) -> Result<bool> {
    let mut ok = true;
    for path in files {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                ok = false;
                continue;
            }
        };
        let found = find_split_affix(&text).len();
        if found == 0 {
            continue;
        }
        if let Err(e) = fs::write(path, fix_split_affix(&text)) {
            error!("{}: {}", path.display(), e);
            ok = false;
            continue;
        }
        info!("{}: fixed {} split affixes", path.display(), found);
    }
    Ok(ok)
}

#[cfg(feature = "http")]
fn similarity_metric(config: &Config) -> Result<Box<dyn AlignmentMetric>> {
    use tm_tools::{Error, HttpSimilarityOracle, RetryingOracle, SimilarityMetric};

    let sim = &config.similarity;
    let endpoint = sim
        .endpoint
        .as_deref()
        .ok_or_else(|| Error::Config("similarity.endpoint is not set".into()))?;
    let oracle = RetryingOracle::new(
        HttpSimilarityOracle::new(endpoint, sim.timeout())?,
        sim.max_retries,
        sim.retry_delay(),
    );
    let metric = SimilarityMetric::with_params(oracle, sim.threshold, sim.max_ranks)
        .batch_size(sim.batch_size);
    Ok(Box::new(metric))
}

#[cfg(not(feature = "http"))]
fn similarity_metric(_config: &Config) -> Result<Box<dyn AlignmentMetric>> {
    Err(tm_tools::Error::Config(
        "similarity QC needs the http feature".into(),
    ))
}

/// The given ids, or every record under `tms_path` with `all`
fn select_records(tms_path: &Path, tm_ids: &[TmId], all: bool) -> Result<Vec<TmId>> {
    if !all {
        return Ok(tm_ids.to_vec());
    }
    let ids: Vec<TmId> = list_records(tms_path)?
        .into_iter()
        .map(|record| record.id().clone())
        .collect();
    info!("{} records found in {}", ids.len(), tms_path.display());
    Ok(ids)
}

fn qc(
    config: &Config,
    tms_path: &Path,
    tm_ids: &[TmId],
    all: bool,
    metric: MetricKind,
    verbose: bool,
) -> Result<bool> {
    let tm_ids = &select_records(tms_path, tm_ids, all)?;
    let pipeline = Pipeline::new(tms_path, config.workers)?;
    let report = match metric {
        MetricKind::Similarity => {
            let metric = similarity_metric(config)?;
            let marker = config.marker.rank_marker()?;
            pipeline.qc(tm_ids, metric.as_ref(), &marker, verbose)
        }
        MetricKind::CharLen => pipeline.qc(
            tm_ids,
            &config.char_len.metric(),
            &config.marker.notice_marker(),
            verbose,
        ),
    };

    for (id, outcome) in report.succeeded() {
        println!(
            "{}\t{}\t{:.4}\t{}",
            id, outcome.rank, outcome.score, outcome.flagged
        );
    }
    Ok(report_failures(&report))
}

fn reconcile(
    config: &Config,
    tm_ids: &[TmId],
    all: bool,
    tms_path: Option<PathBuf>,
    texts_path: Option<PathBuf>,
) -> Result<bool> {
    let tms_path = tms_path.unwrap_or_else(|| config.tms_path());
    let tm_ids = select_records(&tms_path, tm_ids, all)?;
    let pipeline = Pipeline::new(&tms_path, config.workers)?;
    let sources = DirSourceProvider::new(texts_path.unwrap_or_else(|| config.texts_path()));
    let report = pipeline.reconcile(&tm_ids, &sources);
    Ok(report_failures(&report))
}

fn clean(
    config: &Config,
    tm_ids: &[TmId],
    all: bool,
    tms_path: Option<PathBuf>,
) -> Result<bool> {
    let tms_path = tms_path.unwrap_or_else(|| config.tms_path());
    let tm_ids = select_records(&tms_path, tm_ids, all)?;
    let pipeline = Pipeline::new(&tms_path, config.workers)?;
    let report = pipeline.clean(&tm_ids);
    Ok(report_failures(&report))
}

fn report_failures<T>(report: &BatchReport<T>) -> bool {
    for (id, e) in report.failed() {
        eprintln!("{}\t{}", id, e);
    }
    report.is_success()
}

fn parse_logs(paths: &[PathBuf], errors: bool, json: bool) -> Result<bool> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(qc_log_files(path)?);
        } else {
            files.push(path.clone());
        }
    }
    let logs = read_logs(&files)?;

    if errors {
        let failed = parse_failed_downloads(&logs);
        if json {
            println!("{}", serde_json::to_string_pretty(&failed)?);
        } else {
            for id in &failed {
                println!("{}", id);
            }
        }
    } else {
        let ranks = parse_ranks(&logs);
        if json {
            println!("{}", serde_json::to_string_pretty(&ranks)?);
        } else {
            for entry in &ranks {
                println!("{}\t{}\t{}", entry.tm_id, entry.rank, entry.score);
            }
        }
    }
    Ok(true)
}
