mod aggregate;
mod dictionary;
mod error;
mod export;
mod extract;
mod pattern;
mod pipeline;
mod report;
mod resources;
mod scanner;
mod sentiment;
mod services;
mod trajectory;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use error::{Error, Result};
use export::Exports;
use pipeline::Services;
use resources::Resources;
use services::{LexiconPolarity, LexiconTagger, TfIdfRanker};

const DATA_DIR: &str = "data";
const OUTPUT_DIR: &str = "output";
const DEFAULT_CORPUS: &[&str] = &["chinese-poetry/全唐诗", "chinese-poetry/宋词"];

#[derive(Parser)]
#[command(
    name = "poetry_geo",
    about = "Place names, sentiment and poet journeys in classical Chinese poetry"
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a corpus → output/*.json
    Analyze {
        /// Corpus root directories (default: chinese-poetry/全唐诗 and 宋词)
        corpus: Vec<PathBuf>,
        /// Directory holding the optional dictionary and lookup tables
        #[arg(long, default_value = DATA_DIR)]
        data: PathBuf,
        #[arg(long, default_value = OUTPUT_DIR)]
        output: PathBuf,
        /// Stop loading after this many poems
        #[arg(long, default_value_t = 10_000)]
        max_poems: usize,
        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the most-mentioned places from a previous run
    Top {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value = DATA_DIR)]
        data: PathBuf,
        #[arg(long, default_value = OUTPUT_DIR)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Some(Command::Analyze {
            corpus,
            data,
            output,
            max_poems,
            threads,
        }) => run_analyze(corpus, &data, &output, max_poems, threads),
        Some(Command::Top {
            limit,
            data,
            output,
        }) => run_top(limit, &data, &output),
        // Default: analyze the default corpus
        None => run_analyze(
            Vec::new(),
            Path::new(DATA_DIR),
            Path::new(OUTPUT_DIR),
            10_000,
            None,
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::NoData(msg)) => {
            eprintln!("Nothing to do: {msg}");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
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

// ═══════════════════════════════════════════════════════════════════════
//  ANALYZE MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_analyze(
    corpus: Vec<PathBuf>,
    data: &Path,
    output: &Path,
    max_poems: usize,
    threads: Option<usize>,
) -> Result<()> {
    let roots = if corpus.is_empty() {
        DEFAULT_CORPUS.iter().map(PathBuf::from).collect()
    } else {
        corpus
    };

    let resources = Resources::load(data);
    let poems = scanner::scan_corpus(&roots, max_poems);
    if poems.is_empty() {
        return Err(Error::no_data(format!(
            "no poems found under {}",
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let tagger = LexiconTagger::new(
        resources
            .dictionary
            .surface_forms()
            .chain(resources.place_lexicon.iter().map(String::as_str)),
    );
    let ranker = TfIdfRanker::fit(poems.iter().map(|p| p.content.as_str()));
    let services = Services {
        tagger: &tagger,
        polarity: &LexiconPolarity,
        ranker: &ranker,
    };

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        pool = pool.num_threads(n);
    }
    let pool = pool.build()?;
    info!(threads = pool.current_num_threads(), poems = poems.len(), "analyzing");

    let analysis = pool.install(|| pipeline::analyze_corpus(&poems, &resources, services))?;
    info!(
        analyzed = analysis.poems_analyzed,
        skipped = analysis.poems_skipped,
        places = analysis.views.geo_stats.len(),
        trajectories = analysis.trajectories.len(),
        "analysis complete"
    );

    Exports::build(analysis.views, &analysis.trajectories, &resources.exclusion).write(output)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  TOP MODE: ranked place table from cached output
// ═══════════════════════════════════════════════════════════════════════

fn run_top(limit: usize, data: &Path, output: &Path) -> Result<()> {
    let exclusion = Resources::load(data).exclusion;
    let mut stats = export::read_geo_stats(output).map_err(|e| match e {
        Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => Error::no_data(format!(
            "{} not found, run `analyze` first",
            output.join(export::GEO_STATS_FILE).display()
        )),
        other => other,
    })?;
    stats.retain(|s| !exclusion.contains(&s.name));
    stats.sort_by(|a, b| b.total_count.cmp(&a.total_count).then_with(|| a.name.cmp(&b.name)));

    if stats.is_empty() {
        return Err(Error::no_data("geo_stats.json holds no places"));
    }

    println!("{}", report::render_top(&stats, limit));
    eprintln!("\nTotal: {} places", stats.len());
    Ok(())
}
