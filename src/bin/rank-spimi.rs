//! CLI entry point: `indexer`, `searcher` (`interactive`/`batch`), and
//! `evaluator` subcommands over one binary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rank_spimi::eval::{self, Metric};
use rank_spimi::prelude::*;
use rank_spimi::tokenizer::{self, DEFAULT_REGEX};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "SPIMI inverted-index builder and ranked retrieval engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a SPIMI index from a line-delimited JSON corpus.
    Indexer(IndexerArgs),
    /// Query a built index.
    Searcher {
        #[command(subcommand)]
        mode: SearcherMode,
    },
    /// Compute retrieval-quality metrics over a gold-standard/run file pair.
    Evaluator(EvaluatorArgs),
}

#[derive(Args)]
struct IndexerArgs {
    path_to_collection: PathBuf,
    index_output_folder: PathBuf,
    #[arg(long, default_value_t = rank_spimi::memory::DEFAULT_THRESHOLD)]
    memory_threshold: f32,
    #[arg(long)]
    store_positions: bool,
    #[arg(long, default_value_t = 0)]
    min_length: usize,
    #[arg(long)]
    stopwords_path: Option<PathBuf>,
    #[arg(long)]
    stemmer: bool,
    #[arg(long, default_value = DEFAULT_REGEX)]
    regex: String,
    #[arg(long)]
    no_lowercase: bool,
}

#[derive(Subcommand)]
enum SearcherMode {
    /// Read queries from stdin, one per line, printing ranked results.
    Interactive(SearcherArgs),
    /// Read queries from a gold/run-style JSONL file, writing ranked
    /// results to `output_file` in the same format.
    Batch {
        #[command(flatten)]
        common: SearcherArgs,
        path_to_queries: PathBuf,
        output_file: PathBuf,
    },
}

#[derive(Args)]
struct SearcherArgs {
    index_folder: PathBuf,
    #[arg(long, default_value_t = 10)]
    top_k: usize,
    #[arg(long, value_enum, default_value_t = RankingKind::Bm25)]
    ranking: RankingKind,
    #[arg(long, default_value_t = 1.2)]
    k1: f32,
    #[arg(long, default_value_t = 0.75)]
    b: f32,
    #[arg(long, value_enum, default_value_t = SmartKind::LncLtc)]
    smart: SmartKind,
    #[arg(long, value_enum, default_value_t = SearchKind::Standard)]
    search_type: SearchKind,
    #[arg(long, default_value_t = 0)]
    max_distance: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankingKind {
    Bm25,
    Tfidf,
}

#[derive(Clone, Copy, ValueEnum)]
enum SmartKind {
    #[value(name = "lnc.ltc")]
    LncLtc,
    #[value(name = "bnn.bnc")]
    BnnBnc,
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchKind {
    Standard,
    Phrase,
    Proximity,
}

#[derive(Args)]
struct EvaluatorArgs {
    gold_standard_file: PathBuf,
    run_file: PathBuf,
    #[arg(long, value_delimiter = ',', default_value = "precision,recall,f1,ap,dcg")]
    metrics: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Indexer(args) => run_indexer(args),
        Commands::Searcher { mode } => run_searcher(mode),
        Commands::Evaluator(args) => run_evaluator(args),
    }
}

fn run_indexer(args: IndexerArgs) -> Result<()> {
    let stopwords = match &args.stopwords_path {
        Some(path) => {
            tokenizer::load_stopwords(path).with_context(|| format!("reading stopwords from {}", path.display()))?
        }
        None => Vec::new(),
    };
    let tokenizer = Tokenizer::new(rank_spimi::tokenizer::TokenizerConfig {
        regex: args.regex,
        lowercase: !args.no_lowercase,
        min_length: args.min_length,
        stopwords,
        stem: args.stemmer,
    });
    let mode = if args.store_positions { IndexMode::Positional } else { IndexMode::Frequency };
    let config = BuildConfig {
        corpus_path: args.path_to_collection,
        output_folder: args.index_output_folder,
        mode,
        memory_threshold: args.memory_threshold,
    };
    build(&config, &tokenizer).context("building index")?;
    Ok(())
}

fn run_searcher(mode: SearcherMode) -> Result<()> {
    match mode {
        SearcherMode::Interactive(common) => run_interactive(common),
        SearcherMode::Batch { common, path_to_queries, output_file } => {
            run_batch(common, path_to_queries, output_file)
        }
    }
}

fn model_from_args(args: &SearcherArgs) -> RankingModel {
    match args.ranking {
        RankingKind::Bm25 => RankingModel::Bm25(Bm25Params { k1: args.k1, b: args.b }),
        RankingKind::Tfidf => RankingModel::TfIdf(match args.smart {
            SmartKind::LncLtc => SmartNotation::LncLtc,
            SmartKind::BnnBnc => SmartNotation::BnnBnc,
        }),
    }
}

fn search_type_from_args(args: &SearcherArgs) -> SearchType {
    match args.search_type {
        SearchKind::Standard => SearchType::Standard,
        SearchKind::Phrase => SearchType::Phrase,
        SearchKind::Proximity => SearchType::Proximity { max_distance: args.max_distance },
    }
}

fn run_interactive(args: SearcherArgs) -> Result<()> {
    let evaluator = Evaluator::open(&args.index_folder).context("opening index")?;
    let tokenizer = Tokenizer::new(rank_spimi::tokenizer::TokenizerConfig::default());
    let model = model_from_args(&args);
    let search_type = search_type_from_args(&args);

    let stdin = std::io::stdin();
    let mut line = String::new();
    println!("Enter a query (Ctrl-D to exit):");
    while stdin.read_line(&mut line)? > 0 {
        let query = line.trim();
        if !query.is_empty() {
            match evaluator.query(&tokenizer, query, model, search_type, args.top_k) {
                Ok(results) => {
                    for result in results {
                        println!("{}\t{:.6}", result.pmid, result.score);
                    }
                }
                Err(err) => eprintln!("query error: {err}"),
            }
        }
        line.clear();
    }
    Ok(())
}

fn run_batch(args: SearcherArgs, path_to_queries: PathBuf, output_file: PathBuf) -> Result<()> {
    use std::io::{BufRead, Write};

    let evaluator = Evaluator::open(&args.index_folder).context("opening index")?;
    let tokenizer = Tokenizer::new(rank_spimi::tokenizer::TokenizerConfig::default());
    let model = model_from_args(&args);
    let search_type = search_type_from_args(&args);

    let input = std::fs::File::open(&path_to_queries)
        .with_context(|| format!("opening queries file {}", path_to_queries.display()))?;
    let mut output = std::io::BufWriter::new(
        std::fs::File::create(&output_file)
            .with_context(|| format!("creating output file {}", output_file.display()))?,
    );

    #[derive(serde::Deserialize)]
    struct Query {
        query_id: String,
        query_text: String,
    }

    for line in std::io::BufReader::new(input).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: Query = serde_json::from_str(&line)
            .with_context(|| format!("parsing query line {line:?}"))?;
        let results = evaluator
            .query(&tokenizer, &parsed.query_text, model, search_type, args.top_k)
            .unwrap_or_default();
        let pmids: Vec<i64> = results.iter().map(|r| r.pmid).collect();
        let record = serde_json::json!({ "query_id": parsed.query_id, "documents_pmid": pmids });
        writeln!(output, "{record}")?;
    }
    Ok(())
}

fn run_evaluator(args: EvaluatorArgs) -> Result<()> {
    let metrics: Vec<Metric> = args
        .metrics
        .iter()
        .map(|m| m.parse::<Metric>().map_err(|m| anyhow::anyhow!("unknown metric: {m}")))
        .collect::<Result<_>>()?;

    let scores = eval::evaluate(&args.gold_standard_file, &args.run_file, &metrics)
        .context("computing evaluation metrics")?;

    for metric in &metrics {
        let per_query = &scores[metric];
        let mean: f32 = if per_query.is_empty() {
            0.0
        } else {
            per_query.values().sum::<f32>() / per_query.len() as f32
        };
        println!("{metric:?}: {mean:.4}");
    }
    Ok(())
}
