use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use search_core::{
    paginate, process_queries, remove_duplicates, DocId, Document, DocumentStatus, EngineConfig,
    ExecutionPolicy, RequestQueue, SearchEngine, StopWords,
};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<i32>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load documents into an in-memory TF-IDF index and query it", long_about = None)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Input path (JSON/JSONL file or directory of them)
    #[arg(long)]
    input: String,
    /// Blank-delimited stop words
    #[arg(long, env = "STOP_WORDS", default_value = "")]
    stop_words: String,
    /// Maximum number of hits per query
    #[arg(long, default_value_t = search_core::config::MAX_RESULT_DOCUMENT_COUNT)]
    max_results: usize,
    /// Lock shards used by the parallel ranking path
    #[arg(long, default_value_t = search_core::config::DEFAULT_SCORE_BUCKETS)]
    buckets: usize,
    /// Sliding window of the empty-result tracker
    #[arg(long, default_value_t = search_core::config::DEFAULT_REQUEST_WINDOW)]
    window: usize,
    /// Remove documents with duplicate word sets after loading
    #[arg(long, default_value_t = false)]
    dedup: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Seq,
    Par,
}

impl From<Policy> for ExecutionPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Seq => ExecutionPolicy::Sequential,
            Policy::Par => ExecutionPolicy::Parallel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents for one or more queries
    Search {
        /// Query text; repeat for several queries
        #[arg(long = "query", required = true)]
        queries: Vec<String>,
        /// Only documents with this status
        #[arg(long, value_parser = parse_status, default_value = "ACTUAL")]
        status: DocumentStatus,
        #[arg(long, value_enum, default_value_t = Policy::Seq)]
        policy: Policy,
        /// Hits per printed page
        #[arg(long, default_value_t = 2)]
        page_size: usize,
    },
    /// Run all queries on the rayon pool and print the joined hits
    Batch {
        #[arg(long = "query", required = true)]
        queries: Vec<String>,
    },
    /// Show which query words a document contains
    Match {
        #[arg(long)]
        query: String,
        #[arg(long)]
        id: DocId,
        #[arg(long, value_enum, default_value_t = Policy::Seq)]
        policy: Policy,
    },
}

fn parse_status(s: &str) -> Result<DocumentStatus, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_uppercase()))
        .map_err(|_| format!("unknown status {s:?}; expected ACTUAL, IRRELEVANT, BANNED or REMOVED"))
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let engine = build_engine(&cli.engine)?;

    match cli.command {
        Commands::Search { queries, status, policy, page_size } => {
            let mut tracker = RequestQueue::new(&engine);
            for query in &queries {
                println!("Search results for query: {query}");
                let hits = match ExecutionPolicy::from(policy) {
                    ExecutionPolicy::Sequential => tracker.add_find_request_by_status(query, status),
                    ExecutionPolicy::Parallel => engine.par_find_top_documents_by_status(query, status),
                };
                match hits {
                    Ok(hits) => print_pages(&hits, page_size),
                    Err(e) => println!("Query error: {e}"),
                }
            }
            tracing::info!(empty = tracker.no_result_requests(), "queries without results");
        }
        Commands::Batch { queries } => {
            let results = process_queries(&engine, &queries)?;
            for (query, hits) in queries.iter().zip(&results) {
                println!("{} documents for query: {query}", hits.len());
            }
            for doc in results.iter().flatten() {
                println!("{doc}");
            }
        }
        Commands::Match { query, id, policy } => {
            let (words, status) = engine.match_document_with(policy.into(), &query, id)?;
            println!("{{ document_id = {id}, status = {status:?}, words = {} }}", words.join(" "));
        }
    }
    Ok(())
}

fn build_engine(args: &EngineArgs) -> Result<SearchEngine> {
    let config = EngineConfig {
        max_result_document_count: args.max_results,
        score_buckets: args.buckets,
        request_window: args.window,
        ..EngineConfig::default()
    };
    let engine = SearchEngine::with_config(StopWords::parse(&args.stop_words)?, config)?;

    let mut loaded = 0usize;
    let mut rejected = 0usize;
    for file in collect_input_files(Path::new(&args.input)) {
        for doc in read_docs(&file).with_context(|| format!("reading {}", file.display()))? {
            match engine.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    rejected += 1;
                    tracing::warn!(id = doc.id, error = %e, "document rejected");
                }
            }
        }
    }
    tracing::info!(loaded, rejected, "ingested documents");

    if args.dedup {
        let removed = remove_duplicates(&engine)?;
        tracing::info!(removed = removed.len(), "duplicates removed");
    }
    Ok(engine)
}

fn collect_input_files(input_path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    }
    files
}

fn read_docs(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut docs = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            docs.push(serde_json::from_str(&line)?);
        }
        return Ok(docs);
    }
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => {
            arr.into_iter().map(serde_json::from_value).collect::<Result<Vec<InputDoc>, _>>()?
        }
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(docs)
}

fn print_pages(hits: &[Document], page_size: usize) {
    for page in &paginate(hits, page_size) {
        println!("{page}");
        println!("Page break");
    }
}
