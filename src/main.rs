pub mod ircore;
use clap::{Parser, Subcommand};
use ircore::engine::Engine;
use ircore::error::Result;
use ircore::eval;
use ircore::ranking::{self, DocScore};
use ircore::utils::serialize::{create_text_file, open_text_file};
use std::io::{self, Write};
use std::path::Path;
use std::process;

// precision cut-offs reported by `evaluate`
const EVAL_K: [usize; 2] = [5, 10];

#[derive(Parser)]
#[derive(Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// A vector space retrieval engine with Boolean search
struct Cli {
    #[clap(short, long, value_parser, default_value_t = String::from(".rir/rir.idx"))]
    /// Index snapshot file
    index_dir: String,
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
#[derive(Debug)]
enum Commands {
    /// Build index
    Build {
        #[clap(short, long, value_parser)]
        /// Corpus directory
        corpus_dir: String,
    },
    /// Ranked search by cosine similarity
    Search {
        #[clap(value_parser)]
        /// query text
        query: String,
        #[clap(short, value_parser)]
        /// number of results, defaults to top_k of the corpus config
        k: Option<usize>,
        #[clap(long, action)]
        /// expand the query with synonyms and term weights
        expand: bool,
        #[clap(long, action)]
        /// print results as json
        json: bool,
        #[clap(long, value_parser)]
        /// also write results to this file
        save: Option<String>,
        #[clap(long, action)]
        /// show the beginning of each document
        preview: bool,
    },
    /// Run a query with and without expansion and list what expansion adds
    Compare {
        #[clap(value_parser)]
        query: String,
        #[clap(short, value_parser, default_value_t = 5)]
        k: usize,
    },
    /// Boolean search, all terms by default
    Boolean {
        #[clap(value_parser, required = true)]
        terms: Vec<String>,
        #[clap(long, action)]
        /// match any of the terms
        any: bool,
    },
    /// Export dictionary, indexes, tf-idf and synonyms as text
    Export {
        #[clap(short, long, value_parser)]
        output_dir: String,
        #[clap(long, action)]
        /// skip reading the exported files back
        no_verify: bool,
    },
    /// Precision@k over judged queries
    Evaluate {
        #[clap(short, long, value_parser)]
        /// lines of "id<TAB>query<TAB>DocA,DocB"
        queries: String,
        #[clap(short, long, value_parser)]
        /// report file, stdout if omitted
        report: Option<String>,
        #[clap(long, action)]
        expand: bool,
    },
    /// Index statistics
    Stats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let index_path = Path::new(&cli.index_dir);
    match &cli.command {
        Some(Commands::Build { corpus_dir }) => command_build_index(corpus_dir, index_path),
        Some(Commands::Search { query, k, expand, json, save, preview }) => {
            let output = SearchOutput { json: *json, preview: *preview };
            command_search(index_path, query, *k, *expand, output, save.as_deref())
        }
        Some(Commands::Compare { query, k }) => command_compare(index_path, query, *k),
        Some(Commands::Boolean { terms, any }) => command_boolean(index_path, terms, *any),
        Some(Commands::Export { output_dir, no_verify }) => {
            let engine = Engine::load_from(index_path)?;
            engine.save_all(Path::new(output_dir))?;
            if !no_verify {
                engine.verify_exports(Path::new(output_dir))?;
            }
            Ok(())
        }
        Some(Commands::Evaluate { queries, report, expand }) => {
            command_evaluate(index_path, queries, report.as_deref(), *expand)
        }
        Some(Commands::Stats) | None => {
            let engine = Engine::load_from(index_path)?;
            println!("{}", engine.stats());
            match engine.compression_ratio() {
                Ok(ratio) => println!("compression ratio: {:.2}%", ratio),
                Err(e) => log::warn!("compression ratio unavailable: {}", e),
            }
            Ok(())
        }
    }
}

fn command_build_index(corpus_dir: &str, index_path: &Path) -> Result<()> {
    let engine = Engine::build_from_dir(Path::new(corpus_dir))?;
    engine.save_to(index_path)?;
    println!("{} documents indexed", engine.doc_count());
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct SearchOutput {
    json: bool,
    preview: bool,
}

fn command_search(
    index_path: &Path,
    query: &str,
    k: Option<usize>,
    expand: bool,
    output: SearchOutput,
    save: Option<&str>,
) -> Result<()> {
    let engine = Engine::load_from(index_path)?;
    let k = k.unwrap_or(engine.cfg().top_k);
    let results = engine.search(query, k, expand);
    if output.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&engine, &results, output.preview)?;
    }
    if let Some(path) = save {
        ranking::save_results(Path::new(path), &results)?;
    }
    Ok(())
}

fn print_results(engine: &Engine, results: &[DocScore], preview: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} results", results.len())?;
    for (rank, doc) in results.iter().enumerate() {
        let path = engine.doc_path(&doc.docid).unwrap_or("");
        writeln!(out, "{}\t{}\t{:.6}\t{}", rank + 1, doc.docid, doc.score, path)?;
        if preview {
            if let Some(text) = engine.doc_preview(&doc.docid) {
                writeln!(out, "    {}", text.split_whitespace().collect::<Vec<_>>().join(" "))?;
            }
        }
    }
    Ok(())
}

fn command_compare(index_path: &Path, query: &str, k: usize) -> Result<()> {
    let engine = Engine::load_from(index_path)?;
    let comparison = engine.compare(query, k);
    println!("without expansion:");
    print_results(&engine, &comparison.without_expansion, false)?;
    println!("with expansion:");
    print_results(&engine, &comparison.with_expansion, false)?;
    if comparison.new_documents.is_empty() {
        println!("no new documents with expansion");
    } else {
        let new: Vec<&str> = comparison.new_documents.iter().map(|d| d.as_str()).collect();
        println!("new documents with expansion: {}", new.join(", "));
    }
    Ok(())
}

fn command_boolean(index_path: &Path, terms: &[String], any: bool) -> Result<()> {
    let engine = Engine::load_from(index_path)?;
    let text = terms.join(" ");
    let docs = if any {
        engine.search_or(&text)
    } else {
        engine.search_and(&text)
    };
    println!("{} documents", docs.len());
    for doc in docs {
        println!("{}\t{}", doc, engine.doc_path(&doc).unwrap_or(""));
    }
    Ok(())
}

fn command_evaluate(index_path: &Path, queries: &str, report: Option<&str>, expand: bool) -> Result<()> {
    let engine = Engine::load_from(index_path)?;
    let mut evaluation = eval::read_queries(open_text_file(Path::new(queries))?)?;
    engine.evaluate(&mut evaluation, &EVAL_K, expand);
    match report {
        Some(path) => {
            let mut writer = create_text_file(Path::new(path))?;
            evaluation.write_report(&mut writer)?;
            writer.flush()?;
            log::info!("evaluation report saved to {}", path);
        }
        None => evaluation.write_report(&mut io::stdout().lock())?,
    }
    for k in EVAL_K {
        println!("mean precision@{}: {:.4}", k, evaluation.mean_precision(k));
    }
    Ok(())
}
