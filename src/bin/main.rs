use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use markov_core::corpus::{discover, BatchReport, CorpusEncoder};
use markov_core::distance::{load_weight_order, write_pair_features};
use markov_core::frontend::JsonFrontend;
use markov_core::persistence::MatrixStore;
use markov_core::{IndexTables, MarkovEncoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "markov_encoder", version, about = "Second-order Markov fingerprints of syntax trees")]
struct Cli {
    /// Log debug events (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode one pre-parsed unit
    Encode {
        unit: PathBuf,
        /// Index tables (JSON)
        #[arg(short, long)]
        tables: PathBuf,
        /// Matrix store directory
        #[arg(short, long, default_value = "npy")]
        out: PathBuf,
    },
    /// Encode every unit under a directory
    Batch {
        corpus: PathBuf,
        #[arg(short, long)]
        tables: PathBuf,
        #[arg(short, long, default_value = "npy")]
        out: PathBuf,
        /// Extension of unit files
        #[arg(long, default_value = "json")]
        ext: String,
        /// Worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Write distance features for a CSV list of source pairs
    Distance {
        pairs: PathBuf,
        /// Matrix store directory
        #[arg(short, long, default_value = "npy")]
        store: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        /// Feature ranking; keeps the first `--features` entries
        #[arg(long)]
        weights: Option<PathBuf>,
        #[arg(long, default_value_t = 400)]
        features: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_encoder(tables: &Path) -> Result<MarkovEncoder> {
    let tables = IndexTables::from_json_file(tables)
        .with_context(|| format!("loading index tables from {}", tables.display()))?;
    Ok(MarkovEncoder::new(Arc::new(tables)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode { unit, tables, out } => {
            let corpus = CorpusEncoder::new(load_encoder(&tables)?, JsonFrontend::new(), MatrixStore::new(out));
            // One worker, so deep units get the same stack budget as in a batch.
            let mut report = corpus.run(std::slice::from_ref(&unit), Some(1))?;
            if let Some(failed) = report.failed.pop() {
                return Err(anyhow::Error::new(failed.error).context(format!("encoding {}", unit.display())));
            }
            let encoded = report.encoded.pop().context("encoder produced no result")?;
            println!(
                "{} {} -> {} ({} nodes, {} triads, {} null leaves, {} fallback columns)",
                "encoded".green().bold(),
                encoded.path.display(),
                encoded.stored.display(),
                encoded.stats.nodes,
                encoded.stats.triads,
                encoded.stats.null_leaves,
                encoded.stats.fallback_columns,
            );
        }
        Commands::Batch { corpus, tables, out, ext, threads } => {
            let started = Instant::now();
            let paths = discover(&corpus, &ext);
            if paths.is_empty() {
                bail!("no .{ext} files under {}", corpus.display());
            }
            let driver = CorpusEncoder::new(load_encoder(&tables)?, JsonFrontend::new(), MatrixStore::new(out))
                .with_unit_extension(ext);
            let report = driver.run(&paths, threads)?;
            print_summary(&report, started);
            if report.encoded.is_empty() {
                bail!("every file failed to encode");
            }
        }
        Commands::Distance { pairs, store, out, weights, features } => {
            let order = match weights {
                Some(path) => Some(
                    load_weight_order(&path, features)
                        .with_context(|| format!("reading feature ranking {}", path.display()))?,
                ),
                None => None,
            };
            let report = write_pair_features(&pairs, &MatrixStore::new(store), order.as_deref(), &out)
                .with_context(|| format!("computing distances for {}", pairs.display()))?;
            println!(
                "{} {} pairs to {} ({} skipped)",
                "wrote".green().bold(),
                report.written,
                out.display(),
                report.skipped
            );
        }
    }
    Ok(())
}

fn print_summary(report: &BatchReport, started: Instant) {
    for failed in &report.failed {
        println!("{} {}: {}", "failed".red().bold(), failed.path.display(), failed.error);
    }
    let gaps = report.coverage_gaps();
    println!(
        "{} {}/{} files in {:.2}s",
        "encoded".green().bold(),
        report.encoded.len(),
        report.total(),
        started.elapsed().as_secs_f64()
    );
    if gaps > 0 {
        println!("{} {gaps} files hit contexts missing from the index tables", "warning".yellow().bold());
    }
}
