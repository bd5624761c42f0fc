//! Command-line interface for the graph builder.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use textwrap::{fill, Options};

use crate::builder::{build_graph_with_progress, BuildOptions, BuildReport, DocumentStatus};
use crate::config::{validate_law_code, StoreConfig, DEFAULT_EDGE_BATCH_SIZE, DEFAULT_MIN_ARTICLE_CHARS};
use crate::error::Result;
use crate::laws::GraphConfig;
use crate::loader::{link_references, LinkReport};
use crate::normalize::{Normalizer, PlainTextNormalizer};
use crate::parsing::{LawParser, ParserConfig};
use crate::references::ReferenceResolver;
use crate::store::{GraphStore, MemoryStore, Neo4jStore};
use crate::types::{Document, LawType};
use crate::yaml::save_yaml;

/// Width of wrapped article previews.
const PREVIEW_WIDTH: usize = 80;

/// Characters of article text shown in a preview.
const PREVIEW_CHARS: usize = 160;

/// Articles previewed by the `parse` command.
const PREVIEW_ARTICLES: usize = 5;

/// Lawgraph Builder - Build a knowledge graph from Korean statute text.
#[derive(Parser)]
#[command(name = "lawgraph-builder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Graph store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// In-process graph, optionally persisted with --snapshot
    Memory,
    /// Neo4j server configured through NEO4J_* environment variables
    Neo4j,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse every registered statute and build the graph.
    Build {
        /// Law registry YAML (default: built-in building statutes)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory laid out as <CODE>/<Act|Decree|Rule>.txt
        #[arg(short, long)]
        source_dir: Option<PathBuf>,

        /// Only build these law codes (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        laws: Vec<String>,

        /// Delete the whole graph first
        #[arg(long)]
        clear: bool,

        #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
        store: StoreKind,

        /// JSON snapshot for the memory store
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Keep clause-less articles longer than this many characters
        #[arg(long, default_value_t = DEFAULT_MIN_ARTICLE_CHARS)]
        min_article_length: usize,

        /// Citation edges per store request
        #[arg(long, default_value_t = DEFAULT_EDGE_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Parse a single document and show or save the result.
    Parse {
        /// Extracted text of the document
        file: PathBuf,

        /// Law code (e.g., BUILDING)
        #[arg(long)]
        law_code: String,

        /// Act, Decree or Rule
        #[arg(long)]
        law_type: LawType,

        /// Write the parsed hierarchy as YAML
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_MIN_ARTICLE_CHARS)]
        min_article_length: usize,

        /// Keep pages that look like a table of contents
        #[arg(long)]
        no_skip_toc: bool,
    },

    /// Resolve citations over the articles already in the store.
    Link {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
        store: StoreKind,

        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_EDGE_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Show node and relationship counts.
    Stats {
        #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
        store: StoreKind,

        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List registered statutes and cross-statute references.
    Laws {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// A store opened for one command.
enum OpenStore {
    Memory {
        store: MemoryStore,
        snapshot: Option<PathBuf>,
    },
    Neo4j(Neo4jStore),
}

impl OpenStore {
    fn open(kind: StoreKind, snapshot: Option<PathBuf>) -> Result<Self> {
        match kind {
            StoreKind::Memory => {
                let store = match &snapshot {
                    Some(path) => MemoryStore::open(path)?,
                    None => MemoryStore::new(),
                };
                Ok(Self::Memory { store, snapshot })
            }
            StoreKind::Neo4j => Ok(Self::Neo4j(Neo4jStore::new(StoreConfig::from_env()?)?)),
        }
    }

    fn as_store(&self) -> &dyn GraphStore {
        match self {
            Self::Memory { store, .. } => store,
            Self::Neo4j(store) => store,
        }
    }

    /// Write the memory snapshot, if any.
    fn persist(&self) -> Result<()> {
        if let Self::Memory {
            store,
            snapshot: Some(path),
        } = self
        {
            store.save(path)?;
            println!("{} {}", style("Snapshot:").green().bold(), path.display());
        }
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<GraphConfig> {
    match path {
        Some(path) => GraphConfig::from_file(path),
        None => Ok(GraphConfig::builtin()),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Run the CLI. Returns `Ok(false)` when the command finished but some
/// documents or batches failed.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            source_dir,
            laws,
            clear,
            store,
            snapshot,
            min_article_length,
            batch_size,
        } => {
            let options = BuildOptions {
                source_dir,
                only: laws,
                clear,
                parser: ParserConfig::default().with_min_article_chars(min_article_length),
                batch_size,
            };
            build_command(config.as_deref(), &options, store, snapshot)
        }
        Commands::Parse {
            file,
            law_code,
            law_type,
            output,
            min_article_length,
            no_skip_toc,
        } => parse_command(
            &file,
            &law_code,
            law_type,
            output.as_deref(),
            ParserConfig::default().with_min_article_chars(min_article_length),
            !no_skip_toc,
        )
        .map(|()| true),
        Commands::Link {
            config,
            store,
            snapshot,
            batch_size,
        } => link_command(config.as_deref(), store, snapshot, batch_size),
        Commands::Stats { store, snapshot } => stats_command(store, snapshot).map(|()| true),
        Commands::Laws { config } => laws_command(config.as_deref()).map(|()| true),
    }
}

/// Execute the build command.
fn build_command(
    config_path: Option<&Path>,
    options: &BuildOptions,
    kind: StoreKind,
    snapshot: Option<PathBuf>,
) -> Result<bool> {
    let config = load_config(config_path)?;
    for code in &options.only {
        validate_law_code(code)?;
    }
    let store = OpenStore::open(kind, snapshot)?;

    println!(
        "{} {} statutes into the {} store",
        style("Building").bold(),
        style(if options.only.is_empty() {
            config.registry.len()
        } else {
            options.only.len()
        })
        .cyan(),
        style(format!("{kind:?}").to_lowercase()).green()
    );
    println!();

    let pb = spinner();
    let result = build_graph_with_progress(
        store.as_store(),
        &config,
        &PlainTextNormalizer::new(),
        options,
        &mut |code, law_type| pb.set_message(format!("Processing {code} {law_type}...")),
    );
    pb.finish_and_clear();
    let report = result?;

    print_build_report(&report);
    store.persist()?;
    Ok(report.is_success())
}

fn print_build_report(report: &BuildReport) {
    for doc in &report.documents {
        let name = format!("{} {}", doc.law_code, doc.law_type);
        match &doc.status {
            DocumentStatus::Ingested(ingest) => println!(
                "  {} {name}: {} articles, {} clauses, {} items, {} subitems",
                style("✓").green(),
                ingest.counts.articles,
                ingest.counts.clauses,
                ingest.counts.items,
                ingest.counts.subitems
            ),
            DocumentStatus::Skipped { reason } => {
                println!("  {} {name}: {}", style("-").dim(), style(reason).dim());
            }
            DocumentStatus::Failed { error } => {
                println!("  {} {name}: {}", style("✗").red(), style(error).red());
            }
        }
    }
    println!();
    print!("{report}");
    println!(
        "{} {:.1}s",
        style("Finished in").bold(),
        report.elapsed().num_milliseconds() as f64 / 1000.0
    );
}

fn print_link_report(report: &LinkReport) {
    println!("  Articles: {}", report.articles);
    for (name, kind) in [
        ("REFERS_TO", &report.refers_to),
        ("DELEGATES_TO", &report.delegates_to),
        ("CROSS_REFERS_TO", &report.cross_refers_to),
    ] {
        println!("  {name:<16} {} of {} resolved", kind.linked, kind.resolved);
        if kind.failed_batches > 0 {
            println!(
                "  {} {} failed batches",
                style("!").yellow().bold(),
                kind.failed_batches
            );
        }
    }
}

/// Execute the parse command.
fn parse_command(
    file: &Path,
    law_code: &str,
    law_type: LawType,
    output: Option<&Path>,
    parser_config: ParserConfig,
    skip_toc: bool,
) -> Result<()> {
    validate_law_code(law_code)?;

    let text = PlainTextNormalizer::new()
        .with_skip_toc(skip_toc)
        .normalize(file)?;
    let document = LawParser::new(parser_config).parse(&text, law_code, law_type);

    print_document_summary(&document);

    if let Some(path) = output {
        save_yaml(&document, path)?;
        println!();
        println!("{} {}", style("Saved to:").green().bold(), path.display());
    }
    Ok(())
}

fn print_document_summary(document: &Document) {
    let counts = document.counts();
    println!(
        "{} {} {}",
        style("Parsed").bold(),
        style(&document.law_code).cyan(),
        style(document.law_type).green()
    );
    println!("  Articles: {}", counts.articles);
    println!("  Clauses: {}", counts.clauses);
    println!("  Items: {}", counts.items);
    println!("  Subitems: {}", counts.subitems);

    let options = Options::new(PREVIEW_WIDTH)
        .initial_indent("    ")
        .subsequent_indent("    ");
    for article in document.articles.iter().take(PREVIEW_ARTICLES) {
        println!();
        println!(
            "  {} {} ({} clauses)",
            style(&article.article_id).bold(),
            article.title,
            article.clauses.len()
        );
        let mut preview: String = article.full_text.chars().take(PREVIEW_CHARS).collect();
        if article.text_len() > PREVIEW_CHARS {
            preview.push('…');
        }
        println!("{}", fill(&preview.replace('\n', " "), &options));
    }
    if document.articles.len() > PREVIEW_ARTICLES {
        println!();
        println!(
            "  {}",
            style(format!(
                "... and {} more articles",
                document.articles.len() - PREVIEW_ARTICLES
            ))
            .dim()
        );
    }
}

/// Execute the link command.
fn link_command(
    config_path: Option<&Path>,
    kind: StoreKind,
    snapshot: Option<PathBuf>,
    batch_size: usize,
) -> Result<bool> {
    let config = load_config(config_path)?;
    let resolver = ReferenceResolver::new(&config.cross_references)?;
    let store = OpenStore::open(kind, snapshot)?;

    let pb = spinner();
    pb.set_message("Resolving citations...");
    let result = link_references(store.as_store(), &resolver, batch_size);
    pb.finish_and_clear();
    let report = result?;

    println!("{}", style("Citations").bold());
    print_link_report(&report);
    store.persist()?;
    Ok(report.failed_batches() == 0)
}

/// Execute the stats command.
fn stats_command(kind: StoreKind, snapshot: Option<PathBuf>) -> Result<()> {
    let store = OpenStore::open(kind, snapshot)?;
    let stats = store.as_store().stats()?;
    print!("{stats}");
    Ok(())
}

/// Execute the laws command.
fn laws_command(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}", style("Statutes").bold());
    for law in config.registry.iter() {
        let labels: Vec<String> = LawType::ALL.iter().map(|t| law.label(*t)).collect();
        println!(
            "  {:<18} {}  [{}]",
            style(&law.code).cyan(),
            law.name,
            labels.join(", ")
        );
        for rule in config.cross_references.rules_for(&law.code) {
            println!(
                "  {:<18}   cites {} -> {}",
                "",
                rule.statute,
                style(&rule.target).green()
            );
        }
    }
    Ok(())
}
