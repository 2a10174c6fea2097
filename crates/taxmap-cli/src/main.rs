//! taxmap CLI - Command-line interface
//!
//! Usage:
//!   taxmap extract <input.json> -o <out.tsv>
//!   taxmap summary <input.json> -o <out.tsv>
//!   taxmap context <term>
//!   taxmap metadata <doc-id>...

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taxmap_client::{BiofidClient, WikidataClient};
use taxmap_core::{AppConfig, LoggingConfig, SearchResponse};
use taxmap_export::{
    join_with_points, markers, render_records, summarize_documents, write_records_to_path,
    write_tables, CoordinateJoin,
};
use taxmap_extractor::RelationPipeline;

#[derive(Parser)]
#[command(name = "taxmap")]
#[command(about = "Map taxon-location co-occurrences found in the BIOfid corpus")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract taxon-location relations from a saved search response
    Extract {
        /// Search response JSON
        input: PathBuf,
        /// Output table
        #[arg(short, long)]
        output: PathBuf,
        /// Pairing strategy (defaults to the configured one)
        #[arg(long)]
        strategy: Option<String>,
        /// Skip the Wikidata coordinate lookup
        #[arg(long)]
        no_coordinates: bool,
        /// Also write map markers for located relations
        #[arg(long)]
        markers: Option<PathBuf>,
    },
    /// Count taxon annotations per document
    Summary {
        /// Search response JSON
        input: PathBuf,
        /// Output table
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print terms co-occurring with a term
    Context {
        term: String,
    },
    /// Print metadata of documents
    Metadata {
        #[arg(required = true)]
        doc_ids: Vec<String>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?
            .with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_response(path: &Path) -> anyhow::Result<SearchResponse> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    SearchResponse::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

async fn extract(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    strategy: Option<&str>,
    no_coordinates: bool,
    marker_path: Option<&Path>,
) -> anyhow::Result<()> {
    let response = read_response(input)?;
    let strategy = strategy.unwrap_or(config.extraction.strategy.as_str());

    let relations = RelationPipeline::default().extract(&response, strategy)?;

    let records = if no_coordinates {
        join_with_points(&relations, &[])
    } else {
        let wikidata = WikidataClient::from_config(&config.wikidata)?;
        CoordinateJoin::new(&wikidata).join(&relations).await?
    };

    // Render everything first; files are replaced together or not at all
    let delimiter = config.export.delimiter;
    let mut tables = vec![(output, render_records(&records, delimiter)?)];
    if let Some(path) = marker_path {
        tables.push((path, render_records(&markers(&records), delimiter)?));
    }

    write_tables(&tables).with_context(|| format!("writing {}", output.display()))?;

    info!(records = records.len(), output = %output.display(), "Extraction complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            input,
            output,
            strategy,
            no_coordinates,
            markers: marker_path,
        } => {
            extract(
                &config,
                &input,
                &output,
                strategy.as_deref(),
                no_coordinates,
                marker_path.as_deref(),
            )
            .await?;
        }
        Commands::Summary { input, output } => {
            let response = read_response(&input)?;
            let summaries = summarize_documents(&response);
            write_records_to_path(&output, &summaries, config.export.delimiter)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::Context { term } => {
            let client = BiofidClient::from_config(&config.biofid)?;
            let context = client.get_term_context(&term).await?;
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
        Commands::Metadata { doc_ids } => {
            let client = BiofidClient::from_config(&config.biofid)?;
            let metadata = client.get_document_metadata(doc_ids.as_slice()).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}
