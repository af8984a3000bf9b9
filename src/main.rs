use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::info;

use certvec_cli::{
    QaSession, display_banner, init_tracing, is_exit_keyword, print_answer, print_help,
    read_prompt,
};
use certvec_core::config::{DEFAULT_ENV_FILE, load_env_file};
use certvec_core::{ChatProvider, DatasetProfile, EmbeddingProvider, Record, RetryingEmbedder, SearchService};
use certvec_cosmos::{CosmosClient, CosmosConfig};
use certvec_dataset::{
    AzureService, CertificationCatalog, EmbeddingPipeline, assign_ids, enrich, ensure_ids, flatten,
    load_records, read_json, write_json, write_json_pretty,
};
use certvec_openai::{OpenAiClient, OpenAiConfig};
use certvec_search::{SearchClient, provision};

#[derive(Parser)]
#[command(name = "certvec")]
#[command(about = "Build a vector search index over Azure certification data and ask questions about it", long_about = None)]
struct Cli {
    /// Environment file holding endpoints and keys
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProfileArg {
    /// Dataset profile: certifications or services
    #[arg(short, long, default_value = "certifications")]
    profile: DatasetProfile,
}

#[derive(Subcommand)]
enum Commands {
    /// Join service descriptions into the certifications catalog
    Enrich {
        #[arg(long)]
        certifications: PathBuf,
        #[arg(long)]
        services: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Turn the certifications catalog into one record per service
    Flatten {
        #[arg(long)]
        certifications: PathBuf,
        #[arg(long)]
        services: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Give every record a fresh id, rewriting the file unless --output is set
    AssignIds {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Attach embeddings to every record
    Embed {
        #[command(flatten)]
        profile: ProfileArg,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Load records into Cosmos DB
    Load {
        #[command(flatten)]
        profile: ProfileArg,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Create the search index, data source and indexer
    Provision {
        #[command(flatten)]
        profile: ProfileArg,
        /// Leave the indexer idle after creating it
        #[arg(long)]
        no_run: bool,
    },
    /// Ask questions answered from the search index
    Ask {
        #[command(flatten)]
        profile: ProfileArg,
        /// Ask once and exit instead of starting the question loop
        #[arg(short, long)]
        question: Option<String>,
        /// Documents retrieved per question
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
    },
    /// Embed, save, load, provision, then start the question loop
    Run {
        #[command(flatten)]
        profile: ProfileArg,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Stop after provisioning
        #[arg(long)]
        skip_ask: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    load_env_file(&cli.env_file);

    match cli.command {
        Commands::Enrich {
            certifications,
            services,
            output,
        } => run_enrich(&certifications, &services, &output).await,
        Commands::Flatten {
            certifications,
            services,
            output,
        } => run_flatten(&certifications, &services, &output).await,
        Commands::AssignIds { input, output } => run_assign_ids(&input, output.as_deref()).await,
        Commands::Embed {
            profile,
            input,
            output,
        } => {
            let embedder = RetryingEmbedder::new(OpenAiClient::from_env()?);
            let mut records: Vec<Record> = read_json(&input).await?;
            run_embed(&embedder, profile.profile, &mut records, &output).await
        }
        Commands::Load { profile, input } => {
            let records: Vec<Record> = read_json(&input).await?;
            run_load(&CosmosClient::from_env()?, profile.profile, &records).await
        }
        Commands::Provision { profile, no_run } => {
            let cosmos = CosmosConfig::from_env()?;
            run_provision(profile.profile, &cosmos.connection_string, !no_run).await
        }
        Commands::Ask {
            profile,
            question,
            top_k,
        } => {
            let (embedder, chat) = openai_clients()?;
            let session = QaSession::new(embedder, SearchClient::from_env()?, chat, profile.profile)
                .with_top_k(top_k);
            match question {
                Some(question) => {
                    let answer = session.ask(&question).await?;
                    print_answer(&answer);
                    Ok(())
                }
                None => question_loop(&session).await,
            }
        }
        Commands::Run {
            profile,
            input,
            output,
            skip_ask,
        } => {
            let profile = profile.profile;
            let (embedder, chat) = openai_clients()?;
            let store = CosmosClient::from_env()?;
            let search = SearchClient::from_env()?;

            // Ids and service settings are checked before any embedding call
            let mut records: Vec<Record> = read_json(&input).await?;
            ensure_ids(&records)
                .with_context(|| format!("checking records in {}", input.display()))?;

            run_embed(&embedder, profile, &mut records, &output).await?;
            run_load(&store, profile, &records).await?;
            run_provision(profile, &store.config().connection_string, true).await?;
            if skip_ask {
                return Ok(());
            }
            let session = QaSession::new(embedder, search, chat, profile);
            question_loop(&session).await
        }
    }
}

/// Retrying embedder and chat client sharing one Azure OpenAI configuration
fn openai_clients() -> Result<(RetryingEmbedder<OpenAiClient>, OpenAiClient)> {
    let config = OpenAiConfig::from_env()?;
    let embedder = RetryingEmbedder::new(OpenAiClient::new(config.clone())?);
    let chat = OpenAiClient::new(config)?;
    Ok((embedder, chat))
}

async fn read_catalogs(
    certifications: &Path,
    services: &Path,
) -> Result<(CertificationCatalog, Vec<AzureService>)> {
    let catalog: CertificationCatalog = read_json(certifications).await?;
    let services: Vec<AzureService> = read_json(services).await?;
    info!(
        certifications = catalog.certifications.len(),
        services = services.len(),
        "catalogs read"
    );
    Ok((catalog, services))
}

async fn run_enrich(certifications: &Path, services: &Path, output: &Path) -> Result<()> {
    let (mut catalog, services) = read_catalogs(certifications, services).await?;
    let report = enrich(&mut catalog, &services);
    write_json_pretty(output, &catalog).await?;

    println!(
        "{} {} service references matched, written to {}",
        "✅".green(),
        report.matched,
        output.display()
    );
    if !report.unmatched.is_empty() {
        println!(
            "{} No description for: {}",
            "⚠️".yellow(),
            report.unmatched.join(", ")
        );
    }
    Ok(())
}

async fn run_flatten(certifications: &Path, services: &Path, output: &Path) -> Result<()> {
    let (catalog, services) = read_catalogs(certifications, services).await?;
    let records = flatten(&catalog, &services);
    write_json_pretty(output, &records).await?;
    println!(
        "{} {} records written to {}",
        "✅".green(),
        records.len(),
        output.display()
    );
    Ok(())
}

async fn run_assign_ids(input: &Path, output: Option<&Path>) -> Result<()> {
    let mut records: Vec<Record> = read_json(input).await?;
    assign_ids(&mut records);
    let output = output.unwrap_or(input);
    write_json_pretty(output, &records).await?;
    println!(
        "{} Assigned ids to {} records in {}",
        "✅".green(),
        records.len(),
        output.display()
    );
    Ok(())
}

async fn run_embed<E: EmbeddingProvider>(
    embedder: &E,
    profile: DatasetProfile,
    records: &mut [Record],
    output: &Path,
) -> Result<()> {
    println!(
        "{} Embedding {} records for the {} profile...",
        "🤖".blue(),
        records.len(),
        profile
    );

    let report = EmbeddingPipeline::new(embedder, profile.embedding_targets())
        .run(records)
        .await
        .context("embedding records")?;
    write_json(output, &records).await?;

    println!(
        "{} {} embeddings for {} records written to {}",
        "✅".green(),
        report.embeddings,
        report.records,
        output.display()
    );
    Ok(())
}

async fn run_load(store: &CosmosClient, profile: DatasetProfile, records: &[Record]) -> Result<()> {
    let target = profile.store_target();
    println!(
        "{} Loading {} records into {}/{}...",
        "🚀".yellow(),
        records.len(),
        target.database,
        target.container
    );

    let report = load_records(store, &target, records).await?;
    println!(
        "{} {} created, {} already present",
        "✅".green(),
        report.created,
        report.existing
    );
    Ok(())
}

async fn run_provision(profile: DatasetProfile, cosmos_connection_string: &str, run: bool) -> Result<()> {
    let search = SearchClient::from_env()?;

    let report = provision(&search, profile, cosmos_connection_string, run).await?;
    println!("{} Index {} ready", "✅".green(), report.index.bold());
    println!(
        "{} Indexer {} reads {}{}",
        "✅".green(),
        report.indexer.bold(),
        report.data_source,
        if report.ran { " (run requested)" } else { "" }
    );
    Ok(())
}

async fn question_loop<E, S, C>(session: &QaSession<E, S, C>) -> Result<()>
where
    E: EmbeddingProvider,
    S: SearchService,
    C: ChatProvider,
{
    display_banner(session.profile());

    let mut history = Vec::new();
    while let Some(input) = read_prompt(&mut history)? {
        if input.is_empty() {
            continue;
        }
        if is_exit_keyword(&input) {
            break;
        }
        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        println!("{} Searching...", "🔎".blue());
        match session.ask(&input).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => println!("{} {}", "❌".red(), e),
        }
    }

    println!("{}", "👋 Goodbye!".green());
    Ok(())
}
