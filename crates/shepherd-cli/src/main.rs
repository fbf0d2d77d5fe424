//! Shepherd CLI - ask questions against the cybersecurity news base.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use shepherd_chat::{ChatEvent, ChatPipeline};
use shepherd_core::{ChatRequest, SearchFilters, SearchRequest, ShepherdConfig};
use shepherd_llm::OpenAiClient;
use shepherd_store::RestStore;

/// Shepherd - grounded Q&A over cybersecurity and tech news
#[derive(Parser)]
#[command(name = "shepherd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: ~/.shepherd/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the grounded answer
    Ask {
        /// The question
        query: String,

        /// Filter by category (repeatable)
        #[arg(long)]
        category: Vec<String>,

        /// Filter by technology (repeatable)
        #[arg(long)]
        technology: Vec<String>,

        /// Filter by priority level (repeatable)
        #[arg(long)]
        priority: Vec<String>,
    },

    /// Search articles without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "10")]
        limit: u32,

        /// Similarity threshold
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Filter by category (repeatable)
        #[arg(long)]
        category: Vec<String>,

        /// Filter by technology (repeatable)
        #[arg(long)]
        technology: Vec<String>,

        /// Filter by tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,

        /// Only articles analyzed on or after this ISO 8601 date
        #[arg(long)]
        from_date: Option<String>,

        /// Only articles analyzed on or before this ISO 8601 date
        #[arg(long)]
        to_date: Option<String>,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn filters(categories: Vec<String>, technologies: Vec<String>, priority: Vec<String>) -> SearchFilters {
    SearchFilters {
        categories: some_if_any(categories),
        technologies: some_if_any(technologies),
        priority: some_if_any(priority),
        ..SearchFilters::default()
    }
}

fn some_if_any(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

type Pipeline = ChatPipeline<RestStore, OpenAiClient, OpenAiClient>;

fn build_pipeline(config: ShepherdConfig) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let store = Arc::new(RestStore::from_config(&config.store)?);
    let llm = Arc::new(OpenAiClient::from_config(&config.llm)?);
    Ok(ChatPipeline::new(store, Arc::clone(&llm), llm, config.search))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match cli.config {
        Some(path) => ShepherdConfig::load(&path)?,
        None => ShepherdConfig::load_default()?,
    };
    let pipeline = build_pipeline(config)?;

    match cli.command {
        Commands::Ask {
            query,
            category,
            technology,
            priority,
        } => {
            ask(&pipeline, &query, filters(category, technology, priority)).await?;
        }
        Commands::Search {
            query,
            limit,
            threshold,
            category,
            technology,
            tag,
            from_date,
            to_date,
        } => {
            let filters = SearchFilters {
                categories: some_if_any(category),
                technologies: some_if_any(technology),
                tags: some_if_any(tag),
                from_date,
                to_date,
                ..SearchFilters::default()
            };
            search(&pipeline, &query, limit, threshold, filters).await?;
        }
    }

    Ok(())
}

async fn ask(
    pipeline: &Pipeline,
    query: &str,
    filters: SearchFilters,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ChatRequest {
        query: query.to_string(),
        filters,
        history: vec![],
    };

    let mut events = match pipeline.chat(request).await {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut sources = Vec::new();
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event {
            ChatEvent::Metadata { articles } => {
                sources = articles;
            }
            ChatEvent::Content { content } => {
                print!("{}", content);
                stdout.flush()?;
            }
            ChatEvent::Error { error } => {
                eprintln!("\nError: {}", error);
                std::process::exit(1);
            }
            ChatEvent::Done => break,
        }
    }
    println!();

    if !sources.is_empty() {
        println!("\nSources:");
        for source in &sources {
            println!("  - {} ({})", source.title, source.url);
        }
    }

    Ok(())
}

async fn search(
    pipeline: &Pipeline,
    query: &str,
    limit: u32,
    threshold: Option<f32>,
    filters: SearchFilters,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = SearchRequest {
        query: query.to_string(),
        filters,
        match_threshold: threshold,
        match_count: Some(limit),
    };

    let response = match pipeline.search(request).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if response.results.is_empty() {
        println!("No matching articles found.");
        return Ok(());
    }

    println!("Found {} article(s):\n", response.result_count);
    for (i, article) in response.results.iter().enumerate() {
        println!("{}. {}", i + 1, article.title);
        if let Some(similarity) = article.similarity {
            println!("   similarity: {:.3}", similarity);
        }
        println!("   {}", article.short_summary);
        println!("   {}", article.url);
        println!();
    }

    Ok(())
}
