//! minirag server binary
//!
//! Run with: cargo run -p minirag --bin minirag-server -- --docs ./docs

use clap::Parser;
use minirag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minirag-server")]
#[command(about = "Answer questions about a local document directory")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with the documents to index
    #[arg(long)]
    docs: Option<PathBuf>,

    /// Directory for the index state (default: ~/.minirag)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Ollama base URL
    #[arg(long = "ollama-url")]
    ollama_url: Option<String>,

    /// Chat model
    #[arg(long = "ollama-model")]
    ollama_model: Option<String>,

    /// Embedding model
    #[arg(long = "ollama-embed-model")]
    ollama_embed_model: Option<String>,

    /// Listen address, `host:port` or `:port`
    #[arg(long)]
    http: Option<String>,

    /// Drop the existing index and rebuild it
    #[arg(long = "force-reindex")]
    force_reindex: bool,
}

impl Cli {
    /// Flags override the file, which overrides the defaults
    fn into_config(self) -> anyhow::Result<RagConfig> {
        let mut config = RagConfig::load(self.config.as_deref())?;

        if let Some(docs) = self.docs {
            config.indexing.docs_dir = docs;
        }
        if let Some(data) = self.data {
            config.indexing.data_dir = data;
        }
        if let Some(url) = self.ollama_url {
            config.llm.base_url = url;
        }
        if let Some(model) = self.ollama_model {
            config.llm.chat_model = model;
        }
        if let Some(model) = self.ollama_embed_model {
            config.llm.embed_model = model;
        }
        if let Some(addr) = self.http {
            config.server.set_listen_addr(&addr)?;
        }
        if self.force_reindex {
            config.indexing.force_reindex = true;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minirag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.into_config()?;
    config.validate()?;
    config.ensure_directories()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.indexing.docs_dir.display());
    tracing::info!("  - Data: {}", config.indexing.data_dir.display());
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Chunk size: {}", config.indexing.chunk_size);

    let server = RagServer::bootstrap(config).await?;

    tracing::info!("Listening on http://{}", server.address());
    server.start().await?;

    Ok(())
}
