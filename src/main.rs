use anyhow::Context;
use clap::{Parser, Subcommand};
use rules_rag::commands::{run_ask, run_demo, run_index, run_query, show_status};
use rules_rag::config::{Config, get_config_dir, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rules-rag")]
#[command(about = "Check code against a folder of plain-text rules with a local Ollama model")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml (defaults to ~/.rules-rag)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Override the Ollama host
    #[arg(long, global = true)]
    host: Option<String>,
    /// Override the Ollama port
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Override the generation model
    #[arg(long, global = true)]
    model: Option<String>,
    /// Override the embedding model
    #[arg(long, global = true)]
    embedding_model: Option<String>,
    /// Override the directory the rules are read from
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,
    /// Override the directory the index is stored in
    #[arg(long, global = true)]
    persist_dir: Option<PathBuf>,
    /// Without a subcommand, index the rules if needed and analyse two sample snippets
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the generation model a question directly, without rules
    Ask {
        /// Question to send
        question: Option<String>,
    },
    /// Build the rules index
    Index {
        /// Rebuild even if an index already exists
        #[arg(long)]
        force: bool,
    },
    /// Analyse a code snippet against the indexed rules
    Query {
        /// Code to analyse
        code: String,
    },
    /// Show Ollama and index status
    Status,
    /// Show the effective configuration
    Config,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => get_config_dir().context("Failed to determine config directory")?,
        };
        let mut config = Config::load(config_dir)?;

        if let Some(host) = &self.host {
            config.ollama.set_host(host.clone())?;
        }
        if let Some(port) = self.port {
            config.ollama.set_port(port)?;
        }
        if let Some(model) = &self.model {
            config.ollama.set_model(model.clone())?;
        }
        if let Some(model) = &self.embedding_model {
            config.ollama.set_embedding_model(model.clone())?;
        }
        if let Some(dir) = &self.rules_dir {
            config.rag.rules_dir.clone_from(dir);
        }
        if let Some(dir) = &self.persist_dir {
            config.rag.persist_dir.clone_from(dir);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        None => run_demo(&config).await?,
        Some(Commands::Ask { question }) => run_ask(&config, question.as_deref())?,
        Some(Commands::Index { force }) => run_index(&config, force).await?,
        Some(Commands::Query { code }) => run_query(&config, &code).await?,
        Some(Commands::Status) => show_status(&config).await?,
        Some(Commands::Config) => show_config(&config),
    }

    Ok(())
}
