#[cfg(test)]
mod tests;

use console::style;

use super::Config;

#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    for (label, value) in ollama_lines(config) {
        eprintln!("  {}: {}", label, style(value).cyan());
    }

    eprintln!();
    eprintln!("{}", style("RAG Settings:").bold().yellow());
    for (label, value) in rag_lines(config) {
        eprintln!("  {}: {}", label, style(value).cyan());
    }

    let config_path = config.config_file_path();
    eprintln!();
    if config_path.exists() {
        eprintln!("Config file: {}", style(config_path.display()).dim());
    } else {
        eprintln!(
            "Config file: {} {}",
            style(config_path.display()).dim(),
            style("(not found, using defaults)").yellow()
        );
    }
}

fn ollama_lines(config: &Config) -> Vec<(&'static str, String)> {
    let url = config
        .ollama_url()
        .map_or_else(|e| format!("invalid ({})", e), |url| url.to_string());

    vec![
        ("Ollama URL", url),
        ("Model", config.ollama.model.clone()),
        ("Embedding Model", config.ollama.embedding_model.clone()),
        ("Temperature", config.ollama.temperature.to_string()),
        ("Batch Size", config.ollama.batch_size.to_string()),
        ("Timeout", format!("{}s", config.ollama.timeout_seconds)),
        ("Retry Attempts", config.ollama.retry_attempts.to_string()),
    ]
}

fn rag_lines(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("Rules Directory", config.rag.rules_dir.display().to_string()),
        (
            "Index Directory",
            config.rag.persist_dir.display().to_string(),
        ),
        ("Chunk Size", config.rag.chunk_size.to_string()),
        ("Chunk Overlap", config.rag.chunk_overlap.to_string()),
        ("Top K", config.rag.top_k.to_string()),
    ]
}
