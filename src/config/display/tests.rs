use super::*;

#[test]
fn ollama_lines_include_url_and_models() {
    let config = Config::default();
    let lines = ollama_lines(&config);

    assert!(lines.contains(&("Ollama URL", "http://localhost:11434/".to_string())));
    assert!(lines.contains(&("Model", "mistral".to_string())));
    assert!(lines.contains(&("Embedding Model", "mistral".to_string())));
}

#[test]
fn invalid_url_is_reported_inline() {
    let mut config = Config::default();
    config.ollama.host = "bad host".to_string();

    let lines = ollama_lines(&config);
    let (_, url) = lines
        .iter()
        .find(|(label, _)| *label == "Ollama URL")
        .expect("url line present");
    assert!(url.starts_with("invalid"));
}

#[test]
fn rag_lines_reflect_paths() {
    let config = Config::default();
    let lines = rag_lines(&config);

    assert!(lines.contains(&("Rules Directory", "rules".to_string())));
    assert!(lines.contains(&("Index Directory", "vector_db".to_string())));
    assert!(lines.contains(&("Top K", "3".to_string())));
}
