//! Rules directory loading


use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{RagError, Result};

const RULE_FILE_EXTENSION: &str = "txt";

/// Full text of one rules file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: PathBuf,
    pub content: String,
}

/// Recursively load every `.txt` file under `rules_dir`, sorted by path.
///
/// Fails with [`RagError::RulesNotFound`] when the directory does not exist and
/// with [`RagError::NoRules`] when it holds no `.txt` files.
#[inline]
pub fn load_documents(rules_dir: &Path) -> Result<Vec<Document>> {
    if !rules_dir.is_dir() {
        return Err(RagError::RulesNotFound(rules_dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(rules_dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", rules_dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_rule_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(RagError::NoRules(rules_dir.to_path_buf()));
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        debug!("Loading {}", path.display());
        let content = fs::read_to_string(&path)?;
        documents.push(Document {
            source: path,
            content,
        });
    }

    info!(
        "Loaded {} rule documents from {}",
        documents.len(),
        rules_dir.display()
    );
    Ok(documents)
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RULE_FILE_EXTENSION))
}
