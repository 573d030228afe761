use crate::error::{RagError, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// A source text file loaded into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// The file name the text came from (used as source ID)
    pub source_id: String,
    /// The full, unmodified text of the file
    pub raw_text: String,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        SourceDocument {
            source_id: source_id.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Read a single file, failing with `RagError::Decode` if it is not UTF-8
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let source_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RagError::Decode {
                file: path.display().to_string(),
                message: "file name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let bytes = fs::read(path)?;
        let raw_text = String::from_utf8(bytes).map_err(|e| RagError::Decode {
            file: source_id.clone(),
            message: e.to_string(),
        })?;

        Ok(SourceDocument {
            source_id,
            raw_text,
        })
    }
}

/// Load every `.txt` file found directly inside `dir`, sorted by file name.
///
/// Sub-directories are not visited. Files that are not valid UTF-8 are
/// skipped with a warning; any other I/O failure is returned.
pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Vec<SourceDocument>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(RagError::Configuration(format!(
            "documents directory not found: {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_text_file(&path) {
            paths.push(path);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match SourceDocument::from_file(&path) {
            Ok(document) => {
                debug!(
                    "Loaded {} ({} chars)",
                    document.source_id,
                    document.raw_text.chars().count()
                );
                documents.push(document);
            }
            Err(err @ RagError::Decode { .. }) => warn!("Skipping source file: {}", err),
            Err(err) => return Err(err),
        }
    }

    info!("Loaded {} documents from {}", documents.len(), dir.display());
    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}
