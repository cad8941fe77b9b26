//! File-based schema documents
//!
//! Reads TOML or JSON files. Directories are walked non-recursively and their
//! entries applied in file name order so builds are reproducible.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::ConfigError;
use crate::merger::SchemaDocument;
use crate::sources::DocumentSource;

/// Supported document formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse document content into a JSON value
    pub fn parse(self, content: &str) -> Result<Value, ConfigError> {
        match self {
            Self::Toml => {
                toml::from_str::<Value>(content).map_err(|e| ConfigError::parse(e.to_string()))
            }
            Self::Json => serde_json::from_str(content).map_err(|e| ConfigError::parse(e.to_string())),
        }
    }
}

/// File-based document source
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
}

impl FileSource {
    /// Create a source over files and directories, applied in the given order
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a source for a single path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new([path])
    }

    /// Read and parse a single document file
    pub fn read_document(path: &Path) -> Result<SchemaDocument, ConfigError> {
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        let content = std::fs::read_to_string(path)?;
        let body = format
            .parse(&content)
            .map_err(|e| ConfigError::parse(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), ?format, "Read schema document");
        SchemaDocument::new(path, body)
    }

    fn expand(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for path in &self.paths {
            if path.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file())
                    .collect();
                entries.sort();
                for entry in entries {
                    if DocumentFormat::from_path(&entry).is_some() {
                        files.push(entry);
                    } else {
                        warn!(path = %entry.display(), "Skipping file with unsupported extension");
                    }
                }
            } else if path.exists() {
                files.push(path.clone());
            } else {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("schema document not found: {}", path.display()),
                )));
            }
        }
        Ok(files)
    }
}

impl DocumentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Vec<SchemaDocument>, ConfigError> {
        self.expand()?
            .iter()
            .map(|path| Self::read_document(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), Some(DocumentFormat::Toml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), None);
    }

    #[test]
    fn test_load_directory_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{"types": {"Tag": {"fields": {"name": "String"}}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("a.toml"),
            r#"
schema = "admin"

[types.Article.fields]
title = "String"
"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = FileSource::from_path(dir.path()).load().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].source.ends_with("a.toml"));
        assert_eq!(docs[0].schema_key, "admin");
        assert_eq!(docs[0].body["types"]["Article"]["fields"]["title"], "String");
        assert_eq!(docs[1].schema_key, "default");
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let err = FileSource::from_path("/definitely/not/here.toml").load().unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "types = [").unwrap();
        let err = FileSource::read_document(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
