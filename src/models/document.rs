//! Input document model.
//!
//! Documents are read-only inputs: the orchestrator never mutates them and
//! validates format and size before any stage runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default maximum document size (20 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Supported document container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }

    /// Parse a declared format. Accepts bare extensions (with or without a
    /// leading dot) and the matching MIME types.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "pdf" | "application/pdf" => Some(Self::Pdf),
            "docx"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "txt" | "text" | "text/plain" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Guess the format from a file path (extension first, then MIME guess).
    pub fn from_path(path: &Path) -> Option<Self> {
        if let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
        {
            return Some(format);
        }
        mime_guess::from_path(path)
            .first_raw()
            .and_then(Self::from_str)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Txt => "text/plain",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a document was rejected before entering the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDocument {
    #[error("document too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// A document submitted for analysis.
#[derive(Debug, Clone)]
pub struct Document {
    /// Caller-chosen identifier (file name by default).
    pub id: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
    /// Format as declared by the caller; may be unsupported.
    pub declared_format: String,
    /// On-disk size of a file that was too large to load; `content` is
    /// empty when this is set.
    unread_size: Option<u64>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<Vec<u8>>,
        declared_format: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            declared_format: declared_format.into(),
            unread_size: None,
        }
    }

    /// Read a document from disk, declaring its format from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::describe_path(path, content))
    }

    /// Like `from_path`, but files larger than `max_size` are not loaded.
    /// The returned document keeps the on-disk size so validation still
    /// rejects it as too large.
    pub fn from_path_limited(path: &Path, max_size: u64) -> std::io::Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > max_size {
            let mut document = Self::describe_path(path, Vec::new());
            document.unread_size = Some(size);
            return Ok(document);
        }
        Self::from_path(path)
    }

    fn describe_path(path: &Path, content: Vec<u8>) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let declared_format = DocumentFormat::from_path(path)
            .map(|f| f.as_str().to_string())
            .or_else(|| {
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        Self::new(id, content, declared_format)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.unread_size.unwrap_or(self.content.len() as u64)
    }

    /// Parsed declared format, if supported.
    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_str(&self.declared_format)
    }

    /// SHA-256 hex digest of the content.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }

    /// Check format and size invariants.
    pub fn validate(&self, max_size: u64) -> Result<DocumentFormat, InvalidDocument> {
        let format = self
            .format()
            .ok_or_else(|| InvalidDocument::UnsupportedFormat(self.declared_format.clone()))?;
        let size = self.size();
        if size > max_size {
            return Err(InvalidDocument::TooLarge {
                size,
                max: max_size,
            });
        }
        Ok(format)
    }
}
