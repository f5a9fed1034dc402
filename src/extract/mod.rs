//! Local text extraction for PDF, DOCX and plain-text documents.
//!
//! Content is sniffed with `infer` before parsing so a file whose bytes
//! contradict its declared format fails permanently instead of producing
//! garbage text.

mod docx;
mod pdf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::{Document, DocumentFormat, ExtractedText};
use crate::services::{ServiceError, TextExtractor};

pub use docx::extract_docx;
pub use pdf::{extract_pdf, pdftotext_available, PdfText};

/// Confidence reported for layout-based PDF extraction.
const PDF_CONFIDENCE: f32 = 0.8;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Content does not match declared format {declared}: detected {detected}")]
    FormatMismatch { declared: String, detected: String },

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction task failed: {0}")]
    Join(String),
}

impl From<ExtractionError> for ServiceError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFileType(_) | ExtractionError::ToolNotFound(_) => {
                ServiceError::Unsupported(err.to_string())
            }
            ExtractionError::FormatMismatch { .. } | ExtractionError::Corrupt(_) => {
                ServiceError::InvalidInput(err.to_string())
            }
            ExtractionError::Io(_) | ExtractionError::Join(_) => {
                ServiceError::Other(err.to_string())
            }
        }
    }
}

/// Extracts text in-process (DOCX, TXT) or via `pdftotext` (PDF).
#[derive(Debug, Clone, Default)]
pub struct LocalTextExtractor;

impl LocalTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text from raw bytes of a known format. Blocking for PDFs.
    pub fn extract_bytes(
        &self,
        content: &[u8],
        format: DocumentFormat,
    ) -> Result<ExtractedText, ExtractionError> {
        check_signature(content, format)?;
        match format {
            DocumentFormat::Txt => Ok(ExtractedText {
                text: String::from_utf8_lossy(content).into_owned(),
                pages: Some(1),
                confidence: Some(1.0),
            }),
            DocumentFormat::Docx => Ok(ExtractedText {
                text: extract_docx(content)?,
                pages: None,
                confidence: Some(1.0),
            }),
            DocumentFormat::Pdf => {
                let parsed = extract_pdf(content)?;
                Ok(ExtractedText {
                    text: parsed.text,
                    pages: Some(parsed.pages),
                    confidence: Some(PDF_CONFIDENCE),
                })
            }
        }
    }
}

/// Container formats whose signatures are long or binary enough to trust
/// when they show up in a file declared as plain text.
const NOT_TEXT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/zip",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/gzip",
    "image/png",
    "image/jpeg",
];

/// Reject content whose magic bytes contradict the declared format.
///
/// Plain text is only rejected when it is clearly binary. Short signatures
/// such as `BM` or `MZ` also start ordinary sentences.
fn check_signature(content: &[u8], format: DocumentFormat) -> Result<(), ExtractionError> {
    let kind = infer::get(content);

    if format == DocumentFormat::Txt {
        let detected = match kind {
            Some(kind) if NOT_TEXT_MIME_TYPES.contains(&kind.mime_type()) => kind.mime_type(),
            _ if content.contains(&0) => "binary data",
            _ => return Ok(()),
        };
        return Err(ExtractionError::FormatMismatch {
            declared: format.to_string(),
            detected: detected.to_string(),
        });
    }

    let Some(kind) = kind else {
        return Err(ExtractionError::FormatMismatch {
            declared: format.to_string(),
            detected: "unknown".to_string(),
        });
    };

    let matches = match format {
        DocumentFormat::Pdf => kind.mime_type() == format.mime_type(),
        DocumentFormat::Docx => {
            kind.mime_type() == format.mime_type() || kind.mime_type() == "application/zip"
        }
        DocumentFormat::Txt => true,
    };

    if matches {
        Ok(())
    } else {
        Err(ExtractionError::FormatMismatch {
            declared: format.to_string(),
            detected: kind.mime_type().to_string(),
        })
    }
}

#[async_trait]
impl TextExtractor for LocalTextExtractor {
    async fn extract_text(&self, document: &Document) -> Result<ExtractedText, ServiceError> {
        let format = document
            .format()
            .ok_or_else(|| ExtractionError::UnsupportedFileType(document.declared_format.clone()))?;
        debug!("Extracting {} as {}", document.id, format);

        if format != DocumentFormat::Pdf {
            return Ok(self.extract_bytes(&document.content, format)?);
        }

        let extractor = self.clone();
        let content = document.content.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract_bytes(&content, format))
            .await
            .map_err(|e| ExtractionError::Join(e.to_string()))??;
        Ok(extracted)
    }
}
