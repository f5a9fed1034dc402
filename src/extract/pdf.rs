//! PDF text extraction via poppler's `pdftotext`.

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

use super::ExtractionError;

pub const PDFTOTEXT: &str = "pdftotext";

/// pdftotext terminates every page with a form feed.
const PAGE_BREAK: char = '\x0c';

/// Text and page count extracted from a PDF.
#[derive(Debug)]
pub struct PdfText {
    pub text: String,
    pub pages: u32,
}

/// Whether `pdftotext` is on the PATH.
pub fn pdftotext_available() -> bool {
    which::which(PDFTOTEXT).is_ok()
}

/// Extract text from PDF bytes. Blocking; run off the async runtime.
pub fn extract_pdf(content: &[u8]) -> Result<PdfText, ExtractionError> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content)?;
    file.flush()?;

    let output = Command::new(PDFTOTEXT)
        .args(["-layout", "-enc", "UTF-8"])
        .arg(file.path())
        .arg("-")
        .output();

    let stdout = match output {
        Ok(output) if output.status.success() => output.stdout,
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Corrupt(format!(
                "pdftotext failed: {}",
                stderr.trim()
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractionError::ToolNotFound(
                "pdftotext (install poppler-utils)".to_string(),
            ))
        }
        Err(e) => return Err(ExtractionError::Io(e)),
    };

    Ok(split_pages(&String::from_utf8_lossy(&stdout)))
}

fn split_pages(raw: &str) -> PdfText {
    let pages = raw.matches(PAGE_BREAK).count().max(1) as u32;
    let text = raw
        .split(PAGE_BREAK)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    PdfText { text, pages }
}
