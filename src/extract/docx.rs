//! DOCX text extraction.
//!
//! A .docx file is a zip archive; the body text lives in
//! `word/document.xml`. Paragraphs become lines and markup is stripped.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_XML: &str = "word/document.xml";

static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("valid regex"));
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Extract plain text from DOCX bytes.
pub fn extract_docx(content: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(content))
        .map_err(|e| ExtractionError::Corrupt(format!("not a valid docx archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| ExtractionError::Corrupt(format!("missing {}: {}", DOCUMENT_XML, e)))?
        .read_to_string(&mut xml)?;

    Ok(xml_to_text(&xml))
}

fn xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    let text = unescape(&text);

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file(DOCUMENT_XML, options).unwrap();
            write!(
                zip,
                r#"<?xml version="1.0"?><w:document><w:body>{}</w:body></w:document>"#,
                body
            )
            .unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let content = docx_with_body(
            "<w:p><w:r><w:t>LEASE AGREEMENT</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Tenant &amp; Landlord</w:t><w:tab/><w:t>2024</w:t></w:r></w:p>",
        );
        let text = extract_docx(&content).unwrap();
        assert_eq!(text, "LEASE AGREEMENT\nTenant & Landlord\t2024");
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_docx(b"plain text").unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt(_)));
    }

    #[test]
    fn test_missing_document_xml() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.finish().unwrap();
        }
        let err = extract_docx(&buf.into_inner()).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt(_)));
    }
}
