use crate::error::IngestError;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

// Decompressed size cap for word/document.xml, zip-bomb protection.
const MAX_DOCX_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Reads the file and dispatches on its extension. Supported formats:
/// `pdf`, `docx`, `txt`.
pub fn extract_file(path: &Path) -> Result<String, IngestError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    let bytes = std::fs::read(path)?;
    extract_bytes(file_name, &bytes)
}

/// Extracts a linear text stream from raw document bytes. Page and paragraph
/// boundaries are not preserved past this point; downstream chunking sees a
/// single string.
pub fn extract_bytes(file_name: &str, bytes: &[u8]) -> Result<String, IngestError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => extract_pdf(file_name, bytes),
        "docx" => extract_docx(bytes),
        "txt" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

fn extract_pdf(file_name: &str, bytes: &[u8]) -> Result<String, IngestError> {
    let document =
        Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut text = String::new();
    for (page_no, _page_id) in document.get_pages() {
        let page_text = document
            .extract_text(&[page_no])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;
        text.push_str(&page_text);
    }

    if text.trim().is_empty() {
        tracing::warn!(file_name, "pdf had no readable page text");
    }

    Ok(text)
}

fn extract_docx(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|error| IngestError::DocxParse(error.to_string()))?;

    let mut document_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|error| IngestError::DocxParse(error.to_string()))?;
        entry
            .take(MAX_DOCX_XML_BYTES)
            .read_to_end(&mut document_xml)
            .map_err(|error| IngestError::DocxParse(error.to_string()))?;
        if document_xml.len() as u64 >= MAX_DOCX_XML_BYTES {
            return Err(IngestError::DocxParse(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
    }

    paragraph_text(&document_xml)
}

// Collects `w:t` runs, one line per `w:p` paragraph, in document order.
fn paragraph_text(xml: &[u8]) -> Result<String, IngestError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                in_run = element.local_name().as_ref() == b"t";
            }
            Ok(Event::Text(run)) if in_run => {
                let unescaped = run
                    .unescape()
                    .map_err(|error| IngestError::DocxParse(error.to_string()))?;
                text.push_str(unescaped.as_ref());
            }
            Ok(Event::End(element)) => {
                if element.local_name().as_ref() == b"t" {
                    in_run = false;
                } else if element.local_name().as_ref() == b"p" && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => return Err(IngestError::DocxParse(error.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
