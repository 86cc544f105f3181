//! Criteria file extraction
//!
//! Uploads may be plain text, JSON, or a Word document. Whatever the
//! container, the result is a single string that is later handed to
//! [`crate::criteria::parse`].

use crate::domain::{GraderError, GraderResult};
use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Entry inside a .docx container that holds the body text
const DOCX_BODY_PART: &str = "word/document.xml";

/// Accepted criteria upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaFileType {
    Text,
    Json,
    Docx,
}

impl CriteriaFileType {
    /// Classify a file by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> GraderResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("json") => Ok(Self::Json),
            Some("docx") => Ok(Self::Docx),
            _ => Err(GraderError::UnsupportedCriteriaFileType {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Docx => "docx",
        }
    }
}

/// Read an uploaded criteria file and return its text content
pub fn extract_criteria_text<P: AsRef<Path>>(path: P) -> GraderResult<String> {
    let path = path.as_ref();
    let file_type = CriteriaFileType::from_path(path)?;

    tracing::debug!("Extracting {} criteria from {}", file_type.as_str(), path.display());

    match file_type {
        CriteriaFileType::Text | CriteriaFileType::Json => {
            let bytes = fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        CriteriaFileType::Docx => {
            let file = File::open(path)?;
            let mut archive = zip::ZipArchive::new(file).map_err(|e| {
                GraderError::criteria_format(format!("not a readable .docx document: {e}"))
            })?;
            let mut body = archive.by_name(DOCX_BODY_PART).map_err(|e| {
                GraderError::criteria_format(format!("document has no body part: {e}"))
            })?;

            let mut xml = String::new();
            body.read_to_string(&mut xml)?;
            docx_paragraph_text(&xml)
        }
    }
}

/// Join the paragraphs of a WordprocessingML body with newlines
pub fn docx_paragraph_text(document_xml: &str) -> GraderResult<String> {
    let token = Regex::new(
        r"<w:p(?:\s[^>]*?)?(/)?>|</w:p>|<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:br/>",
    )
    .map_err(|e| GraderError::criteria_format(format!("document scanner failed: {e}")))?;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for caps in token.captures_iter(document_xml) {
        let whole = &caps[0];

        if let Some(text) = caps.get(2) {
            current.get_or_insert_with(String::new).push_str(&unescape_xml(text.as_str()));
        } else if whole == "</w:p>" {
            paragraphs.push(current.take().unwrap_or_default());
        } else if whole == "<w:tab/>" {
            current.get_or_insert_with(String::new).push('\t');
        } else if whole == "<w:br/>" {
            current.get_or_insert_with(String::new).push('\n');
        } else if caps.get(1).is_some() {
            // <w:p/> is an empty paragraph
            paragraphs.push(String::new());
        } else {
            current = Some(String::new());
        }
    }

    if let Some(trailing) = current {
        paragraphs.push(trailing);
    }

    Ok(paragraphs.join("\n"))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
