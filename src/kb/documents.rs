//! Knowledge-base document discovery and text extraction

use super::KnowledgeBaseError;
use ignore::WalkBuilder;
use regex::Regex;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

fn trailing_space_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\n").expect("valid whitespace regex"))
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Markdown,
    Pdf,
}

impl DocumentKind {
    /// Kind from a file extension, case-insensitive
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentKind::Text),
            "md" => Some(DocumentKind::Markdown),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// A document ready for chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub text: String,
}

/// Reads a text file, dropping bytes that are not valid UTF-8
fn read_text_lossy(path: &Path) -> Result<String, KnowledgeBaseError> {
    let bytes = fs::read(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).replace('\u{FFFD}', ""))
}

/// Removes whitespace in front of newlines and trims the result
pub fn normalize_text(text: &str) -> String {
    trailing_space_regex()
        .replace_all(text, "\n")
        .trim()
        .to_string()
}

/// Text of a PDF, or `None` when pdf-extract cannot handle it
///
/// pdf-extract panics on some font encodings it does not implement, so the
/// call runs under `catch_unwind`. It also prints some diagnostics straight
/// to stdout, which lands in front of `--format json` output when such a PDF
/// is indexed.
fn extract_pdf(path: &Path) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path))) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            warn!(file = %path.display(), error = %e, "Skipping unreadable PDF");
            None
        }
        Err(payload) => {
            warn!(
                file = %path.display(),
                error = panic_message(payload.as_ref()),
                "Skipping PDF the extractor cannot handle"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn extract(path: &Path, kind: DocumentKind) -> Result<Option<String>, KnowledgeBaseError> {
    match kind {
        DocumentKind::Text | DocumentKind::Markdown => read_text_lossy(path).map(Some),
        DocumentKind::Pdf => Ok(extract_pdf(path)),
    }
}

/// Collects every supported document below `dir`, in path order
///
/// Missing directories yield no documents.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>, KnowledgeBaseError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(PathBuf, DocumentKind)> = Vec::new();
    for result in WalkBuilder::new(dir).standard_filters(false).build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if let Some(kind) = DocumentKind::from_path(entry.path()) {
            candidates.push((entry.into_path(), kind));
        }
    }
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::new();
    for (path, kind) in candidates {
        let Some(raw) = extract(&path, kind)? else {
            continue;
        };
        let text = normalize_text(&raw);
        if text.is_empty() {
            debug!(file = %path.display(), "Skipping empty document");
            continue;
        }
        documents.push(Document { path, kind, text });
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// One-page PDF whose only font declares the given encoding name
    fn pdf_with_font_encoding(encoding: &str) -> Vec<u8> {
        let content = "BT /F1 12 Tf 20 100 Td (Rent 1200) Tj ET";
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /{} >>",
                encoding
            ),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref = pdf.len();
        pdf.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            DocumentKind::from_path(Path::new("a/B.MD")),
            Some(DocumentKind::Markdown)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.txt")),
            Some(DocumentKind::Text)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("report.pdf")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_path(Path::new("data.csv")), None);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a  \n\n\nb \t\nc  "), "a\nb\nc");
    }

    #[test]
    fn test_load_documents_recurses_sorted_and_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("facts")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("facts").join("2021.md"), "# Year 2021\n").unwrap();
        fs::write(root.join("b.txt"), "plain   \nnotes").unwrap();
        fs::write(root.join("a.txt"), "   \n  ").unwrap();
        fs::write(root.join("c.csv"), "ignored").unwrap();
        fs::write(root.join(".hidden").join("x.md"), "hidden but kept").unwrap();
        fs::write(root.join("bad.txt"), [b'o', b'k', 0xFF, b'!']).unwrap();

        let docs = load_documents(root).unwrap();
        let names: Vec<String> = docs
            .iter()
            .map(|d| d.path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(names, vec![".hidden/x.md", "b.txt", "bad.txt", "facts/2021.md"]);
        assert_eq!(docs[1].text, "plain\nnotes");
        assert_eq!(docs[2].text, "ok!");
    }

    #[test]
    fn test_missing_dir_has_no_documents() {
        let dir = TempDir::new().unwrap();
        assert!(load_documents(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_pdf_with_unsupported_font_encoding_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "# Notes\nRent went up.").unwrap();
        fs::write(root.join("b.pdf"), pdf_with_font_encoding("BogusEncoding")).unwrap();

        let docs = load_documents(root).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, root.join("a.md"));
    }

    #[test]
    fn test_corrupt_pdf_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.md"), "kept").unwrap();
        fs::write(root.join("broken.pdf"), b"%PDF-1.4\nnot really a pdf").unwrap();

        assert!(extract_pdf(&root.join("broken.pdf")).is_none());
        let docs = load_documents(root).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "kept");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("unexpected encoding");
        assert_eq!(panic_message(payload.as_ref()), "unexpected encoding");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
