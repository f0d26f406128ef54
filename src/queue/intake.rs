//! Selection intake — filters a picked or dropped batch down to PDFs.
//!
//! The declared content type decides, mirroring the browser flow: non-PDFs
//! are silently dropped from a mixed batch, and a batch with no PDFs at all
//! is rejected outright with no state change.

use std::path::Path;

use thiserror::Error;

/// The only content type the queue accepts.
pub const PDF_MIME: &str = "application/pdf";

/// File names longer than this are truncated.
const MAX_NAME_LEN: usize = 255;

#[derive(Error, Debug)]
pub enum IntakeError {
    /// The whole selection was filtered away. Surfaced as a blocking
    /// notice; nothing was queued.
    #[error("Please upload PDF files only.")]
    NoPdfFiles,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file as it arrives from the picker or a drop, before it is queued.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Declared content type (the `file.type` analogue).
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: sanitize_filename(name),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }
}

/// Load a file from disk, deriving the declared content type from its name
/// the way a browser populates `type` on a picked file.
pub fn load_incoming(path: &Path) -> Result<IncomingFile, IntakeError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let bytes = std::fs::read(path)?;
    Ok(IncomingFile::new(name, &mime_type, bytes))
}

/// Keep only PDFs, preserving order; reject the batch when none remain.
pub fn filter_pdfs(files: Vec<IncomingFile>) -> Result<Vec<IncomingFile>, IntakeError> {
    let pdfs: Vec<IncomingFile> = files.into_iter().filter(IncomingFile::is_pdf).collect();
    if pdfs.is_empty() {
        return Err(IntakeError::NoPdfFiles);
    }
    Ok(pdfs)
}

/// Sanitize a filename — strip path components, limit length
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(MAX_NAME_LEN)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
