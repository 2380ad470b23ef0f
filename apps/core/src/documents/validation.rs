use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::DocumentError;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MIN_PLAUSIBLE_SIZE: u64 = 1024;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/pdf",
    "application/pdf",
    "image/heic",
    "image/heif",
];
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "heic", "heif"];
const UNSAFE_EXTENSIONS: &[&str] = &["exe", "bat", "scr", "com", "vbs"];

pub const WARN_UNSAFE_EXTENSION: &str = "File extension may be unsafe";
pub const WARN_TOO_SMALL: &str = "File size is unusually small";
pub const WARN_CONTENT_MISMATCH: &str = "File content does not match its declared type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    LabReport,
    Prescription,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::LabReport => "lab_report",
            DocumentType::Prescription => "prescription",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the upload UI knows about a picked file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Declared mime type
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Leading bytes of the file, when the caller has read them
    #[serde(default, skip_serializing)]
    pub header_bytes: Option<Vec<u8>>,
}

impl FileMetadata {
    pub fn named(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: Some(mime_type.into()),
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn with_header_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.header_bytes = Some(bytes.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("document")
    }

    fn extension(&self) -> Option<String> {
        self.name
            .as_deref()
            .and_then(|n| n.rsplit('.').next())
            .map(|ext| ext.to_lowercase())
    }
}

/// Whether authenticity warnings fail validation or are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthenticityPolicy {
    #[default]
    Reject,
    Allow,
}

/// Successful outcome of [`validate_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// Non-empty only under [`AuthenticityPolicy::Allow`]
    pub warnings: Vec<String>,
}

pub fn validate_document_type(document_type: &str) -> Result<DocumentType, DocumentError> {
    match document_type.trim() {
        "" => Err(DocumentError::MissingDocumentType),
        "lab_report" => Ok(DocumentType::LabReport),
        "prescription" => Ok(DocumentType::Prescription),
        other => Err(DocumentError::InvalidDocumentType(other.to_string())),
    }
}

/// Mime type (or extension when no type is declared) and the size ceiling.
pub fn validate_format(file: &FileMetadata) -> Result<(), DocumentError> {
    let has_uri = file.uri.as_deref().is_some_and(|u| !u.is_empty());
    let has_name = file.name.as_deref().is_some_and(|n| !n.is_empty());
    if !has_uri && !has_name {
        return Err(DocumentError::MissingFile);
    }

    match file.mime_type.as_deref().filter(|t| !t.is_empty()) {
        Some(mime) => {
            let mime = mime.to_lowercase();
            if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
                return Err(DocumentError::InvalidFileType(mime));
            }
        }
        None => {
            if let Some(ext) = file.extension() {
                if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                    return Err(DocumentError::InvalidFileExtension(ext));
                }
            }
        }
    }

    match file.size {
        Some(size) if size > MAX_FILE_SIZE => Err(DocumentError::FileTooLarge(size)),
        _ => Ok(()),
    }
}

fn canonical_mime(mime: &str) -> &str {
    match mime {
        "image/jpg" => "image/jpeg",
        "image/pdf" => "application/pdf",
        "image/heic" => "image/heif",
        other => other,
    }
}

/// Heuristic warnings; none of them is conclusive on its own.
pub fn authenticity_warnings(file: &FileMetadata) -> Vec<String> {
    let mut warnings = Vec::new();

    if file
        .extension()
        .is_some_and(|ext| UNSAFE_EXTENSIONS.contains(&ext.as_str()))
    {
        warnings.push(WARN_UNSAFE_EXTENSION.to_string());
    }

    if file.size.is_some_and(|size| size > 0 && size < MIN_PLAUSIBLE_SIZE) {
        warnings.push(WARN_TOO_SMALL.to_string());
    }

    if let (Some(bytes), Some(declared)) = (&file.header_bytes, &file.mime_type) {
        if let Some(kind) = infer::get(bytes) {
            let declared = declared.to_lowercase();
            if canonical_mime(kind.mime_type()) != canonical_mime(&declared) {
                debug!(declared = %declared, sniffed = kind.mime_type(), "Magic bytes disagree with declared type");
                warnings.push(WARN_CONTENT_MISMATCH.to_string());
            }
        }
    }

    warnings
}

/// Type, then format, then authenticity; stops at the first failure.
pub fn validate_document(
    file: &FileMetadata,
    document_type: &str,
) -> Result<ValidationVerdict, DocumentError> {
    validate_document_with(file, document_type, AuthenticityPolicy::Reject)
}

pub fn validate_document_with(
    file: &FileMetadata,
    document_type: &str,
    policy: AuthenticityPolicy,
) -> Result<ValidationVerdict, DocumentError> {
    let document_type = validate_document_type(document_type)?;
    validate_format(file)?;

    let warnings = authenticity_warnings(file);
    if !warnings.is_empty() {
        warn!(file = file.display_name(), ?warnings, ?policy, "Document authenticity warnings");
        if policy == AuthenticityPolicy::Reject {
            return Err(DocumentError::SuspiciousFile(warnings));
        }
    }

    Ok(ValidationVerdict {
        document_type,
        file_name: file.name.clone().unwrap_or_else(|| "unknown".to_string()),
        file_type: file.mime_type.clone().unwrap_or_else(|| "unknown".to_string()),
        file_size: file.size.unwrap_or(0),
        warnings,
    })
}
