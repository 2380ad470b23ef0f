use thiserror::Error;

/// Crate-wide error type for the fallible edges of the core.
///
/// The classifiers themselves never fail; these errors only surface from
/// configuration loading and from collaborators such as the remote model.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents failures reported by the remote model collaborator.
    #[error("Remote model error: {0}")]
    Remote(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("HTTP timeout: {}", err))
        } else {
            AppError::Remote(format!("HTTP error: {}", err))
        }
    }
}

/// Synchronous document validation failures.
///
/// Each variant maps to a stable machine code (see [`DocumentError::code`]);
/// the `Display` text is the human-readable reason shown to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Document type is required")]
    MissingDocumentType,

    #[error("Invalid document type '{0}'. Must be one of: lab_report, prescription")]
    InvalidDocumentType(String),

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid file type. Please upload JPG, PNG, or PDF files only.")]
    InvalidFileType(String),

    #[error("Invalid file extension. Please upload JPG, PNG, or PDF files only.")]
    InvalidFileExtension(String),

    #[error("File size exceeds 10MB limit. Please upload a smaller file.")]
    FileTooLarge(u64),

    #[error("{}", .0.join(", "))]
    SuspiciousFile(Vec<String>),
}

impl DocumentError {
    /// Stable code for callers that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::MissingDocumentType => "MISSING_DOCUMENT_TYPE",
            DocumentError::InvalidDocumentType(_) => "INVALID_DOCUMENT_TYPE",
            DocumentError::MissingFile => "MISSING_FILE",
            DocumentError::InvalidFileType(_) => "INVALID_FILE_TYPE",
            DocumentError::InvalidFileExtension(_) => "INVALID_FILE_EXTENSION",
            DocumentError::FileTooLarge(_) => "FILE_TOO_LARGE",
            DocumentError::SuspiciousFile(_) => "SUSPICIOUS_FILE",
        }
    }
}
