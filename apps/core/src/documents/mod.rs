//! Medical document intake: synchronous validation of picked files and the
//! simulated upload and extraction pipeline.

pub mod analysis;
pub mod validation;

pub use analysis::{
    DocumentAnalyzer, DocumentPipeline, ExtractedDocumentData, ExtractionStatus, ProcessedDocument,
    ProcessingStatus, SampleAnalyzer, UploadReceipt,
};
pub use validation::{
    validate_document, validate_document_with, AuthenticityPolicy, DocumentType, FileMetadata, ValidationVerdict,
};
