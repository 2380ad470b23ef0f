use crate::config::DocumentPipelineConfig;
use crate::documents::validation::MAX_FILE_SIZE;
use crate::documents::{
    validate_document, validate_document_with, AuthenticityPolicy, DocumentPipeline, DocumentType,
    ExtractedDocumentData, ExtractionStatus, FileMetadata, ProcessingStatus,
};
use crate::error::DocumentError;
use tokio::sync::mpsc;

fn lab_scan() -> FileMetadata {
    FileMetadata {
        uri: Some("file:///scans/cbc.jpg".to_string()),
        name: Some("cbc.jpg".to_string()),
        mime_type: Some("image/jpeg".to_string()),
        size: Some(350_000),
        header_bytes: None,
    }
}

#[test]
fn test_validation_is_idempotent() {
    let file = lab_scan();
    let tiny = FileMetadata::named("x.png", "image/png", 10);

    assert_eq!(validate_document(&file, "lab_report"), validate_document(&file, "lab_report"));
    assert_eq!(validate_document(&tiny, "prescription"), validate_document(&tiny, "prescription"));
}

#[test]
fn test_unknown_document_type_ignores_file_content() {
    let candidates = [
        lab_scan(),
        FileMetadata::default(),
        FileMetadata::named("virus.exe", "application/x-msdownload", 5),
    ];

    for file in &candidates {
        let err = validate_document(file, "medical_bill").unwrap_err();
        assert_eq!(err.code(), "INVALID_DOCUMENT_TYPE");
    }
}

#[test]
fn test_oversize_fails_for_both_document_types() {
    let mut file = lab_scan();
    file.size = Some(MAX_FILE_SIZE + 1);

    for document_type in ["lab_report", "prescription"] {
        let err = validate_document_with(&file, document_type, AuthenticityPolicy::Allow).unwrap_err();
        assert_eq!(err, DocumentError::FileTooLarge(MAX_FILE_SIZE + 1));
        assert_eq!(err.to_string(), "File size exceeds 10MB limit. Please upload a smaller file.");
    }
}

#[test]
fn test_clean_file_verdict() {
    let verdict = validate_document(&lab_scan(), "lab_report").unwrap();

    assert_eq!(verdict.document_type, DocumentType::LabReport);
    assert_eq!(verdict.file_name, "cbc.jpg");
    assert!(verdict.warnings.is_empty());
}

#[tokio::test]
async fn test_validate_then_upload_and_process() {
    let file = lab_scan();
    let verdict = validate_document(&file, "prescription").unwrap();
    let pipeline = DocumentPipeline::new(DocumentPipelineConfig::immediate());
    let (tx, mut rx) = mpsc::channel(16);

    let result = pipeline
        .upload_and_process(&file, "user-42", verdict.document_type, Some(tx))
        .await;

    let mut last = 0;
    while let Some(p) = rx.recv().await {
        assert!(p > last);
        last = p;
    }
    assert_eq!(last, 100);
    assert_eq!(result.processing_status, ProcessingStatus::Completed);
    assert!(result.download_url.starts_with("documents/user-42/prescription/"));
    let extracted = result.extracted.expect("sample analyzer always extracts");
    assert!(matches!(extracted, ExtractedDocumentData::Prescription(_)));
    assert_eq!(extracted.status(), ExtractionStatus::Processed);
}

#[tokio::test]
async fn test_progress_with_uneven_step_ends_at_100() {
    let config = DocumentPipelineConfig {
        progress_step: 30,
        ..DocumentPipelineConfig::immediate()
    };
    let (tx, mut rx) = mpsc::channel(16);

    DocumentPipeline::new(config)
        .upload(&lab_scan(), "u", DocumentType::LabReport, Some(tx))
        .await;

    let mut seen = Vec::new();
    while let Some(p) = rx.recv().await {
        seen.push(p);
    }
    assert_eq!(seen, vec![30, 60, 90, 100]);
}
