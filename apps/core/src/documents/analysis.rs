use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::validation::{DocumentType, FileMetadata};
use crate::config::DocumentPipelineConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Normal,
    SlightlyElevated,
    Elevated,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub name: String,
    pub value: LabValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_range: Option<String>,
    pub status: TestStatus,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReportData {
    pub patient_name: String,
    pub date: NaiveDate,
    pub lab_name: String,
    pub tests: Vec<LabTest>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabAnalysis {
    pub overall_health: String,
    pub risk_factors: Vec<String>,
    pub priority: String,
    pub next_steps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub purpose: String,
    pub warnings: Vec<String>,
    pub interactions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionData {
    pub patient_name: String,
    pub date: NaiveDate,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub medications: Vec<PrescribedMedication>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub refill_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionAnalysis {
    pub medication_count: usize,
    pub has_interactions: bool,
    pub adherence_score: String,
    pub priority: String,
    pub next_steps: String,
}

/// Extraction state of a document record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    #[default]
    Processed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    pub status: ExtractionStatus,
    pub extracted_data: LabReportData,
    pub analysis: LabAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub status: ExtractionStatus,
    pub extracted_data: PrescriptionData,
    pub analysis: PrescriptionAnalysis,
}

/// Structured health information pulled out of an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "documentType", rename_all = "snake_case")]
pub enum ExtractedDocumentData {
    LabReport(LabReport),
    Prescription(Prescription),
}

impl ExtractedDocumentData {
    pub fn document_type(&self) -> DocumentType {
        match self {
            ExtractedDocumentData::LabReport(_) => DocumentType::LabReport,
            ExtractedDocumentData::Prescription(_) => DocumentType::Prescription,
        }
    }

    pub fn status(&self) -> ExtractionStatus {
        match self {
            ExtractedDocumentData::LabReport(report) => report.status,
            ExtractedDocumentData::Prescription(prescription) => prescription.status,
        }
    }
}

fn lab_test(
    name: &str,
    value: f64,
    unit: &str,
    normal_range: &str,
    status: TestStatus,
    interpretation: &str,
) -> LabTest {
    LabTest {
        name: name.to_string(),
        value: LabValue::Number(value),
        unit: Some(unit.to_string()),
        normal_range: Some(normal_range.to_string()),
        status,
        interpretation: interpretation.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed sample lab panel dated `date`.
pub fn sample_lab_report(date: NaiveDate) -> LabReport {
    use TestStatus::{Normal, SlightlyElevated};

    let mut tests = vec![
        lab_test("Fasting Blood Glucose", 95.0, "mg/dL", "70-100 mg/dL", Normal, "Within normal range"),
        lab_test("HbA1c", 5.8, "%", "< 5.7%", SlightlyElevated, "Slightly above normal. Monitor closely."),
        lab_test("Total Cholesterol", 185.0, "mg/dL", "< 200 mg/dL", Normal, "Within normal range"),
        lab_test("HDL Cholesterol", 55.0, "mg/dL", "> 40 mg/dL", Normal, "Good cholesterol level"),
        lab_test(
            "LDL Cholesterol",
            110.0,
            "mg/dL",
            "< 100 mg/dL",
            SlightlyElevated,
            "Slightly elevated. Consider dietary changes.",
        ),
        lab_test("Triglycerides", 120.0, "mg/dL", "< 150 mg/dL", Normal, "Within normal range"),
    ];
    tests.push(LabTest {
        name: "Complete Blood Count (CBC)".to_string(),
        value: LabValue::Text("Normal".to_string()),
        unit: None,
        normal_range: None,
        status: Normal,
        interpretation: "All CBC parameters within normal limits".to_string(),
    });

    LabReport {
        status: ExtractionStatus::Processed,
        extracted_data: LabReportData {
            patient_name: "Sample Patient".to_string(),
            date,
            lab_name: "Medical Laboratory Center".to_string(),
            tests,
            summary: "Most test results are within normal ranges. HbA1c is slightly elevated, suggesting pre-diabetes. LDL cholesterol is slightly above optimal. Overall health status is good with minor areas for improvement.".to_string(),
            recommendations: strings(&[
                "Continue monitoring blood glucose levels",
                "Consider dietary modifications to lower LDL cholesterol",
                "Maintain regular exercise routine",
                "Schedule follow-up in 3 months",
            ]),
        },
        analysis: LabAnalysis {
            overall_health: "good".to_string(),
            risk_factors: strings(&["slightly_elevated_hba1c", "slightly_elevated_ldl"]),
            priority: "medium".to_string(),
            next_steps: "Follow-up monitoring recommended".to_string(),
        },
    }
}

fn medication(
    name: &str,
    dosage: &str,
    frequency: &str,
    duration: &str,
    instructions: &str,
    purpose: &str,
    warnings: &[&str],
) -> PrescribedMedication {
    PrescribedMedication {
        name: name.to_string(),
        dosage: dosage.to_string(),
        frequency: frequency.to_string(),
        duration: duration.to_string(),
        instructions: instructions.to_string(),
        purpose: purpose.to_string(),
        warnings: strings(warnings),
        interactions: Vec::new(),
    }
}

/// Fixed sample prescription dated `date`.
pub fn sample_prescription(date: NaiveDate) -> Prescription {
    let medications = vec![
        medication(
            "Metformin",
            "500mg",
            "Twice daily",
            "30 days",
            "Take with meals to reduce stomach upset",
            "Blood glucose control",
            &["May cause gastrointestinal side effects", "Avoid alcohol consumption"],
        ),
        medication(
            "Atorvastatin",
            "20mg",
            "Once daily",
            "30 days",
            "Take at bedtime",
            "Cholesterol management",
            &["May cause muscle pain", "Report any unusual muscle weakness"],
        ),
        medication(
            "Aspirin",
            "81mg",
            "Once daily",
            "Ongoing",
            "Take with food",
            "Cardiovascular protection",
            &["May increase bleeding risk", "Avoid if allergic to aspirin"],
        ),
    ];

    let refill_info = [
        ("metformin", "Refill available in 25 days"),
        ("atorvastatin", "Refill available in 25 days"),
        ("aspirin", "Available over-the-counter"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let analysis = PrescriptionAnalysis {
        medication_count: medications.len(),
        has_interactions: medications.iter().any(|m| !m.interactions.is_empty()),
        adherence_score: "good".to_string(),
        priority: "high".to_string(),
        next_steps: "Follow medication schedule as prescribed".to_string(),
    };

    Prescription {
        status: ExtractionStatus::Processed,
        extracted_data: PrescriptionData {
            patient_name: "Sample Patient".to_string(),
            date,
            doctor_name: "Dr. Sarah Johnson".to_string(),
            doctor_specialty: "Endocrinology".to_string(),
            medications,
            summary: "Prescription includes medications for diabetes management (Metformin), cholesterol control (Atorvastatin), and cardiovascular protection (Aspirin). All medications are standard and well-tolerated.".to_string(),
            recommendations: strings(&[
                "Take Metformin with meals to minimize side effects",
                "Monitor for any muscle pain while on Atorvastatin",
                "Continue daily Aspirin as prescribed for heart health",
                "Follow up with doctor in 1 month to assess medication effectiveness",
            ]),
            refill_info,
        },
        analysis,
    }
}

/// Extraction backend for stored documents.
///
/// The bundled [`SampleAnalyzer`] stands in for a real OCR pipeline; hosts
/// plug their own implementation in here.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync + 'static {
    async fn analyze(&self, download_url: &str, document_type: DocumentType)
        -> Result<ExtractedDocumentData, AppError>;
}

/// Returns the fixed sample record for the document type after a delay.
#[derive(Debug, Clone)]
pub struct SampleAnalyzer {
    delay: std::time::Duration,
}

impl SampleAnalyzer {
    pub fn new(config: &DocumentPipelineConfig) -> Self {
        Self {
            delay: config.processing_delay(),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for SampleAnalyzer {
    async fn analyze(
        &self,
        _download_url: &str,
        document_type: DocumentType,
    ) -> Result<ExtractedDocumentData, AppError> {
        sleep(self.delay).await;

        let today = Utc::now().date_naive();
        Ok(match document_type {
            DocumentType::LabReport => ExtractedDocumentData::LabReport(sample_lab_report(today)),
            DocumentType::Prescription => ExtractedDocumentData::Prescription(sample_prescription(today)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub document_id: String,
    pub download_url: String,
    pub storage_path: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    pub document_id: String,
    pub download_url: String,
    pub extracted: Option<ExtractedDocumentData>,
    pub processing_status: ProcessingStatus,
}

/// Simulated upload followed by extraction.
pub struct DocumentPipeline {
    config: DocumentPipelineConfig,
    analyzer: Arc<dyn DocumentAnalyzer>,
}

impl DocumentPipeline {
    pub fn new(config: DocumentPipelineConfig) -> Self {
        let analyzer = Arc::new(SampleAnalyzer::new(&config));
        Self { config, analyzer }
    }

    pub fn with_analyzer(
        config: DocumentPipelineConfig,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> Self {
        Self { config, analyzer }
    }

    /// Reports percent progress on `progress` (if given) until 100, then
    /// returns where the file ended up. A dropped receiver does not abort
    /// the upload.
    #[instrument(skip(self, file, progress), fields(file_name = file.display_name()))]
    pub async fn upload(
        &self,
        file: &FileMetadata,
        user_id: &str,
        document_type: DocumentType,
        progress: Option<mpsc::Sender<u8>>,
    ) -> UploadReceipt {
        let step = self.config.progress_step.clamp(1, 100);
        let mut percent: u8 = 0;

        while percent < 100 {
            sleep(self.config.progress_interval()).await;
            percent = percent.saturating_add(step).min(100);
            if let Some(tx) = &progress {
                let _ = tx.send(percent).await;
            }
        }

        let uploaded_at = Utc::now();
        let file_name = file.display_name().to_string();
        let receipt = UploadReceipt {
            document_id: format!("doc_{}", Uuid::new_v4().simple()),
            download_url: format!(
                "documents/{}/{}/{}",
                user_id,
                document_type,
                uploaded_at.timestamp_millis()
            ),
            storage_path: format!("documents/{}/{}/{}", user_id, document_type, file_name),
            file_name,
            uploaded_at,
        };

        info!(document_id = %receipt.document_id, "Document uploaded");
        receipt
    }

    pub async fn process(
        &self,
        download_url: &str,
        document_type: DocumentType,
    ) -> Result<ExtractedDocumentData, AppError> {
        self.analyzer.analyze(download_url, document_type).await
    }

    /// Upload then extract. An extraction failure leaves the document
    /// `pending` instead of failing the whole call.
    pub async fn upload_and_process(
        &self,
        file: &FileMetadata,
        user_id: &str,
        document_type: DocumentType,
        progress: Option<mpsc::Sender<u8>>,
    ) -> ProcessedDocument {
        let receipt = self.upload(file, user_id, document_type, progress).await;

        let (extracted, processing_status) = match self.process(&receipt.download_url, document_type).await {
            Ok(data) => (Some(data), ProcessingStatus::Completed),
            Err(e) => {
                warn!(document_id = %receipt.document_id, error = %e, "Document extraction failed");
                (None, ProcessingStatus::Pending)
            }
        };

        ProcessedDocument {
            document_id: receipt.document_id,
            download_url: receipt.download_url,
            extracted,
            processing_status,
        }
    }
}
