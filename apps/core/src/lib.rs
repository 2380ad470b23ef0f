// Sehhamate Core
// Health-risk classification and recommendation engine shared by the apps

pub mod circuit_breaker;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod responders;

pub use config::{BreakerConfig, DocumentPipelineConfig, RemoteModelConfig};
pub use error::{AppError, DocumentError};
pub use models::{AllergyRecord, DetectedEntity, RiskLevel, SourceType, UserHealthProfile};

#[cfg(test)]
mod tests;
