//! # Engine Module
//!
//! Deterministic health-risk rule engine. Every classifier is a pure function
//! over its inputs and the curated lookup tables, so it can be called from any
//! number of tasks at once.
//!
//! ## Components
//! - `keywords`: category and topic keyword tables (per locale)
//! - `templates`: keyed bilingual text templates
//! - `allergen`: allergen classifier for scanned food
//! - `interaction`: medication interaction scoring
//! - `intent`: knowledge-base answers for free-text questions
//! - `recommend`: personalized recommendation composer
//! - `allergy_profile`: initial allergy profile from onboarding data

pub mod allergen;
pub mod allergy_profile;
pub mod assessment;
pub mod intent;
pub mod interaction;
pub mod keywords;
pub mod locale;
pub mod recommend;
pub mod templates;

pub use allergen::{detect_allergens, match_risk, AllergenClassifier};
pub use allergy_profile::{generate_allergy_profile, AllergyProfile};
pub use assessment::{AllergenMatch, Finding, RiskAssessment, Warning, WarningKind};
pub use intent::{process_health_query, HealthQueryResponse, KnowledgeBase, QueryDomain};
pub use interaction::{
    analyze_medication, DrugRecord, DrugTable, InteractionClassifier, InteractionMatch, InteractionReport,
    InteractionSeverity, MedicationQuery,
};
pub use keywords::{AllergenCategory, KeywordTable, QueryTopic};
pub use locale::{detect_language, Language};
pub use recommend::{generate_personalized_recommendations, RecommendationComposer, RecommendationSet};
pub use templates::{TemplateId, TemplateTable};
