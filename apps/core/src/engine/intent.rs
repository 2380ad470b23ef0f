//! Query Intent Classifier (knowledge base).
//!
//! Classifies a free-text health question into one of three domains and fills
//! the matching localized template, personalized from the user's profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use super::keywords::{KeywordTable, QueryTopic};
use super::locale::Language;
use super::templates::{TemplateId, TemplateTable};
use crate::models::UserHealthProfile;

/// Topical domain of a free-text question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryDomain {
    Diabetes,
    Allergen,
    General,
}

impl QueryDomain {
    pub fn label(&self) -> &'static str {
        match self {
            QueryDomain::Diabetes => "diabetes",
            QueryDomain::Allergen => "allergen",
            QueryDomain::General => "general",
        }
    }
}

impl fmt::Display for QueryDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiabetesVariant {
    Type1,
    Type2,
    Prediabetes,
}

impl DiabetesVariant {
    /// Resolve the variant from a free-text diabetes type (either locale).
    pub fn from_profile_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("type 1") || lower.contains("نوع 1") {
            Some(DiabetesVariant::Type1)
        } else if lower.contains("type 2") || lower.contains("نوع 2") {
            Some(DiabetesVariant::Type2)
        } else if lower.contains("prediabetes") || lower.contains("مقدمات") {
            Some(DiabetesVariant::Prediabetes)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthQueryResponse {
    pub answer: String,
    #[serde(rename = "type")]
    pub domain: QueryDomain,
    pub language: Language,
    pub personalized: bool,
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    keywords: Arc<KeywordTable>,
    templates: Arc<TemplateTable>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(KeywordTable::shared(), TemplateTable::shared())
    }
}

impl KnowledgeBase {
    pub fn new(keywords: Arc<KeywordTable>, templates: Arc<TemplateTable>) -> Self {
        Self { keywords, templates }
    }

    /// Domain of `query` using the keyword set of `language` only.
    ///
    /// Diabetes takes precedence over allergen.
    pub fn classify(&self, query: &str, language: Language) -> QueryDomain {
        if self.keywords.mentions_topic(QueryTopic::Diabetes, language, query) {
            QueryDomain::Diabetes
        } else if self.keywords.mentions_topic(QueryTopic::Allergen, language, query) {
            QueryDomain::Allergen
        } else {
            QueryDomain::General
        }
    }

    pub fn answer(
        &self,
        query: &str,
        language: Language,
        profile: &UserHealthProfile,
    ) -> HealthQueryResponse {
        let domain = self.classify(query, language);

        let (answer, personalized) = match domain {
            QueryDomain::Diabetes => {
                let id = match profile.diabetes_type().and_then(DiabetesVariant::from_profile_text) {
                    Some(DiabetesVariant::Type1) => TemplateId::KbDiabetesType1,
                    Some(DiabetesVariant::Type2) => TemplateId::KbDiabetesType2,
                    Some(DiabetesVariant::Prediabetes) => TemplateId::KbPrediabetes,
                    None => TemplateId::KbDiabetesGeneral,
                };
                (
                    self.templates.get(id, language).to_string(),
                    profile.diabetes_type().is_some(),
                )
            }
            QueryDomain::Allergen if profile.has_allergies() => (
                self.templates.render(
                    TemplateId::KbAllergenWithAllergies,
                    language,
                    &[("allergies", profile.allergy_labels().as_str())],
                ),
                true,
            ),
            QueryDomain::Allergen => (
                self.templates.get(TemplateId::KbAllergenGeneral, language).to_string(),
                false,
            ),
            QueryDomain::General => (self.templates.get(TemplateId::KbGeneral, language).to_string(), false),
        };

        info!(domain = %domain, language = %language, personalized, "Health query classified");

        HealthQueryResponse {
            answer,
            domain,
            language,
            personalized,
        }
    }
}

/// Answer a health question with the curated tables.
///
/// `language_code` other than `ar` is treated as English.
pub fn process_health_query(
    query: &str,
    language_code: &str,
    profile: &UserHealthProfile,
) -> HealthQueryResponse {
    KnowledgeBase::default().answer(query, Language::from_code(language_code), profile)
}
