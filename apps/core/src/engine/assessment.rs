//! Result records shared by the allergen and interaction classifiers.

use serde::{Deserialize, Serialize};

use super::interaction::InteractionMatch;
use super::keywords::AllergenCategory;
use crate::models::RiskLevel;

/// Ties one allergy record to one detected entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenMatch {
    /// The allergy label as written in the profile
    pub allergen: String,
    pub category: AllergenCategory,
    /// Severity recorded on the allergy
    pub severity: RiskLevel,
    /// Risk tier computed for this particular match
    pub risk_level: RiskLevel,
    pub source_entity_name: String,
    pub confidence: f32,
    pub matched_keyword: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    Allergen(AllergenMatch),
    Interaction(InteractionMatch),
}

impl Finding {
    /// Tier this finding contributes to aggregation.
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Finding::Allergen(m) => m.risk_level,
            Finding::Interaction(m) => m.severity_class.risk_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Allergen,
    FoodDrug,
    AllergyDrug,
    DrugInteraction,
    Dosage,
}

/// A display-ready warning attached to an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: RiskLevel,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_entity: Option<String>,
}

/// Outcome of a classification request. Recomputed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub has_findings: bool,
    pub findings: Vec<Finding>,
    pub overall_risk: RiskLevel,
    pub recommendation_text: String,
    pub warnings: Vec<Warning>,
    /// Explanatory note for results that are not driven by findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// True iff there are no findings
    pub safe_to_eat: bool,
}

impl RiskAssessment {
    /// An empty assessment: no findings, `low` risk.
    pub fn clear(recommendation_text: impl Into<String>) -> Self {
        Self {
            has_findings: false,
            findings: Vec::new(),
            overall_risk: RiskLevel::Low,
            recommendation_text: recommendation_text.into(),
            warnings: Vec::new(),
            message: None,
            safe_to_eat: true,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn allergen_matches(&self) -> impl Iterator<Item = &AllergenMatch> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Allergen(m) => Some(m),
            Finding::Interaction(_) => None,
        })
    }

    pub fn interaction_matches(&self) -> impl Iterator<Item = &InteractionMatch> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Interaction(m) => Some(m),
            Finding::Allergen(_) => None,
        })
    }
}
