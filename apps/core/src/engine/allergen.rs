//! Allergen Classifier.
//!
//! Matches detected food entities against the user's allergy list through
//! the category keyword tables and grades every hit on the 3-tier scale.

use std::sync::Arc;
use tracing::{debug, info};

use super::assessment::{AllergenMatch, Finding, RiskAssessment, Warning, WarningKind};
use super::keywords::KeywordTable;
use super::locale::Language;
use super::templates::{TemplateId, TemplateTable};
use crate::models::{DetectedEntity, RiskLevel, UserHealthProfile};

/// Risk tier of a single match.
///
/// `high` needs a high-severity allergy seen with confidence above 0.7;
/// medium severity or confidence under 0.8 yields `medium`; anything else is `low`.
pub fn match_risk(severity: RiskLevel, confidence: f32) -> RiskLevel {
    if severity == RiskLevel::High && confidence > 0.7 {
        RiskLevel::High
    } else if severity == RiskLevel::Medium || confidence < 0.8 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[derive(Debug, Clone)]
pub struct AllergenClassifier {
    keywords: Arc<KeywordTable>,
    templates: Arc<TemplateTable>,
}

impl Default for AllergenClassifier {
    fn default() -> Self {
        Self::new(KeywordTable::shared(), TemplateTable::shared())
    }
}

impl AllergenClassifier {
    pub fn new(keywords: Arc<KeywordTable>, templates: Arc<TemplateTable>) -> Self {
        Self { keywords, templates }
    }

    /// Classify `entities` against the allergies in `profile`.
    ///
    /// Never fails: an empty allergy list or zero matches are ordinary outcomes.
    pub fn classify(
        &self,
        entities: &[DetectedEntity],
        profile: &UserHealthProfile,
        language: Language,
    ) -> RiskAssessment {
        if !profile.has_allergies() {
            return RiskAssessment::clear(self.templates.get(TemplateId::AllergenAdviceNone, language))
                .with_message(self.templates.get(TemplateId::AllergenNoneRegistered, language));
        }

        let mut matches = Vec::new();
        for entity in entities {
            let blob = entity.text_blob();
            for allergy in &profile.allergies {
                let category = allergy.resolved_category();
                let label = allergy.label.to_lowercase();
                let Some(keyword) = self.keywords.find_allergen(category, &label, &blob) else {
                    continue;
                };

                let risk_level = match_risk(allergy.severity, entity.confidence);
                debug!(
                    allergen = %allergy.label,
                    entity = %entity.name,
                    keyword,
                    risk = %risk_level,
                    "Allergen match"
                );
                matches.push(AllergenMatch {
                    allergen: allergy.label.clone(),
                    category,
                    severity: allergy.severity,
                    risk_level,
                    source_entity_name: entity.name.clone(),
                    confidence: entity.confidence,
                    matched_keyword: keyword.to_string(),
                });
            }
        }

        let overall_risk = RiskLevel::max_of(matches.iter().map(|m| m.risk_level));
        let warnings = matches.iter().map(|m| self.warning_for(m, language)).collect();
        let recommendation_id = if matches.is_empty() {
            TemplateId::AllergenAdviceNone
        } else {
            match overall_risk {
                RiskLevel::High => TemplateId::AllergenAdviceHigh,
                RiskLevel::Medium => TemplateId::AllergenAdviceMedium,
                RiskLevel::Low => TemplateId::AllergenAdviceLow,
            }
        };

        info!(
            entities = entities.len(),
            allergies = profile.allergies.len(),
            matches = matches.len(),
            overall_risk = %overall_risk,
            "Allergen classification complete"
        );

        let has_findings = !matches.is_empty();
        RiskAssessment {
            has_findings,
            findings: matches.into_iter().map(Finding::Allergen).collect(),
            overall_risk,
            recommendation_text: self.templates.get(recommendation_id, language).to_string(),
            warnings,
            message: None,
            safe_to_eat: !has_findings,
        }
    }

    fn warning_for(&self, m: &AllergenMatch, language: Language) -> Warning {
        let id = match m.risk_level {
            RiskLevel::High => TemplateId::AllergenWarningHigh,
            RiskLevel::Medium => TemplateId::AllergenWarningMedium,
            RiskLevel::Low => TemplateId::AllergenWarningLow,
        };
        let vars = [
            ("allergen", m.allergen.as_str()),
            ("food", m.source_entity_name.as_str()),
        ];
        Warning {
            kind: WarningKind::Allergen,
            severity: m.risk_level,
            title: self.templates.render(TemplateId::AllergenTitle, language, &vars),
            message: self.templates.render(id, language, &vars),
            recommendation: None,
            allergen: Some(m.allergen.clone()),
            source_entity: Some(m.source_entity_name.clone()),
        }
    }
}

/// Classify with the curated keyword and template tables.
pub fn detect_allergens(
    entities: &[DetectedEntity],
    profile: &UserHealthProfile,
    language: Language,
) -> RiskAssessment {
    AllergenClassifier::default().classify(entities, profile, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::keywords::AllergenCategory;
    use crate::models::AllergyRecord;

    fn profile_with(allergies: Vec<AllergyRecord>) -> UserHealthProfile {
        UserHealthProfile {
            allergies,
            ..Default::default()
        }
    }

    #[test]
    fn test_match_risk_rule() {
        assert_eq!(match_risk(RiskLevel::High, 0.8), RiskLevel::High);
        assert_eq!(match_risk(RiskLevel::High, 0.6), RiskLevel::Medium);
        assert_eq!(match_risk(RiskLevel::Medium, 0.99), RiskLevel::Medium);
        assert_eq!(match_risk(RiskLevel::Low, 0.75), RiskLevel::Medium);
        assert_eq!(match_risk(RiskLevel::Low, 0.9), RiskLevel::Low);
    }

    #[test]
    fn test_no_allergies_is_not_an_error() {
        let result = detect_allergens(
            &[DetectedEntity::food("Peanut butter toast", 0.95)],
            &UserHealthProfile::default(),
            Language::En,
        );

        assert!(!result.has_findings);
        assert!(result.safe_to_eat);
        assert_eq!(result.overall_risk, RiskLevel::Low);
        assert_eq!(result.message.as_deref(), Some("No allergies registered in your profile"));
    }

    #[test]
    fn test_cheese_with_high_dairy_allergy_is_high() {
        let profile = profile_with(vec![AllergyRecord::new("Dairy", RiskLevel::High)]);
        let result = detect_allergens(&[DetectedEntity::food("cheese", 0.8)], &profile, Language::En);

        assert!(result.has_findings);
        assert!(!result.safe_to_eat);
        assert_eq!(result.overall_risk, RiskLevel::High);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].title, "⚠️ Dairy Detected");
        assert!(result.warnings[0].message.contains("DO NOT CONSUME"));
        assert!(result.recommendation_text.starts_with("DO NOT CONSUME"));
    }

    #[test]
    fn test_hidden_source_in_attributes() {
        let profile = profile_with(vec![AllergyRecord::new("Sesame", RiskLevel::Medium)]);
        let entity = DetectedEntity::food("Falafel wrap", 0.9)
            .with_attribute("ingredients", serde_json::json!(["chickpeas", "tahini sauce"]));

        let result = detect_allergens(&[entity], &profile, Language::En);
        let matched: Vec<_> = result.allergen_matches().collect();

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].category, AllergenCategory::Sesame);
        assert_eq!(matched[0].matched_keyword, "tahini");
        assert_eq!(result.overall_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_other_category_uses_label() {
        let profile = profile_with(vec![AllergyRecord::new("Kiwi", RiskLevel::Low)]);
        let hit = detect_allergens(&[DetectedEntity::food("Kiwi smoothie", 0.9)], &profile, Language::En);
        let miss = detect_allergens(&[DetectedEntity::food("Apple juice", 0.9)], &profile, Language::En);

        assert_eq!(hit.overall_risk, RiskLevel::Low);
        assert!(hit.has_findings);
        assert!(!miss.has_findings);
        assert_eq!(
            miss.recommendation_text,
            "No allergens detected. Safe to consume based on your allergy profile."
        );
    }

    #[test]
    fn test_arabic_output() {
        let profile = profile_with(vec![AllergyRecord::new("حليب", RiskLevel::High)]);
        let result = detect_allergens(&[DetectedEntity::food("جبن أبيض", 0.9)], &profile, Language::Ar);

        assert_eq!(result.overall_risk, RiskLevel::High);
        assert!(result.warnings[0].message.contains("لا تتناوله"));
    }
}
