//! Recommendation Composer.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::intent::DiabetesVariant;
use super::keywords::{KeywordTable, QueryTopic};
use super::locale::Language;
use super::templates::{TemplateId, TemplateTable};
use crate::models::{NutritionProfile, UserHealthProfile};

/// Topic flags derived from the query text (or given explicitly).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFlags {
    pub meal: bool,
    pub exercise: bool,
    pub nutrition: bool,
}

/// Which profile signals were present when composing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSignals {
    pub diabetes_type: bool,
    pub allergies: bool,
    pub dietary_restrictions: bool,
    pub health_goals: bool,
}

impl ProfileSignals {
    pub fn of(profile: &UserHealthProfile) -> Self {
        Self {
            diabetes_type: profile.diabetes_type().is_some(),
            allergies: profile.has_allergies(),
            dietary_restrictions: !profile.dietary_restrictions.is_empty(),
            health_goals: !profile.health_goals.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub items: Vec<String>,
    pub based_on: ProfileSignals,
    pub topics: TopicFlags,
    pub language: Language,
    pub personalized: bool,
}

#[derive(Debug, Clone)]
pub struct RecommendationComposer {
    keywords: Arc<KeywordTable>,
    templates: Arc<TemplateTable>,
}

impl Default for RecommendationComposer {
    fn default() -> Self {
        Self::new(KeywordTable::shared(), TemplateTable::shared())
    }
}

impl RecommendationComposer {
    pub fn new(keywords: Arc<KeywordTable>, templates: Arc<TemplateTable>) -> Self {
        Self { keywords, templates }
    }

    /// Topic flags for `query`, matched against both locales.
    pub fn topics_for(&self, query: &str) -> TopicFlags {
        TopicFlags {
            meal: self.keywords.mentions_topic_any_locale(QueryTopic::Meal, query),
            exercise: self.keywords.mentions_topic_any_locale(QueryTopic::Exercise, query),
            nutrition: self.keywords.mentions_topic_any_locale(QueryTopic::Nutrition, query),
        }
    }

    pub fn compose(
        &self,
        query: &str,
        language: Language,
        profile: &UserHealthProfile,
    ) -> RecommendationSet {
        self.compose_for_topics(self.topics_for(query), language, profile)
    }

    /// Ordered items: diabetes meal advice, allergy warning, preferences,
    /// exercise, nutrition targets, goals; generic advice if nothing applied.
    pub fn compose_for_topics(
        &self,
        topics: TopicFlags,
        language: Language,
        profile: &UserHealthProfile,
    ) -> RecommendationSet {
        let t = &self.templates;
        let mut items = Vec::new();

        if topics.meal {
            let meal = profile
                .diabetes_type()
                .and_then(DiabetesVariant::from_profile_text)
                .map(|variant| match variant {
                    DiabetesVariant::Type1 => TemplateId::RecMealType1,
                    DiabetesVariant::Type2 => TemplateId::RecMealType2,
                    DiabetesVariant::Prediabetes => TemplateId::RecMealPrediabetes,
                });
            if let Some(id) = meal {
                items.push(t.get(id, language).to_string());
            }
        }

        if profile.has_allergies() {
            items.push(t.render(
                TemplateId::RecAllergyWarning,
                language,
                &[("allergies", profile.allergy_labels().as_str())],
            ));
        }

        if topics.meal && !profile.dietary_preferences.is_empty() {
            let preferences = profile.dietary_preferences.join(", ");
            items.push(t.render(
                TemplateId::RecPreferences,
                language,
                &[("preferences", preferences.as_str())],
            ));
        }

        if topics.exercise {
            let id = if profile.diabetes_type().is_some() {
                TemplateId::RecExerciseDiabetes
            } else {
                TemplateId::RecExerciseGeneral
            };
            items.push(t.get(id, language).to_string());
        }

        if topics.nutrition {
            if let Some(nutrition) = &profile.nutrition_profile {
                items.push(self.nutrition_text(nutrition, language));
            }
        }

        if !profile.health_goals.is_empty() {
            items.push(t.get(TemplateId::RecHealthGoals, language).to_string());
        }

        if items.is_empty() {
            items.push(t.get(TemplateId::RecGeneralAdvice, language).to_string());
        }

        debug!(items = items.len(), ?topics, "Recommendations composed");

        RecommendationSet {
            items,
            based_on: ProfileSignals::of(profile),
            topics,
            language,
            personalized: true,
        }
    }

    fn nutrition_text(&self, nutrition: &NutritionProfile, language: Language) -> String {
        let macros = nutrition.macronutrients.clone().unwrap_or_default();
        let calories = format_amount(nutrition.calories);
        let protein = format_amount(macros.protein);
        let carbs = format_amount(macros.carbohydrates);
        let fat = format_amount(macros.fat);
        self.templates.render(
            TemplateId::RecNutrition,
            language,
            &[
                ("calories", calories.as_str()),
                ("protein", protein.as_str()),
                ("carbs", carbs.as_str()),
                ("fat", fat.as_str()),
            ],
        )
    }
}

/// Whole numbers print without a fractional part.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Compose recommendations with the curated tables.
pub fn generate_personalized_recommendations(
    query: &str,
    language_code: &str,
    profile: &UserHealthProfile,
) -> RecommendationSet {
    RecommendationComposer::default().compose(query, Language::from_code(language_code), profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllergyRecord, Macronutrients, RiskLevel};

    #[test]
    fn test_meal_query_with_diabetes_and_allergies() {
        let profile = UserHealthProfile {
            diabetes_type: Some("Type 1".to_string()),
            allergies: vec![AllergyRecord::new("Peanuts", RiskLevel::High)],
            ..Default::default()
        };
        let set = generate_personalized_recommendations("What meal should I have?", "en", &profile);

        assert!(set.topics.meal);
        assert_eq!(set.items.len(), 2);
        assert!(set.items[0].starts_with("For Type 1 diabetes, coordinate meals with insulin"));
        assert!(set.items[1].contains("allergies to Peanuts"));
        assert!(set.based_on.diabetes_type);
        assert!(set.based_on.allergies);
    }

    #[test]
    fn test_allergy_warning_without_meal_flag() {
        let profile = UserHealthProfile {
            allergies: vec![AllergyRecord::new("Shellfish", RiskLevel::Medium)],
            ..Default::default()
        };
        let set = generate_personalized_recommendations("hello", "en", &profile);

        assert!(!set.topics.meal);
        assert_eq!(set.items.len(), 1);
        assert!(set.items[0].starts_with("Important: You have allergies to Shellfish"));
    }

    #[test]
    fn test_generic_fallback_when_nothing_applies() {
        let set = generate_personalized_recommendations("hello", "ar", &UserHealthProfile::default());

        assert_eq!(set.items.len(), 1);
        assert!(set.items[0].starts_with("بناءً على ملفك الصحي"));
        assert_eq!(set.language, Language::Ar);
    }

    #[test]
    fn test_nutrition_and_goals() {
        let profile = UserHealthProfile {
            nutrition_profile: Some(NutritionProfile {
                calories: 2000.0,
                macronutrients: Some(Macronutrients {
                    protein: 120.0,
                    carbohydrates: 225.0,
                    fat: 67.5,
                }),
            }),
            health_goals: vec!["lose weight".to_string()],
            ..Default::default()
        };
        let set = generate_personalized_recommendations("daily calorie target", "en", &profile);

        assert_eq!(
            set.items[0],
            "Based on your profile, aim for approximately 2000 calories per day. Target: 120g protein, 225g carbs, 67.5g fat."
        );
        assert!(set.items[1].starts_with("To achieve your health goals"));
        assert!(set.based_on.health_goals);
    }

    #[test]
    fn test_exercise_variant_and_arabic_keywords() {
        let profile = UserHealthProfile {
            diabetes_type: Some("Prediabetes".to_string()),
            ..Default::default()
        };
        let set = generate_personalized_recommendations("أي تمرين مناسب؟", "ar", &profile);

        assert!(set.topics.exercise);
        assert!(set.items[0].starts_with("لإدارة مرض السكري"));
    }
}
