use crate::engine::interaction::{score_to_risk, InteractionKind, InteractionSeverity};
use crate::engine::{
    detect_allergens, generate_personalized_recommendations, process_health_query, AllergenCategory,
    AllergenClassifier, DrugRecord, DrugTable, InteractionClassifier, InteractionMatch, KeywordTable, Language,
    MedicationQuery, QueryDomain, TemplateId, TemplateTable,
};
use crate::models::{AllergyRecord, DetectedEntity, RiskLevel, UserHealthProfile};
use std::sync::Arc;

fn allergic_to(allergies: Vec<AllergyRecord>) -> UserHealthProfile {
    UserHealthProfile {
        allergies,
        ..Default::default()
    }
}

#[test]
fn test_empty_allergy_list_never_produces_findings() {
    let entities = vec![
        DetectedEntity::food("cheese pizza", 0.95),
        DetectedEntity::food("shrimp", 0.9).with_attribute("ingredients", "peanut sauce, milk"),
        DetectedEntity::food("", 0.1),
    ];

    for language in [Language::En, Language::Ar] {
        let result = detect_allergens(&entities, &UserHealthProfile::default(), language);
        assert!(!result.has_findings);
        assert_eq!(result.overall_risk, RiskLevel::Low);
        assert!(result.safe_to_eat);
        assert!(result.warnings.is_empty());
    }
}

#[test]
fn test_overall_risk_is_the_maximum_match() {
    let profile = allergic_to(vec![
        AllergyRecord::new("Dairy", RiskLevel::Low),
        AllergyRecord::new("Peanuts", RiskLevel::High),
    ]);
    let entities = vec![
        DetectedEntity::food("cheese", 0.9),
        DetectedEntity::food("almond snack", 0.9),
    ];

    let result = detect_allergens(&entities, &profile, Language::En);

    let levels: Vec<_> = result.allergen_matches().map(|m| m.risk_level).collect();
    assert_eq!(levels, vec![RiskLevel::Low, RiskLevel::High]);
    assert_eq!(result.overall_risk, RiskLevel::High);
    assert_eq!(result.warnings.len(), 2);
    assert!(!result.safe_to_eat);
}

#[test]
fn test_injected_keyword_table_drives_the_classifier() {
    let keywords = KeywordTable::empty().with_allergen_keywords(AllergenCategory::Dairy, Language::En, &["labneh"]);
    let classifier = AllergenClassifier::new(Arc::new(keywords), TemplateTable::shared());
    let profile = allergic_to(vec![AllergyRecord::new("Dairy", RiskLevel::High)]);

    let labneh = classifier.classify(&[DetectedEntity::food("Labneh wrap", 0.9)], &profile, Language::En);
    let cheese = classifier.classify(&[DetectedEntity::food("cheese", 0.9)], &profile, Language::En);

    assert!(labneh.has_findings);
    assert!(!cheese.has_findings);
}

#[test]
fn test_type2_blood_sugar_question() {
    let profile = UserHealthProfile {
        diabetes_type: Some("Type 2".to_string()),
        ..Default::default()
    };

    let response = process_health_query("How should I control my blood sugar?", "en", &profile);

    assert_eq!(response.domain, QueryDomain::Diabetes);
    assert!(response.personalized);
    assert_eq!(
        response.answer,
        TemplateTable::shared().get(TemplateId::KbDiabetesType2, Language::En)
    );
}

#[test]
fn test_unsupported_language_code_answers_in_english() {
    let response = process_health_query("bonjour", "fr", &UserHealthProfile::default());
    assert_eq!(response.language, Language::En);
    assert_eq!(response.domain, QueryDomain::General);
}

#[test]
fn test_meal_query_with_allergies_and_diabetes() {
    let profile = UserHealthProfile {
        diabetes_type: Some("Type 1".to_string()),
        allergies: vec![
            AllergyRecord::new("Peanuts", RiskLevel::High),
            AllergyRecord::new("Shellfish", RiskLevel::Medium),
        ],
        ..Default::default()
    };

    let set = generate_personalized_recommendations("What should I eat for my next meal?", "en", &profile);

    assert!(set.topics.meal);
    assert!(set.items[0].starts_with("For Type 1 diabetes"));
    assert!(set
        .items
        .iter()
        .any(|item| item.contains("You have allergies to Peanuts, Shellfish")));
}

#[test]
fn test_allergy_warning_without_meal_topic() {
    let profile = allergic_to(vec![AllergyRecord::new("Gluten", RiskLevel::Medium)]);

    let set = generate_personalized_recommendations("Any tips for my workout?", "en", &profile);

    assert!(!set.topics.meal);
    assert!(set.based_on.allergies);
    assert!(set.items.iter().any(|item| item.contains("allergies to Gluten")));
}

#[test]
fn test_contraindication_and_moderate_score_high() {
    let mut record = DrugRecord::generic("testamine");
    record.interactions = vec![
        InteractionMatch::new(
            InteractionKind::DrugDrug,
            InteractionSeverity::Contraindication,
            "Other drug",
            "Do not combine",
            "Unknown",
            "Avoid",
        ),
        InteractionMatch::new(
            InteractionKind::DrugFood,
            InteractionSeverity::Moderate,
            "Grapefruit",
            "Raises levels",
            "CYP3A4",
            "Limit",
        ),
    ];
    let classifier = InteractionClassifier::new(
        Arc::new(DrugTable::empty().with_record(record)),
        TemplateTable::shared(),
    );

    let report = classifier.analyze(&MedicationQuery::named("Testamine"), &UserHealthProfile::default(), Language::En);

    assert!(!report.is_fallback);
    assert_eq!(report.risk_score, 6);
    assert_eq!(report.assessment.overall_risk, RiskLevel::High);
    assert_eq!(score_to_risk(report.risk_score), RiskLevel::High);
}

#[test]
fn test_profile_context_never_lowers_interaction_risk() {
    let loaded = UserHealthProfile {
        diabetes_type: Some("Type 2".to_string()),
        allergies: vec![AllergyRecord::new("Penicillin", RiskLevel::High)],
        dietary_restrictions: vec!["grapefruit".to_string()],
        ..Default::default()
    };
    let classifier = InteractionClassifier::default();

    for name in ["Lisinopril", "Metformin", "Atorvastatin", "Amoxicillin"] {
        let query = MedicationQuery::named(name);
        let bare = classifier.analyze(&query, &UserHealthProfile::default(), Language::En);
        let rich = classifier.analyze(&query, &loaded, Language::En);
        assert!(rich.risk_score >= bare.risk_score, "{} score dropped", name);
        assert!(rich.assessment.overall_risk >= bare.assessment.overall_risk, "{} risk dropped", name);
    }
}
