//! Initial allergy profile generation.
//!
//! Turns the raw allergy list from onboarding into a scored profile with
//! cross-reactivity notes, hidden sources, alternatives and alert settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::keywords::AllergenCategory;
use crate::models::{AllergyRecord, RiskLevel, UserHealthProfile};

pub const PROFILE_VERSION: &str = "1.0";

const BASE_RISK_SCORE: u32 = 50;
const SEVERE_CATEGORY_BONUS: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedAllergy {
    pub label: String,
    pub severity: RiskLevel,
    pub category: AllergenCategory,
    pub common_names: Vec<String>,
    /// 0-100
    pub risk_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReactivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub related_allergens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGuidance {
    pub allergen: String,
    pub category: AllergenCategory,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub steps: Vec<String>,
    pub medications: String,
    pub emergency_contacts: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyInfo {
    pub has_action_plan: bool,
    pub action_plan: Option<ActionPlan>,
    pub risk_level: RiskLevel,
}

/// Which alert severities should notify the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertThreshold {
    All,
    HighMedium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    pub enabled: bool,
    pub severity: AlertThreshold,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    pub show_notifications: bool,
    pub scan_before_eating: bool,
}

impl AlertSettings {
    fn for_risk(risk: RiskLevel) -> Self {
        Self {
            enabled: true,
            severity: match risk {
                RiskLevel::High => AlertThreshold::All,
                RiskLevel::Medium => AlertThreshold::HighMedium,
                RiskLevel::Low => AlertThreshold::High,
            },
            sound_enabled: risk == RiskLevel::High,
            vibration_enabled: true,
            show_notifications: true,
            scan_before_eating: risk == RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: RiskLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyProfile {
    pub has_allergies: bool,
    pub allergies: Vec<AnalyzedAllergy>,
    pub risk_level: RiskLevel,
    pub alert_settings: AlertSettings,
    pub cross_reactivity: Vec<CrossReactivity>,
    pub hidden_sources: Vec<CategoryGuidance>,
    pub safe_alternatives: Vec<CategoryGuidance>,
    pub emergency_info: EmergencyInfo,
    pub dietary_recommendations: Vec<DietaryRecommendation>,
    pub generated_at: DateTime<Utc>,
    pub version: String,
}

/// Build the initial allergy profile. An empty allergy list yields a default safe profile.
pub fn generate_allergy_profile(profile: &UserHealthProfile) -> AllergyProfile {
    if !profile.has_allergies() {
        return AllergyProfile {
            has_allergies: false,
            allergies: Vec::new(),
            risk_level: RiskLevel::Low,
            alert_settings: AlertSettings {
                severity: AlertThreshold::All,
                ..AlertSettings::for_risk(RiskLevel::Low)
            },
            cross_reactivity: Vec::new(),
            hidden_sources: Vec::new(),
            safe_alternatives: Vec::new(),
            emergency_info: EmergencyInfo {
                has_action_plan: false,
                action_plan: None,
                risk_level: RiskLevel::Low,
            },
            dietary_recommendations: Vec::new(),
            generated_at: Utc::now(),
            version: PROFILE_VERSION.to_string(),
        };
    }

    let allergies: Vec<AnalyzedAllergy> = profile.allergies.iter().map(analyze_allergy).collect();
    let risk_level = overall_risk(&allergies);

    info!(
        allergies = allergies.len(),
        risk_level = %risk_level,
        "Allergy profile generated"
    );

    AllergyProfile {
        has_allergies: true,
        risk_level,
        alert_settings: AlertSettings::for_risk(risk_level),
        cross_reactivity: cross_reactivity(&allergies),
        hidden_sources: guidance(&allergies, hidden_sources),
        safe_alternatives: guidance(&allergies, safe_alternatives),
        emergency_info: emergency_info(&allergies, risk_level),
        dietary_recommendations: dietary_recommendations(&allergies, profile.diabetes_type().is_some()),
        allergies,
        generated_at: Utc::now(),
        version: PROFILE_VERSION.to_string(),
    }
}

fn analyze_allergy(record: &AllergyRecord) -> AnalyzedAllergy {
    let category = record.resolved_category();
    AnalyzedAllergy {
        label: record.label.clone(),
        severity: record.severity,
        category,
        common_names: common_names(&record.label),
        risk_score: risk_score(record.severity, category),
    }
}

/// Base 50, plus 30/15/5 by severity, plus 15 for nuts and shellfish; capped at 100.
pub fn risk_score(severity: RiskLevel, category: AllergenCategory) -> u32 {
    let by_severity = match severity {
        RiskLevel::High => 30,
        RiskLevel::Medium => 15,
        RiskLevel::Low => 5,
    };
    let by_category = match category {
        AllergenCategory::TreeNutsPeanuts | AllergenCategory::Shellfish => SEVERE_CATEGORY_BONUS,
        _ => 0,
    };
    (BASE_RISK_SCORE + by_severity + by_category).min(100)
}

fn overall_risk(allergies: &[AnalyzedAllergy]) -> RiskLevel {
    if allergies.is_empty() {
        return RiskLevel::Low;
    }
    let high_count = allergies.iter().filter(|a| a.severity == RiskLevel::High).count();
    let mean = allergies.iter().map(|a| a.risk_score as f64).sum::<f64>() / allergies.len() as f64;

    if high_count >= 2 || mean >= 75.0 {
        RiskLevel::High
    } else if high_count >= 1 || mean >= 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn common_names(label: &str) -> Vec<String> {
    let lower = label.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    let groups: [(bool, &[&str]); 9] = [
        (
            has("nut") && !has("peanut"),
            &["almonds", "walnuts", "cashews", "pistachios", "hazelnuts", "pecans", "brazil nuts", "macadamia nuts"],
        ),
        (has("peanut"), &["groundnuts", "goobers", "monkey nuts"]),
        (
            has("dairy") || has("lactose") || has("milk"),
            &["milk", "cheese", "yogurt", "butter", "cream", "whey", "casein", "lactose"],
        ),
        (
            has("gluten") || has("wheat"),
            &["wheat", "barley", "rye", "triticale", "semolina", "durum", "spelt", "kamut"],
        ),
        (
            has("shellfish"),
            &["shrimp", "prawns", "crab", "lobster", "crayfish", "mussels", "clams", "oysters", "scallops"],
        ),
        (
            has("fish") && !has("shellfish"),
            &["salmon", "tuna", "cod", "halibut", "mackerel", "sardines", "anchovies"],
        ),
        (has("egg"), &["chicken eggs", "duck eggs", "quail eggs", "albumin", "lecithin"]),
        (has("soy"), &["soybeans", "soya", "tofu", "tempeh", "miso", "edamame", "soy sauce"]),
        (has("sesame"), &["tahini", "sesame seeds", "sesame oil", "benne seeds"]),
    ];

    let mut names = vec![label.to_string()];
    for name in groups.iter().filter(|(hit, _)| *hit).flat_map(|(_, group)| group.iter()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn cross_reactivity(allergies: &[AnalyzedAllergy]) -> Vec<CrossReactivity> {
    let has_category = |c: AllergenCategory| allergies.iter().any(|a| a.category == c);
    let has_tree_nuts = has_category(AllergenCategory::TreeNutsPeanuts);
    let has_peanuts = allergies.iter().any(|a| a.label.to_lowercase().contains("peanut"));
    let mut notes = Vec::new();

    if has_tree_nuts {
        notes.push(CrossReactivity {
            kind: "tree_nuts".into(),
            message: "If allergic to one tree nut, you may be allergic to others. Consult an allergist before trying new tree nuts.".into(),
            related_allergens: to_strings(&["almonds", "walnuts", "cashews", "pistachios", "hazelnuts"]),
        });
    }
    if has_peanuts && has_tree_nuts {
        notes.push(CrossReactivity {
            kind: "peanut_tree_nut".into(),
            message: "Peanuts and tree nuts are different, but many people are allergic to both. Exercise caution.".into(),
            related_allergens: Vec::new(),
        });
    }
    if has_category(AllergenCategory::Shellfish) {
        notes.push(CrossReactivity {
            kind: "shellfish".into(),
            message: "If allergic to one type of shellfish, you may be allergic to others. Avoid all shellfish unless cleared by an allergist.".into(),
            related_allergens: to_strings(&["shrimp", "crab", "lobster", "mussels", "clams"]),
        });
    }
    if has_category(AllergenCategory::Fish) {
        notes.push(CrossReactivity {
            kind: "fish".into(),
            message: "Fish allergies can cross-react between species. Consult an allergist before trying new fish.".into(),
            related_allergens: Vec::new(),
        });
    }

    notes
}

fn guidance(
    allergies: &[AnalyzedAllergy],
    lookup: fn(AllergenCategory) -> &'static [&'static str],
) -> Vec<CategoryGuidance> {
    allergies
        .iter()
        .filter_map(|a| {
            let items = lookup(a.category);
            (!items.is_empty()).then(|| CategoryGuidance {
                allergen: a.label.clone(),
                category: a.category,
                items: to_strings(items),
            })
        })
        .collect()
}

fn hidden_sources(category: AllergenCategory) -> &'static [&'static str] {
    match category {
        AllergenCategory::TreeNutsPeanuts => &[
            "Baked goods (cookies, cakes, pastries)",
            "Candy and chocolate",
            "Cereals and granola",
            "Nut butters and spreads",
            "Salad dressings",
            "Asian cuisine (often uses peanut oil)",
            "Marzipan and nougat",
            "Some vegetarian meat substitutes",
        ],
        AllergenCategory::Dairy => &[
            "Baked goods",
            "Processed meats (may contain casein)",
            "Non-dairy creamers (may contain casein)",
            "Some medications and supplements",
            "Caramel coloring",
            "Lactose in some medications",
        ],
        AllergenCategory::Gluten => &[
            "Soy sauce",
            "Beer and malt beverages",
            "Processed foods (check labels)",
            "Some medications",
            "Soups and sauces (may use flour as thickener)",
            "Imitation seafood",
        ],
        AllergenCategory::Shellfish => &[
            "Fish stock and bouillon",
            "Surimi (imitation crab)",
            "Some Asian sauces",
            "Caesar salad dressing (may contain anchovies)",
            "Worcestershire sauce",
        ],
        AllergenCategory::Eggs => &[
            "Mayonnaise",
            "Marshmallows",
            "Pasta (some types)",
            "Foam on cocktails",
            "Some vaccines (consult doctor)",
            "Baked goods",
        ],
        AllergenCategory::Soy => &[
            "Vegetable oil (may contain soy)",
            "Lecithin (often from soy)",
            "Tofu and tempeh",
            "Soy sauce",
            "Many processed foods",
            "Some Asian cuisines",
        ],
        _ => &[],
    }
}

fn safe_alternatives(category: AllergenCategory) -> &'static [&'static str] {
    match category {
        AllergenCategory::Dairy => &[
            "Almond milk, coconut milk, oat milk, rice milk",
            "Dairy-free cheese alternatives",
            "Coconut yogurt or soy yogurt",
            "Plant-based butter (margarine, coconut oil)",
        ],
        AllergenCategory::Gluten => &[
            "Gluten-free grains: rice, quinoa, buckwheat, millet, amaranth",
            "Gluten-free flours: almond flour, coconut flour, rice flour",
            "Gluten-free pasta and bread",
        ],
        AllergenCategory::TreeNutsPeanuts => &[
            "Sunflower seed butter, pumpkin seed butter",
            "Sesame seeds and tahini (if not allergic)",
            "Coconut (if not allergic)",
            "Seeds: pumpkin, sunflower, chia, flax",
        ],
        AllergenCategory::Eggs => &[
            "Flax eggs (1 tbsp ground flax + 3 tbsp water)",
            "Applesauce or mashed banana in baking",
            "Commercial egg replacers",
            "Aquafaba (chickpea water) for meringues",
        ],
        AllergenCategory::Soy => &[
            "Other legumes: chickpeas, lentils, black beans",
            "Coconut aminos instead of soy sauce",
            "Other plant-based proteins",
        ],
        _ => &[],
    }
}

fn emergency_info(allergies: &[AnalyzedAllergy], risk_level: RiskLevel) -> EmergencyInfo {
    let needs_plan = risk_level == RiskLevel::High || allergies.iter().any(|a| a.severity == RiskLevel::High);
    let action_plan = needs_plan.then(|| ActionPlan {
        steps: to_strings(&[
            "If you experience symptoms (hives, swelling, difficulty breathing, dizziness), use epinephrine auto-injector immediately if prescribed",
            "Call emergency services (911) immediately",
            "Lie down with legs elevated if feeling faint",
            "Do not drive yourself to the hospital",
            "Inform medical personnel about your allergies",
        ]),
        medications: "Carry epinephrine auto-injector at all times if prescribed".into(),
        emergency_contacts: "Keep emergency contact information easily accessible".into(),
    });

    EmergencyInfo {
        has_action_plan: needs_plan,
        action_plan,
        risk_level,
    }
}

fn dietary_recommendations(
    allergies: &[AnalyzedAllergy],
    has_diabetes: bool,
) -> Vec<DietaryRecommendation> {
    let rec = |kind: &str, priority: RiskLevel, message: &str| DietaryRecommendation {
        kind: kind.to_string(),
        priority,
        message: message.to_string(),
    };
    let has_category = |c: AllergenCategory| allergies.iter().any(|a| a.category == c);

    let mut recs = vec![
        rec(
            "label_reading",
            RiskLevel::High,
            "Always read food labels carefully. Look for allergen warnings and ingredient lists.",
        ),
        rec(
            "restaurant_communication",
            RiskLevel::High,
            "Always inform restaurant staff about your allergies. Ask about ingredients and preparation methods.",
        ),
    ];
    if has_diabetes && !allergies.is_empty() {
        recs.push(rec(
            "diabetes_allergy_management",
            RiskLevel::High,
            "Managing both diabetes and allergies requires careful meal planning. Focus on whole, unprocessed foods when possible.",
        ));
    }
    if has_category(AllergenCategory::TreeNutsPeanuts) {
        recs.push(rec(
            "nut_allergy",
            RiskLevel::High,
            "Be cautious with baked goods, chocolates, and Asian cuisines. Many processed foods may contain traces of nuts.",
        ));
    }
    if has_category(AllergenCategory::Dairy) {
        recs.push(rec(
            "dairy_allergy",
            RiskLevel::Medium,
            "Check non-dairy products as they may still contain casein or whey. Look for \"dairy-free\" labels, not just \"lactose-free\".",
        ));
    }
    recs
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
