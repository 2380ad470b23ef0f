use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::engine::keywords::AllergenCategory;

/// Confidence assumed for entities the detector reported without a score.
pub const DEFAULT_ENTITY_CONFIDENCE: f32 = 0.8;

/// The 3-tier risk ordinal shared by every classifier (`low < medium < high`).
///
/// Allergy severities use the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Maximum tier of an iterator, `Low` when it is empty.
    pub fn max_of<I>(levels: I) -> RiskLevel
    where
        I: IntoIterator<Item = RiskLevel>,
    {
        levels.into_iter().max().unwrap_or(RiskLevel::Low)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn default_severity() -> RiskLevel {
    RiskLevel::Medium
}

fn default_confidence() -> f32 {
    DEFAULT_ENTITY_CONFIDENCE
}

/// What kind of scan produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Food,
    Medication,
}

/// A named item reported by the upstream vision/OCR detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedEntity {
    pub name: String,
    /// Detector confidence (0.0 - 1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub raw_attributes: Map<String, Value>,
}

impl DetectedEntity {
    pub fn food(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            source_type: SourceType::Food,
            raw_attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw_attributes.insert(key.into(), value.into());
        self
    }

    /// Lowercase text blob used for keyword containment tests.
    ///
    /// Only attribute values are included; attribute names never match.
    pub fn text_blob(&self) -> String {
        let mut blob = self.name.to_lowercase();
        for value in self.raw_attributes.values() {
            collect_leaves(value, &mut blob);
        }
        blob
    }
}

fn collect_leaves(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push(' ');
            out.push_str(&s.to_lowercase());
        }
        Value::Number(n) => {
            out.push(' ');
            out.push_str(&n.to_string());
        }
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

/// One entry of the user's allergy list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AllergyRecordRepr")]
pub struct AllergyRecord {
    pub label: String,
    pub category: Option<AllergenCategory>,
    pub severity: RiskLevel,
}

impl AllergyRecord {
    pub fn new(label: impl Into<String>, severity: RiskLevel) -> Self {
        Self {
            label: label.into(),
            category: None,
            severity,
        }
    }

    pub fn with_category(mut self, category: AllergenCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Explicit category if set, otherwise resolved from the label.
    pub fn resolved_category(&self) -> AllergenCategory {
        self.category
            .unwrap_or_else(|| AllergenCategory::from_label(&self.label))
    }
}

/// Profiles store allergies either as bare labels or as full records.
#[derive(Deserialize)]
#[serde(untagged)]
enum AllergyRecordRepr {
    Label(String),
    Full {
        label: String,
        #[serde(default)]
        category: Option<AllergenCategory>,
        #[serde(default = "default_severity")]
        severity: RiskLevel,
    },
}

impl From<AllergyRecordRepr> for AllergyRecord {
    fn from(repr: AllergyRecordRepr) -> Self {
        match repr {
            AllergyRecordRepr::Label(label) => AllergyRecord::new(label, default_severity()),
            AllergyRecordRepr::Full {
                label,
                category,
                severity,
            } => AllergyRecord {
                label,
                category,
                severity,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macronutrients {
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub calories: f64,
    #[serde(default)]
    pub macronutrients: Option<Macronutrients>,
}

/// The user's health profile as read from the profile-storage collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHealthProfile {
    #[serde(default)]
    pub diabetes_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<AllergyRecord>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub nutrition_profile: Option<NutritionProfile>,
    #[serde(default)]
    pub health_goals: Vec<String>,
}

impl UserHealthProfile {
    /// Diabetes type, treating blank strings as unset.
    pub fn diabetes_type(&self) -> Option<&str> {
        self.diabetes_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has_allergies(&self) -> bool {
        !self.allergies.is_empty()
    }

    /// Comma-joined allergy labels, in profile order.
    pub fn allergy_labels(&self) -> String {
        self.allergies
            .iter()
            .map(|a| a.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_risk_level_ordering_and_max() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(
            RiskLevel::max_of([RiskLevel::Low, RiskLevel::High, RiskLevel::Medium]),
            RiskLevel::High
        );
        assert_eq!(RiskLevel::max_of(Vec::new()), RiskLevel::Low);
    }

    #[test]
    fn test_allergy_record_accepts_bare_label() {
        let profile: UserHealthProfile = serde_json::from_value(json!({
            "allergies": ["Peanuts", {"label": "Milk", "severity": "high"}]
        }))
        .unwrap();

        assert_eq!(profile.allergies[0].label, "Peanuts");
        assert_eq!(profile.allergies[0].severity, RiskLevel::Medium);
        assert_eq!(profile.allergies[1].severity, RiskLevel::High);
        assert_eq!(profile.allergy_labels(), "Peanuts, Milk");
    }

    #[test]
    fn test_entity_defaults_confidence() {
        let entity: DetectedEntity = serde_json::from_value(json!({"name": "Bread"})).unwrap();
        assert_eq!(entity.confidence, DEFAULT_ENTITY_CONFIDENCE);
        assert_eq!(entity.source_type, SourceType::Food);
    }

    #[test]
    fn test_text_blob_skips_attribute_names() {
        let entity = DetectedEntity::food("Salad", 0.9)
            .with_attribute("nutrients", json!({"dressing": "Tahini"}))
            .with_attribute("calories", 320);

        let blob = entity.text_blob();
        assert!(blob.contains("salad"));
        assert!(blob.contains("tahini"));
        assert!(blob.contains("320"));
        assert!(!blob.contains("nutrients"));
    }

    #[test]
    fn test_blank_diabetes_type_is_unset() {
        let profile = UserHealthProfile {
            diabetes_type: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.diabetes_type(), None);
    }
}
