//! Category Keyword Tables.
//!
//! Curated synonym sets per allergen category and per query topic, in both
//! supported locales. Classifiers receive the table by `Arc` so tests can
//! inject a reduced table without touching classifier code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::locale::Language;

/// Canonical allergen grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergenCategory {
    TreeNutsPeanuts,
    Dairy,
    Gluten,
    Shellfish,
    Fish,
    Eggs,
    Soy,
    Sesame,
    Other,
}

impl AllergenCategory {
    pub const ALL: [AllergenCategory; 9] = [
        AllergenCategory::TreeNutsPeanuts,
        AllergenCategory::Dairy,
        AllergenCategory::Gluten,
        AllergenCategory::Shellfish,
        AllergenCategory::Fish,
        AllergenCategory::Eggs,
        AllergenCategory::Soy,
        AllergenCategory::Sesame,
        AllergenCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AllergenCategory::TreeNutsPeanuts => "tree_nuts_peanuts",
            AllergenCategory::Dairy => "dairy",
            AllergenCategory::Gluten => "gluten",
            AllergenCategory::Shellfish => "shellfish",
            AllergenCategory::Fish => "fish",
            AllergenCategory::Eggs => "eggs",
            AllergenCategory::Soy => "soy",
            AllergenCategory::Sesame => "sesame",
            AllergenCategory::Other => "other",
        }
    }

    /// Resolve a category from a free-text allergy label.
    ///
    /// Rules are checked in order; the first hit wins. "shellfish" is tested
    /// before "fish" so the substring overlap resolves correctly.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        LABEL_RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| label.contains(n)))
            .map(|(category, _)| *category)
            .unwrap_or(AllergenCategory::Other)
    }
}

impl fmt::Display for AllergenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

const LABEL_RULES: &[(AllergenCategory, &[&str])] = &[
    (AllergenCategory::TreeNutsPeanuts, &["nut", "peanut", "مكسرات", "فول سوداني", "لوز"]),
    (AllergenCategory::Dairy, &["dairy", "lactose", "milk", "حليب", "ألبان", "لاكتوز"]),
    (AllergenCategory::Gluten, &["gluten", "wheat", "جلوتين", "قمح"]),
    (
        AllergenCategory::Shellfish,
        &["shellfish", "shrimp", "prawn", "crab", "lobster", "مأكولات بحرية", "روبيان", "جمبري"],
    ),
    (AllergenCategory::Fish, &["fish", "سمك", "أسماك"]),
    (AllergenCategory::Eggs, &["egg", "بيض"]),
    (AllergenCategory::Soy, &["soy", "صويا"]),
    (AllergenCategory::Sesame, &["sesame", "سمسم"]),
];

/// Topical domains recognised in free-text queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTopic {
    Diabetes,
    Allergen,
    Meal,
    Exercise,
    Nutrition,
}

// --- English allergen keywords (include hidden sources and dish names) ---
const TREE_NUTS_EN: &[&str] = &[
    "nut", "almond", "walnut", "cashew", "pistachio", "hazelnut", "pecan", "brazil nut",
    "macadamia", "peanut", "groundnut", "peanut butter", "nut butter", "marzipan", "nougat",
    "praline", "nutella", "pesto", "satay", "pad thai",
];
const DAIRY_EN: &[&str] = &[
    "milk", "cheese", "yogurt", "yoghurt", "butter", "cream", "whey", "casein", "lactose",
    "dairy", "ghee", "buttermilk", "sour cream", "ice cream", "custard", "pudding",
    "chocolate", "mayonnaise", "ranch", "caesar",
];
const GLUTEN_EN: &[&str] = &[
    "wheat", "barley", "rye", "gluten", "flour", "bread", "pasta", "noodle", "cereal",
    "cracker", "biscuit", "cookie", "cake", "pastry", "beer", "soy sauce", "malt",
    "semolina", "durum", "spelt", "kamut", "triticale",
];
const SHELLFISH_EN: &[&str] = &[
    "shrimp", "prawn", "crab", "lobster", "crayfish", "mussel", "clam", "oyster",
    "scallop", "shellfish", "seafood", "surimi", "imitation crab",
];
const FISH_EN: &[&str] = &[
    "fish", "salmon", "tuna", "cod", "halibut", "mackerel", "sardine", "anchovy",
    "herring", "trout", "bass", "tilapia",
];
const EGGS_EN: &[&str] = &[
    "egg", "albumin", "albumen", "lecithin", "mayonnaise", "mousse", "meringue",
    "custard", "hollandaise", "béarnaise",
];
const SOY_EN: &[&str] = &[
    "soy", "soya", "tofu", "tempeh", "miso", "edamame", "soy sauce", "soybean",
    "textured vegetable protein", "tvp", "lecithin",
];
const SESAME_EN: &[&str] = &["sesame", "tahini", "sesame seed", "sesame oil", "benne", "simsim"];

// --- Arabic allergen keywords ---
const TREE_NUTS_AR: &[&str] = &[
    "مكسرات", "لوز", "جوز", "كاجو", "فستق", "بندق", "فول سوداني", "زبدة الفول السوداني", "نوتيلا",
];
const DAIRY_AR: &[&str] = &[
    "حليب", "جبن", "لبن", "زبادي", "زبدة", "قشطة", "كريمة", "مصل اللبن", "كازين", "لاكتوز",
    "سمن", "آيس كريم", "مهلبية",
];
const GLUTEN_AR: &[&str] = &[
    "قمح", "شعير", "جاودار", "جلوتين", "طحين", "دقيق", "خبز", "معكرونة", "شعيرية", "بسكويت",
    "كعك", "كيك", "برغل", "سميد", "فريكة",
];
const SHELLFISH_AR: &[&str] = &[
    "روبيان", "جمبري", "قريدس", "سلطعون", "كابوريا", "كركند", "استاكوزا", "بلح البحر", "محار",
    "مأكولات بحرية",
];
const FISH_AR: &[&str] = &["سمك", "أسماك", "سلمون", "تونة", "سردين", "أنشوجة", "هامور", "ماكريل"];
const EGGS_AR: &[&str] = &["بيض", "مايونيز", "ميرينغ"];
const SOY_AR: &[&str] = &["صويا", "توفو", "ميسو", "صلصة الصويا"];
const SESAME_AR: &[&str] = &["سمسم", "طحينة", "حلاوة طحينية"];

// --- Query topic keywords ---
const DIABETES_TOPIC_EN: &[&str] = &[
    "diabetes", "diabetic", "blood sugar", "glucose", "insulin", "carb", "carbohydrate",
    "sugar", "glycemic",
];
const DIABETES_TOPIC_AR: &[&str] = &["سكري", "سكر", "جلوكوز", "أنسولين", "كربوهيدرات", "مؤشر جلايسيمي"];
const ALLERGEN_TOPIC_EN: &[&str] = &[
    "allergy", "allergen", "nuts", "peanuts", "gluten", "dairy", "milk", "shellfish", "allergic",
];
const ALLERGEN_TOPIC_AR: &[&str] = &["حساسية", "مكسرات", "فول سوداني", "جلوتين", "ألبان", "حليب", "مأكولات بحرية"];
const MEAL_TOPIC_EN: &[&str] = &["meal", "food", "eat"];
const MEAL_TOPIC_AR: &[&str] = &["وجبة", "طعام", "أكل"];
const EXERCISE_TOPIC_EN: &[&str] = &["exercise", "workout", "activity"];
const EXERCISE_TOPIC_AR: &[&str] = &["تمرين", "نشاط"];
const NUTRITION_TOPIC_EN: &[&str] = &["nutrition", "calorie", "macro"];
const NUTRITION_TOPIC_AR: &[&str] = &["تغذية", "سعرات"];

static SHARED_TABLE: LazyLock<Arc<KeywordTable>> = LazyLock::new(|| Arc::new(KeywordTable::curated()));

/// Keyword sets keyed by category/topic and locale.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    allergens: HashMap<(AllergenCategory, Language), Vec<String>>,
    topics: HashMap<(QueryTopic, Language), Vec<String>>,
}

impl KeywordTable {
    /// A table with no entries, for building test fixtures.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The curated production table.
    pub fn curated() -> Self {
        let allergen_sets: [(AllergenCategory, &[&str], &[&str]); 8] = [
            (AllergenCategory::TreeNutsPeanuts, TREE_NUTS_EN, TREE_NUTS_AR),
            (AllergenCategory::Dairy, DAIRY_EN, DAIRY_AR),
            (AllergenCategory::Gluten, GLUTEN_EN, GLUTEN_AR),
            (AllergenCategory::Shellfish, SHELLFISH_EN, SHELLFISH_AR),
            (AllergenCategory::Fish, FISH_EN, FISH_AR),
            (AllergenCategory::Eggs, EGGS_EN, EGGS_AR),
            (AllergenCategory::Soy, SOY_EN, SOY_AR),
            (AllergenCategory::Sesame, SESAME_EN, SESAME_AR),
        ];
        let topic_sets: [(QueryTopic, &[&str], &[&str]); 5] = [
            (QueryTopic::Diabetes, DIABETES_TOPIC_EN, DIABETES_TOPIC_AR),
            (QueryTopic::Allergen, ALLERGEN_TOPIC_EN, ALLERGEN_TOPIC_AR),
            (QueryTopic::Meal, MEAL_TOPIC_EN, MEAL_TOPIC_AR),
            (QueryTopic::Exercise, EXERCISE_TOPIC_EN, EXERCISE_TOPIC_AR),
            (QueryTopic::Nutrition, NUTRITION_TOPIC_EN, NUTRITION_TOPIC_AR),
        ];

        let mut table = Self::empty();
        for (category, en, ar) in allergen_sets {
            table = table
                .with_allergen_keywords(category, Language::En, en)
                .with_allergen_keywords(category, Language::Ar, ar);
        }
        for (topic, en, ar) in topic_sets {
            table = table
                .with_topic_keywords(topic, Language::En, en)
                .with_topic_keywords(topic, Language::Ar, ar);
        }
        table
    }

    /// Process-wide handle to the curated table.
    pub fn shared() -> Arc<KeywordTable> {
        Arc::clone(&SHARED_TABLE)
    }

    pub fn with_allergen_keywords(
        mut self,
        category: AllergenCategory,
        language: Language,
        keywords: &[&str],
    ) -> Self {
        self.allergens
            .insert((category, language), normalize(keywords));
        self
    }

    pub fn with_topic_keywords(
        mut self,
        topic: QueryTopic,
        language: Language,
        keywords: &[&str],
    ) -> Self {
        self.topics.insert((topic, language), normalize(keywords));
        self
    }

    pub fn allergen_keywords(&self, category: AllergenCategory, language: Language) -> &[String] {
        self.allergens
            .get(&(category, language))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn topic_keywords(&self, topic: QueryTopic, language: Language) -> &[String] {
        self.topics
            .get(&(topic, language))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First keyword of `category` (any locale) contained in `text`.
    ///
    /// `text` must already be lowercase. Categories without curated keywords
    /// (e.g. `Other`) fall back to the allergy label itself.
    pub fn find_allergen<'a>(
        &'a self,
        category: AllergenCategory,
        fallback_label: &'a str,
        text: &str,
    ) -> Option<&'a str> {
        let has_entries = [Language::En, Language::Ar]
            .iter()
            .any(|lang| !self.allergen_keywords(category, *lang).is_empty());

        if !has_entries {
            return (!fallback_label.is_empty() && text.contains(fallback_label)).then_some(fallback_label);
        }

        [Language::En, Language::Ar]
            .iter()
            .flat_map(|lang| self.allergen_keywords(category, *lang))
            .find(|keyword| text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// Whether `text` mentions `topic` in the given locale only.
    pub fn mentions_topic(&self, topic: QueryTopic, language: Language, text: &str) -> bool {
        let text = text.to_lowercase();
        self.topic_keywords(topic, language)
            .iter()
            .any(|k| text.contains(k.as_str()))
    }

    /// Whether `text` mentions `topic` in either locale.
    pub fn mentions_topic_any_locale(&self, topic: QueryTopic, text: &str) -> bool {
        self.mentions_topic(topic, Language::En, text) || self.mentions_topic(topic, Language::Ar, text)
    }
}

fn normalize(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label() {
        assert_eq!(AllergenCategory::from_label("Peanuts"), AllergenCategory::TreeNutsPeanuts);
        assert_eq!(AllergenCategory::from_label("Tree nuts"), AllergenCategory::TreeNutsPeanuts);
        assert_eq!(AllergenCategory::from_label("Lactose intolerance"), AllergenCategory::Dairy);
        assert_eq!(AllergenCategory::from_label("Wheat"), AllergenCategory::Gluten);
        assert_eq!(AllergenCategory::from_label("Shellfish"), AllergenCategory::Shellfish);
        assert_eq!(AllergenCategory::from_label("Fish"), AllergenCategory::Fish);
        assert_eq!(AllergenCategory::from_label("Eggs"), AllergenCategory::Eggs);
        assert_eq!(AllergenCategory::from_label("Soy"), AllergenCategory::Soy);
        assert_eq!(AllergenCategory::from_label("Sesame"), AllergenCategory::Sesame);
        assert_eq!(AllergenCategory::from_label("Penicillin"), AllergenCategory::Other);
    }

    #[test]
    fn test_category_from_arabic_label() {
        assert_eq!(AllergenCategory::from_label("حليب"), AllergenCategory::Dairy);
        assert_eq!(AllergenCategory::from_label("سمسم"), AllergenCategory::Sesame);
        assert_eq!(AllergenCategory::from_label("مأكولات بحرية"), AllergenCategory::Shellfish);
    }

    #[test]
    fn test_curated_table_has_both_locales() {
        let table = KeywordTable::curated();
        for category in AllergenCategory::ALL {
            if category == AllergenCategory::Other {
                continue;
            }
            assert!(!table.allergen_keywords(category, Language::En).is_empty(), "{category}");
            assert!(!table.allergen_keywords(category, Language::Ar).is_empty(), "{category}");
        }
    }

    #[test]
    fn test_find_allergen_hidden_source() {
        let table = KeywordTable::curated();
        assert_eq!(
            table.find_allergen(AllergenCategory::TreeNutsPeanuts, "peanuts", "chicken satay skewers"),
            Some("satay")
        );
        assert_eq!(
            table.find_allergen(AllergenCategory::Sesame, "sesame", "حمص بالطحينة"),
            Some("طحينة")
        );
        assert_eq!(table.find_allergen(AllergenCategory::Fish, "fish", "green salad"), None);
    }

    #[test]
    fn test_other_category_uses_label() {
        let table = KeywordTable::curated();
        assert_eq!(
            table.find_allergen(AllergenCategory::Other, "kiwi", "kiwi smoothie"),
            Some("kiwi")
        );
        assert_eq!(table.find_allergen(AllergenCategory::Other, "kiwi", "mango"), None);
    }

    #[test]
    fn test_injected_table_isolated_from_curated() {
        let table = KeywordTable::empty().with_allergen_keywords(
            AllergenCategory::Dairy,
            Language::En,
            &["Labneh"],
        );
        assert_eq!(
            table.find_allergen(AllergenCategory::Dairy, "dairy", "labneh wrap"),
            Some("labneh")
        );
        assert_eq!(table.find_allergen(AllergenCategory::Dairy, "dairy", "cheese"), None);
    }

    #[test]
    fn test_topic_matching_per_locale() {
        let table = KeywordTable::curated();
        assert!(table.mentions_topic(QueryTopic::Diabetes, Language::En, "My Blood Sugar is high"));
        assert!(!table.mentions_topic(QueryTopic::Diabetes, Language::Ar, "My Blood Sugar is high"));
        assert!(table.mentions_topic(QueryTopic::Diabetes, Language::Ar, "كيف أتحكم في السكري"));
        assert!(table.mentions_topic_any_locale(QueryTopic::Meal, "ماذا آكل في وجبة الغداء"));
    }
}
