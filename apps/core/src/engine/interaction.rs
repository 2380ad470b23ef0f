//! Interaction Classifier.
//!
//! Looks an identified medication up in a curated drug table, checks it
//! against the user's profile (dietary restrictions, diabetes type, allergies)
//! and scores everything with a weighted sum that is thresholded onto the
//! 3-tier scale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use super::assessment::{Finding, RiskAssessment, Warning, WarningKind};
use super::locale::Language;
use super::templates::{TemplateId, TemplateTable};
use crate::models::{RiskLevel, UserHealthProfile};

// Scoring constants. These are hand-authored business rules carried over
// unchanged; they have not been validated against clinical guidance and are
// pending review by a domain expert.
pub const WEIGHT_CONTRAINDICATION: u32 = 4;
pub const WEIGHT_MAJOR: u32 = 3;
pub const WEIGHT_MODERATE: u32 = 2;
pub const WEIGHT_MINOR: u32 = 1;
pub const HIGH_RISK_SCORE: u32 = 6;
pub const MEDIUM_RISK_SCORE: u32 = 3;

/// Fine-grained interaction severity. Mapped onto [`RiskLevel`] only when
/// aggregating; the four-way class is kept on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    Minor,
    Moderate,
    Major,
    Contraindication,
}

impl InteractionSeverity {
    pub fn weight(&self) -> u32 {
        match self {
            InteractionSeverity::Minor => WEIGHT_MINOR,
            InteractionSeverity::Moderate => WEIGHT_MODERATE,
            InteractionSeverity::Major => WEIGHT_MAJOR,
            InteractionSeverity::Contraindication => WEIGHT_CONTRAINDICATION,
        }
    }

    /// Tier used for display and per-finding aggregation.
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            InteractionSeverity::Minor => RiskLevel::Low,
            InteractionSeverity::Moderate => RiskLevel::Medium,
            InteractionSeverity::Major | InteractionSeverity::Contraindication => RiskLevel::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InteractionSeverity::Minor => "minor",
            InteractionSeverity::Moderate => "moderate",
            InteractionSeverity::Major => "major",
            InteractionSeverity::Contraindication => "contraindication",
        }
    }
}

impl fmt::Display for InteractionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a weighted score onto the 3-tier scale (`>= 6` high, `>= 3` medium).
pub fn score_to_risk(score: u32) -> RiskLevel {
    if score >= HIGH_RISK_SCORE {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_SCORE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Weighted sum over interaction findings and dosage warnings.
///
/// Dosage warnings count at least as much as a moderate interaction.
pub fn risk_score(interactions: &[InteractionMatch], dosage_warnings: &[DosageWarning]) -> u32 {
    let from_interactions: u32 = interactions.iter().map(|i| i.severity_class.weight()).sum();
    let from_warnings: u32 = dosage_warnings
        .iter()
        .map(|w| w.severity.weight().max(WEIGHT_MODERATE))
        .sum();
    from_interactions + from_warnings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    DrugDrug,
    DrugFood,
    DrugCondition,
    /// Food-drug interaction triggered by the user's dietary profile
    FoodDrug,
    /// Medication conflicts with a recorded allergy
    AllergyDrug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMatch {
    pub interacting_agent: String,
    pub kind: InteractionKind,
    pub severity_class: InteractionSeverity,
    pub description: String,
    pub mechanism: String,
    pub recommendation: String,
}

impl InteractionMatch {
    pub fn new(
        kind: InteractionKind,
        severity_class: InteractionSeverity,
        interacting_agent: impl Into<String>,
        description: impl Into<String>,
        mechanism: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            interacting_agent: interacting_agent.into(),
            kind,
            severity_class,
            description: description.into(),
            mechanism: mechanism.into(),
            recommendation: recommendation.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectProfile {
    pub common: Vec<String>,
    pub serious: Vec<String>,
    pub frequency: String,
    pub monitoring: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosageInfo {
    pub adult: String,
    pub elderly: String,
    pub renal: String,
    pub hepatic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosageCondition {
    Renal,
    Hepatic,
    Pregnancy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosageWarning {
    pub condition: DosageCondition,
    pub severity: InteractionSeverity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

impl DosageWarning {
    fn new(
        condition: DosageCondition,
        severity: InteractionSeverity,
        title: &str,
        description: &str,
        recommendation: &str,
    ) -> Self {
        Self {
            condition,
            severity,
            title: title.to_string(),
            description: description.to_string(),
            recommendation: recommendation.to_string(),
        }
    }
}

/// Curated knowledge about one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugRecord {
    /// Lowercase lookup key (the generic ingredient)
    pub key: String,
    pub name: String,
    pub generic_name: String,
    pub brand_names: Vec<String>,
    pub classification: String,
    pub indication: String,
    pub dosage: DosageInfo,
    pub interactions: Vec<InteractionMatch>,
    pub side_effects: SideEffectProfile,
}

impl DrugRecord {
    /// Stand-in for a medication missing from the table.
    ///
    /// Carries no curated interactions; callers see `is_fallback = true` on the report.
    pub fn generic(name: &str) -> Self {
        Self {
            key: name.trim().to_lowercase(),
            name: name.trim().to_string(),
            generic_name: name.trim().to_string(),
            brand_names: Vec::new(),
            classification: "Unclassified".to_string(),
            indication: String::new(),
            dosage: DosageInfo::default(),
            interactions: Vec::new(),
            side_effects: SideEffectProfile {
                common: Vec::new(),
                serious: Vec::new(),
                frequency: "No curated side-effect data for this medication".to_string(),
                monitoring: "Follow the package insert and your pharmacist's advice".to_string(),
            },
        }
    }
}

/// An identified medication as handed over by the scanner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationQuery {
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
}

impl MedicationQuery {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Lowercase name strings searched for ingredient keys.
    fn haystacks(&self) -> Vec<String> {
        std::iter::once(self.name.as_str())
            .chain(self.generic_name.as_deref())
            .map(str::to_lowercase)
            .filter(|s| !s.trim().is_empty())
            .collect()
    }
}

fn mentions(haystacks: &[String], needle: &str) -> bool {
    haystacks.iter().any(|h| h.contains(needle))
}

/// Injectable drug table keyed by generic ingredient.
#[derive(Debug, Clone, Default)]
pub struct DrugTable {
    records: Vec<DrugRecord>,
}

static SHARED_DRUGS: LazyLock<Arc<DrugTable>> = LazyLock::new(|| Arc::new(DrugTable::curated()));

impl DrugTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<DrugTable> {
        Arc::clone(&SHARED_DRUGS)
    }

    pub fn with_record(mut self, record: DrugRecord) -> Self {
        self.records.push(record);
        self
    }

    /// First record whose key appears in the medication's name or generic name.
    pub fn lookup(&self, medication: &MedicationQuery) -> Option<&DrugRecord> {
        let haystacks = medication.haystacks();
        self.records.iter().find(|r| mentions(&haystacks, &r.key))
    }

    pub fn curated() -> Self {
        use InteractionKind::*;
        use InteractionSeverity::*;

        let lisinopril = DrugRecord {
            key: "lisinopril".into(),
            name: "Lisinopril 10mg".into(),
            generic_name: "Lisinopril".into(),
            brand_names: strings(&["Prinivil", "Zestril", "Qbrelis"]),
            classification: "ACE Inhibitor".into(),
            indication: "Hypertension, Heart Failure, Acute Myocardial Infarction".into(),
            dosage: DosageInfo {
                adult: "10-40mg once daily".into(),
                elderly: "Start with 5mg once daily".into(),
                renal: "Reduce dose if CrCl < 30 mL/min".into(),
                hepatic: "No adjustment needed".into(),
            },
            interactions: vec![
                InteractionMatch::new(
                    DrugDrug,
                    Major,
                    "Potassium Supplements",
                    "Increased risk of hyperkalemia (high potassium levels). Monitor potassium levels closely.",
                    "Both drugs increase potassium levels",
                    "Avoid concurrent use. If necessary, monitor serum potassium weekly.",
                ),
                InteractionMatch::new(
                    DrugDrug,
                    Major,
                    "Lithium",
                    "ACE inhibitors may increase lithium levels, leading to lithium toxicity.",
                    "ACE inhibitors reduce lithium excretion",
                    "Monitor lithium levels closely. Consider dose reduction.",
                ),
                InteractionMatch::new(
                    DrugFood,
                    Moderate,
                    "Salt Substitutes (KCl)",
                    "Salt substitutes containing potassium may increase hyperkalemia risk.",
                    "Additive potassium effects",
                    "Limit use of potassium-containing salt substitutes.",
                ),
                InteractionMatch::new(
                    DrugCondition,
                    Contraindication,
                    "Angioedema History",
                    "Absolute contraindication in patients with history of ACE inhibitor-induced angioedema.",
                    "Genetic predisposition to bradykinin accumulation",
                    "Do not use. Consider ARB alternative.",
                ),
            ],
            side_effects: SideEffectProfile {
                common: strings(&[
                    "Dry cough (10-15%)",
                    "Dizziness (5-8%)",
                    "Headache (3-5%)",
                    "Fatigue (2-4%)",
                    "Nausea (2-3%)",
                ]),
                serious: strings(&[
                    "Angioedema (0.1-0.3%)",
                    "Hyperkalemia (2-5%)",
                    "Kidney dysfunction (1-2%)",
                    "Severe hypotension (0.5-1%)",
                ]),
                frequency: "Common side effects occur in >1% of patients".into(),
                monitoring: "Monitor potassium, creatinine, blood pressure".into(),
            },
        };

        let metformin = DrugRecord {
            key: "metformin".into(),
            name: "Metformin HCL 500mg".into(),
            generic_name: "Metformin Hydrochloride".into(),
            brand_names: strings(&["Glucophage", "Fortamet", "Glumetza", "Riomet"]),
            classification: "Biguanide Antidiabetic".into(),
            indication: "Type 2 Diabetes Mellitus, Polycystic Ovary Syndrome".into(),
            dosage: DosageInfo {
                adult: "500-2550mg daily in divided doses".into(),
                elderly: "Start with 500mg once daily".into(),
                renal: "Contraindicated if eGFR < 30 mL/min".into(),
                hepatic: "Use with caution".into(),
            },
            interactions: vec![
                InteractionMatch::new(
                    DrugDrug,
                    Moderate,
                    "Iodinated Contrast Media",
                    "Risk of lactic acidosis due to contrast-induced nephropathy.",
                    "Contrast media can cause acute kidney injury",
                    "Discontinue 48 hours before contrast procedure. Resume after kidney function confirmed normal.",
                ),
                InteractionMatch::new(
                    DrugDrug,
                    Moderate,
                    "Alcohol",
                    "Alcohol may potentiate metformin effect on lactate metabolism.",
                    "Both can increase lactate production",
                    "Limit alcohol consumption. Avoid excessive or chronic alcohol use.",
                ),
                InteractionMatch::new(
                    DrugCondition,
                    Contraindication,
                    "Severe Kidney Disease (eGFR < 30)",
                    "Risk of lactic acidosis in patients with severe renal impairment.",
                    "Reduced drug clearance leads to accumulation",
                    "Contraindicated. Use insulin therapy instead.",
                ),
            ],
            side_effects: SideEffectProfile {
                common: strings(&[
                    "Nausea (25-30%)",
                    "Diarrhea (20-25%)",
                    "Stomach upset (15-20%)",
                    "Metallic taste (5-10%)",
                    "Loss of appetite (5-8%)",
                ]),
                serious: strings(&[
                    "Lactic acidosis (0.01-0.03%)",
                    "Severe kidney problems (rare)",
                    "Liver problems (rare)",
                    "Low blood sugar (when combined with other diabetes medications)",
                ]),
                frequency: "Gastrointestinal side effects are very common, especially at start".into(),
                monitoring: "Monitor kidney function, liver function, blood glucose".into(),
            },
        };

        let atorvastatin = DrugRecord {
            key: "atorvastatin".into(),
            name: "Atorvastatin Calcium 20mg".into(),
            generic_name: "Atorvastatin Calcium".into(),
            brand_names: strings(&["Lipitor", "Caduet", "Atorvaliq"]),
            classification: "HMG-CoA Reductase Inhibitor (Statin)".into(),
            indication: "Hypercholesterolemia, Cardiovascular Disease Prevention".into(),
            dosage: DosageInfo {
                adult: "10-80mg once daily".into(),
                elderly: "No adjustment needed".into(),
                renal: "No adjustment needed".into(),
                hepatic: "Contraindicated in active liver disease".into(),
            },
            interactions: vec![
                InteractionMatch::new(
                    DrugDrug,
                    Major,
                    "Grapefruit Juice",
                    "Grapefruit juice can increase atorvastatin levels by inhibiting CYP3A4 metabolism.",
                    "CYP3A4 inhibition",
                    "Avoid grapefruit juice. Limit to 1 cup daily if necessary.",
                ),
                InteractionMatch::new(
                    DrugDrug,
                    Moderate,
                    "Amiodarone",
                    "Increased risk of myopathy and rhabdomyolysis.",
                    "CYP3A4 inhibition",
                    "Monitor for muscle symptoms. Consider dose reduction.",
                ),
            ],
            side_effects: SideEffectProfile {
                common: strings(&[
                    "Muscle pain (5-10%)",
                    "Joint pain (3-5%)",
                    "Headache (2-4%)",
                    "Nausea (2-3%)",
                    "Constipation (2-3%)",
                ]),
                serious: strings(&[
                    "Rhabdomyolysis (0.01-0.1%)",
                    "Liver problems (0.5-1%)",
                    "Memory problems (rare)",
                    "Diabetes risk increase (0.1-0.3%)",
                ]),
                frequency: "Muscle symptoms are common, especially at higher doses".into(),
                monitoring: "Monitor liver function, muscle symptoms, blood glucose".into(),
            },
        };

        Self::empty()
            .with_record(lisinopril)
            .with_record(metformin)
            .with_record(atorvastatin)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Dosage warnings implied by a record's dosage notes and classification.
pub fn derive_dosage_warnings(record: &DrugRecord) -> Vec<DosageWarning> {
    use DosageCondition::*;
    use InteractionSeverity::*;

    let renal = record.dosage.renal.to_lowercase();
    let hepatic = record.dosage.hepatic.to_lowercase();
    let mut warnings = Vec::new();

    if renal.contains("contraindicated") {
        warnings.push(DosageWarning::new(
            Renal,
            Contraindication,
            "Renal Contraindication",
            "Not for use in patients with severe kidney impairment.",
            "Confirm kidney function before starting this medication.",
        ));
    } else if renal.contains("reduce") {
        warnings.push(DosageWarning::new(
            Renal,
            Major,
            "Renal Impairment Warning",
            "Dosage adjustment required for patients with kidney problems.",
            "Monitor kidney function and adjust dose accordingly.",
        ));
    }

    if hepatic.contains("contraindicated") {
        warnings.push(DosageWarning::new(
            Hepatic,
            Contraindication,
            "Hepatic Contraindication",
            "Not for use in patients with active liver disease.",
            "Check liver function tests before starting and during treatment.",
        ));
    } else if hepatic.contains("caution") {
        warnings.push(DosageWarning::new(
            Hepatic,
            Moderate,
            "Liver Function Warning",
            "Use with caution in patients with liver problems.",
            "Monitor liver function tests regularly.",
        ));
    }

    if record.classification.to_lowercase().contains("ace inhibitor") {
        warnings.push(DosageWarning::new(
            Pregnancy,
            Contraindication,
            "Pregnancy Warning",
            "ACE inhibitors can cause birth defects and should not be used during pregnancy.",
            "Use effective contraception. Discontinue if pregnancy occurs.",
        ));
    }

    warnings
}

struct FoodDrugRule {
    drug: &'static str,
    food: &'static str,
    restriction: &'static str,
    severity: InteractionSeverity,
    message: &'static str,
    recommendation: &'static str,
}

const FOOD_DRUG_RULES: &[FoodDrugRule] = &[
    FoodDrugRule {
        drug: "warfarin",
        food: "vitamin k",
        restriction: "high_vitamin_k",
        severity: InteractionSeverity::Major,
        message: "Warfarin interacts with Vitamin K. Maintain consistent intake of Vitamin K-rich foods (leafy greens, broccoli).",
        recommendation: "Keep your intake of Vitamin K-rich foods consistent. Sudden changes can affect medication effectiveness.",
    },
    FoodDrugRule {
        drug: "warfarin",
        food: "alcohol",
        restriction: "alcohol",
        severity: InteractionSeverity::Moderate,
        message: "Alcohol can increase the risk of bleeding when taking Warfarin.",
        recommendation: "Limit or avoid alcohol consumption while on Warfarin.",
    },
    FoodDrugRule {
        drug: "maoi",
        food: "tyramine",
        restriction: "high_tyramine",
        severity: InteractionSeverity::Major,
        message: "MAOIs interact with tyramine-rich foods. Can cause dangerous blood pressure spikes.",
        recommendation: "Avoid aged cheeses, cured meats, fermented foods, and certain alcoholic beverages.",
    },
    FoodDrugRule {
        drug: "grapefruit",
        food: "grapefruit",
        restriction: "grapefruit",
        severity: InteractionSeverity::Major,
        message: "Grapefruit can interact with many medications, increasing their effects.",
        recommendation: "Avoid grapefruit and grapefruit juice while taking this medication.",
    },
    FoodDrugRule {
        drug: "metformin",
        food: "alcohol",
        restriction: "alcohol",
        severity: InteractionSeverity::Major,
        message: "Alcohol can increase the risk of lactic acidosis when taking Metformin.",
        recommendation: "Avoid excessive alcohol consumption. Consult your doctor about safe alcohol limits.",
    },
    FoodDrugRule {
        drug: "insulin",
        food: "carbohydrates",
        restriction: "carb_management",
        severity: InteractionSeverity::Moderate,
        message: "Insulin requires careful carbohydrate management.",
        recommendation: "Monitor blood glucose levels and adjust insulin based on carbohydrate intake.",
    },
];

const GRAPEFRUIT_SENSITIVE: &[&str] = &[
    "atorvastatin", "simvastatin", "lovastatin", "felodipine", "nifedipine", "cyclosporine",
    "tacrolimus", "buspirone", "sertraline", "carbamazepine",
];

struct AllergyDrugRule {
    drug: &'static str,
    allergy_terms: &'static [&'static str],
    severity: InteractionSeverity,
    message: &'static str,
    recommendation: &'static str,
}

const ALLERGY_DRUG_RULES: &[AllergyDrugRule] = &[
    AllergyDrugRule {
        drug: "penicillin",
        allergy_terms: &["penicillin", "antibiotic"],
        severity: InteractionSeverity::Contraindication,
        message: "Penicillin allergy detected. This medication contains penicillin or related compounds.",
        recommendation: "DO NOT TAKE. Inform your doctor immediately about your penicillin allergy.",
    },
    AllergyDrugRule {
        drug: "sulfa",
        allergy_terms: &["sulfa", "sulfonamide"],
        severity: InteractionSeverity::Contraindication,
        message: "Sulfa allergy detected. This medication contains sulfonamides.",
        recommendation: "DO NOT TAKE. Inform your doctor about your sulfa allergy.",
    },
    AllergyDrugRule {
        drug: "aspirin",
        allergy_terms: &["aspirin", "nsaid", "ibuprofen"],
        severity: InteractionSeverity::Contraindication,
        message: "Aspirin/NSAID allergy detected. This medication contains aspirin or NSAIDs.",
        recommendation: "DO NOT TAKE. Use alternative pain relief medications.",
    },
    AllergyDrugRule {
        drug: "iodine",
        allergy_terms: &["iodine", "contrast"],
        severity: InteractionSeverity::Moderate,
        message: "Iodine allergy detected. This medication may contain iodine.",
        recommendation: "Consult your doctor before taking. Alternative medications may be available.",
    },
];

const CEPHALOSPORINS: &[&str] = &["cef", "cephalexin", "ceftriaxone", "cefuroxime"];

/// Food-drug interactions that apply given the user's dietary profile.
///
/// Alcohol rules always apply, carbohydrate management only with a diabetes
/// type, everything else only when a dietary restriction names it.
pub fn check_food_drug(haystacks: &[String], profile: &UserHealthProfile) -> Vec<InteractionMatch> {
    let restrictions: Vec<String> = profile
        .dietary_restrictions
        .iter()
        .map(|r| r.to_lowercase())
        .collect();

    let mut found: Vec<InteractionMatch> = FOOD_DRUG_RULES
        .iter()
        .filter(|rule| mentions(haystacks, rule.drug))
        .filter(|rule| {
            if rule.restriction == "carb_management" {
                return profile.diabetes_type().is_some();
            }
            rule.restriction == "alcohol"
                || restrictions
                    .iter()
                    .any(|r| r.contains(rule.restriction) || r.contains(rule.food))
        })
        .map(|rule| {
            InteractionMatch::new(
                InteractionKind::FoodDrug,
                rule.severity,
                rule.food,
                rule.message,
                "Dietary interaction",
                rule.recommendation,
            )
        })
        .collect();

    if GRAPEFRUIT_SENSITIVE.iter().any(|d| mentions(haystacks, d)) {
        found.push(InteractionMatch::new(
            InteractionKind::FoodDrug,
            InteractionSeverity::Major,
            "grapefruit",
            "This medication interacts with grapefruit. Can increase medication levels in blood.",
            "CYP3A4 inhibition",
            "Avoid grapefruit and grapefruit juice while taking this medication.",
        ));
    }

    found
}

/// Conflicts between the medication and the user's recorded allergies.
pub fn check_allergy_drug(
    haystacks: &[String],
    profile: &UserHealthProfile,
) -> Vec<InteractionMatch> {
    let mut found = Vec::new();

    for allergy in &profile.allergies {
        let label = allergy.label.to_lowercase();

        for rule in ALLERGY_DRUG_RULES {
            let allergic = rule.allergy_terms.iter().any(|t| label.contains(t));
            if allergic && mentions(haystacks, rule.drug) {
                found.push(InteractionMatch::new(
                    InteractionKind::AllergyDrug,
                    rule.severity,
                    allergy.label.clone(),
                    rule.message,
                    "Drug allergy",
                    rule.recommendation,
                ));
            }
        }

        if label.contains("penicillin") && CEPHALOSPORINS.iter().any(|c| mentions(haystacks, c)) {
            found.push(InteractionMatch::new(
                InteractionKind::AllergyDrug,
                InteractionSeverity::Moderate,
                allergy.label.clone(),
                "Penicillin allergy detected. Cephalosporins may cross-react with penicillin.",
                "Cross-reactivity",
                "Consult your doctor. Cephalosporins may cause allergic reactions in penicillin-allergic patients.",
            ));
        }
    }

    found
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedRecommendation {
    pub priority: RiskLevel,
    pub message: String,
}

/// Full medication analysis handed to the scan-result screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReport {
    pub medication: String,
    pub generic_name: String,
    pub classification: String,
    pub brand_names: Vec<String>,
    /// True when the drug was not in the table and a generic record was used
    pub is_fallback: bool,
    pub risk_score: u32,
    pub assessment: RiskAssessment,
    pub side_effects: SideEffectProfile,
    pub dosage_warnings: Vec<DosageWarning>,
    pub recommendations: Vec<PrioritizedRecommendation>,
}

#[derive(Debug, Clone)]
pub struct InteractionClassifier {
    drugs: Arc<DrugTable>,
    templates: Arc<TemplateTable>,
}

impl Default for InteractionClassifier {
    fn default() -> Self {
        Self::new(DrugTable::shared(), TemplateTable::shared())
    }
}

impl InteractionClassifier {
    pub fn new(drugs: Arc<DrugTable>, templates: Arc<TemplateTable>) -> Self {
        Self { drugs, templates }
    }

    pub fn analyze(
        &self,
        medication: &MedicationQuery,
        profile: &UserHealthProfile,
        language: Language,
    ) -> InteractionReport {
        let (record, is_fallback) = match self.drugs.lookup(medication) {
            Some(record) => (record.clone(), false),
            None => {
                warn!(medication = %medication.name, "Medication not in drug table, using generic record");
                let mut generic = DrugRecord::generic(&medication.name);
                if let Some(classification) = &medication.classification {
                    generic.classification = classification.clone();
                }
                (generic, true)
            }
        };

        let mut haystacks = medication.haystacks();
        haystacks.push(record.key.clone());
        haystacks.push(record.generic_name.to_lowercase());

        let mut interactions = record.interactions.clone();
        interactions.extend(check_food_drug(&haystacks, profile));
        interactions.extend(check_allergy_drug(&haystacks, profile));

        let dosage_warnings = derive_dosage_warnings(&record);

        let risk_score = risk_score(&interactions, &dosage_warnings);
        // The weighted tier never sits below the worst single finding.
        let worst_finding =
            RiskLevel::max_of(interactions.iter().map(|i| i.severity_class.risk_level()));
        let overall_risk = score_to_risk(risk_score).max(worst_finding);
        debug!(
            medication = %record.name,
            interactions = interactions.len(),
            dosage_warnings = dosage_warnings.len(),
            risk_score,
            "Interaction score computed"
        );

        let recommendations = self.recommendations_for(overall_risk, language);
        let mut warnings = self.interaction_warnings(&interactions, language);
        warnings.extend(dosage_warnings.iter().map(|w| self.dosage_warning(w, language)));
        warnings.sort_by(|a, b| b.severity.cmp(&a.severity));

        let has_findings = !interactions.is_empty();
        let mut assessment = RiskAssessment {
            has_findings,
            findings: interactions.into_iter().map(Finding::Interaction).collect(),
            overall_risk,
            recommendation_text: recommendations
                .first()
                .map(|r| r.message.clone())
                .unwrap_or_default(),
            warnings,
            message: None,
            safe_to_eat: !has_findings,
        };
        if is_fallback {
            assessment.message = Some(self.templates.get(TemplateId::UnknownMedication, language).to_string());
        }

        info!(
            medication = %record.name,
            is_fallback,
            risk_score,
            overall_risk = %overall_risk,
            "Interaction analysis complete"
        );

        InteractionReport {
            medication: record.name,
            generic_name: record.generic_name,
            classification: record.classification,
            brand_names: record.brand_names,
            is_fallback,
            risk_score,
            assessment,
            side_effects: record.side_effects,
            dosage_warnings,
            recommendations,
        }
    }

    fn recommendations_for(
        &self,
        risk: RiskLevel,
        language: Language,
    ) -> Vec<PrioritizedRecommendation> {
        let ids: &[TemplateId] = match risk {
            RiskLevel::High => &[TemplateId::InteractionAdviceHigh],
            RiskLevel::Medium => &[TemplateId::InteractionAdviceConsult, TemplateId::InteractionAdviceReview],
            RiskLevel::Low => &[TemplateId::InteractionAdviceLow],
        };
        ids.iter()
            .map(|id| PrioritizedRecommendation {
                priority: risk,
                message: self.templates.get(*id, language).to_string(),
            })
            .collect()
    }

    fn interaction_warnings(
        &self,
        interactions: &[InteractionMatch],
        language: Language,
    ) -> Vec<Warning> {
        interactions
            .iter()
            .filter(|i| i.severity_class >= InteractionSeverity::Moderate)
            .map(|i| {
                let severity = i.severity_class.risk_level();
                let (kind, title) = match (i.kind, severity) {
                    (_, RiskLevel::Medium) => (
                        warning_kind(i.kind),
                        self.templates.get(TemplateId::InteractionTitleCaution, language).to_string(),
                    ),
                    (InteractionKind::AllergyDrug, _) => (
                        WarningKind::AllergyDrug,
                        self.templates
                            .get(TemplateId::InteractionTitleAllergyDrug, language)
                            .to_string(),
                    ),
                    (InteractionKind::FoodDrug, _) => (
                        WarningKind::FoodDrug,
                        self.templates.get(TemplateId::InteractionTitleFoodDrug, language).to_string(),
                    ),
                    (kind, _) => (
                        warning_kind(kind),
                        self.templates.render(
                            TemplateId::InteractionTitleAgent,
                            language,
                            &[("agent", i.interacting_agent.as_str())],
                        ),
                    ),
                };
                Warning {
                    kind,
                    severity,
                    title,
                    message: i.description.clone(),
                    recommendation: Some(i.recommendation.clone()),
                    allergen: (i.kind == InteractionKind::AllergyDrug).then(|| i.interacting_agent.clone()),
                    source_entity: None,
                }
            })
            .collect()
    }

    fn dosage_warning(&self, w: &DosageWarning, language: Language) -> Warning {
        Warning {
            kind: WarningKind::Dosage,
            severity: w.severity.risk_level(),
            title: self
                .templates
                .render(TemplateId::DosageWarningTitle, language, &[("title", w.title.as_str())]),
            message: w.description.clone(),
            recommendation: Some(w.recommendation.clone()),
            allergen: None,
            source_entity: None,
        }
    }
}

fn warning_kind(kind: InteractionKind) -> WarningKind {
    match kind {
        InteractionKind::FoodDrug | InteractionKind::DrugFood => WarningKind::FoodDrug,
        InteractionKind::AllergyDrug => WarningKind::AllergyDrug,
        InteractionKind::DrugDrug | InteractionKind::DrugCondition => WarningKind::DrugInteraction,
    }
}

/// Analyze with the curated drug and template tables.
pub fn analyze_medication(
    medication: &MedicationQuery,
    profile: &UserHealthProfile,
    language: Language,
) -> InteractionReport {
    InteractionClassifier::default().analyze(medication, profile, language)
}
