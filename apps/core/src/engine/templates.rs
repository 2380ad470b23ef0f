//! Keyed template table: `(TemplateId, Language) -> text`.
//!
//! Lookups fall back to English when a locale entry is missing. Placeholders
//! use `{name}` syntax and are filled by [`TemplateTable::render`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::warn;

use super::locale::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    // Allergen classifier
    AllergenTitle,
    AllergenWarningHigh,
    AllergenWarningMedium,
    AllergenWarningLow,
    AllergenNoneRegistered,
    AllergenAdviceNone,
    AllergenAdviceHigh,
    AllergenAdviceMedium,
    AllergenAdviceLow,
    // Interaction classifier
    InteractionAdviceHigh,
    InteractionAdviceConsult,
    InteractionAdviceReview,
    InteractionAdviceLow,
    InteractionTitleAllergyDrug,
    InteractionTitleFoodDrug,
    InteractionTitleAgent,
    InteractionTitleCaution,
    DosageWarningTitle,
    UnknownMedication,
    // Knowledge base
    KbDiabetesGeneral,
    KbDiabetesType1,
    KbDiabetesType2,
    KbPrediabetes,
    KbAllergenGeneral,
    KbAllergenWithAllergies,
    KbGeneral,
    // Recommendation composer
    RecMealType1,
    RecMealType2,
    RecMealPrediabetes,
    RecAllergyWarning,
    RecPreferences,
    RecExerciseGeneral,
    RecExerciseDiabetes,
    RecNutrition,
    RecHealthGoals,
    RecGeneralAdvice,
    // Remote model prompt
    PromptIntro,
    PromptDiabetes,
    PromptAllergies,
    PromptRestrictions,
    PromptClosing,
}

/// (id, English, Arabic)
const CURATED: &[(TemplateId, &str, &str)] = &[
    (
        TemplateId::AllergenTitle,
        "⚠️ {allergen} Detected",
        "⚠️ تم اكتشاف {allergen}",
    ),
    (
        TemplateId::AllergenWarningHigh,
        "⚠️ WARNING: {allergen} detected in {food}. DO NOT CONSUME. This could cause a severe allergic reaction.",
        "⚠️ تحذير: تم اكتشاف {allergen} في {food}. لا تتناوله. قد يسبب ذلك رد فعل تحسسي شديد.",
    ),
    (
        TemplateId::AllergenWarningMedium,
        "⚠️ CAUTION: {allergen} may be present in {food}. Check ingredients carefully before consuming.",
        "⚠️ تنبيه: قد يوجد {allergen} في {food}. تحقق من المكونات بعناية قبل التناول.",
    ),
    (
        TemplateId::AllergenWarningLow,
        "ℹ️ Note: {allergen} might be present in {food}. Please verify ingredients.",
        "ℹ️ ملاحظة: قد يحتوي {food} على {allergen}. يرجى التحقق من المكونات.",
    ),
    (
        TemplateId::AllergenNoneRegistered,
        "No allergies registered in your profile",
        "لا توجد حساسيات مسجلة في ملفك الشخصي",
    ),
    (
        TemplateId::AllergenAdviceNone,
        "No allergens detected. Safe to consume based on your allergy profile.",
        "لم يتم اكتشاف مسببات حساسية. آمن للتناول بناءً على ملف الحساسية الخاص بك.",
    ),
    (
        TemplateId::AllergenAdviceHigh,
        "DO NOT CONSUME. This food contains allergens that pose a high risk to your health.",
        "لا تتناوله. يحتوي هذا الطعام على مسببات حساسية تشكل خطراً كبيراً على صحتك.",
    ),
    (
        TemplateId::AllergenAdviceMedium,
        "Exercise caution. Verify ingredients and consult with healthcare provider if uncertain.",
        "توخَّ الحذر. تحقق من المكونات واستشر مقدم الرعاية الصحية إذا لم تكن متأكداً.",
    ),
    (
        TemplateId::AllergenAdviceLow,
        "Low risk detected. Please verify ingredients before consuming.",
        "تم اكتشاف خطر منخفض. يرجى التحقق من المكونات قبل التناول.",
    ),
    (
        TemplateId::InteractionAdviceHigh,
        "DO NOT TAKE this medication without consulting your healthcare provider immediately.",
        "لا تتناول هذا الدواء دون استشارة مقدم الرعاية الصحية فوراً.",
    ),
    (
        TemplateId::InteractionAdviceConsult,
        "Consult your healthcare provider before taking this medication.",
        "استشر مقدم الرعاية الصحية قبل تناول هذا الدواء.",
    ),
    (
        TemplateId::InteractionAdviceReview,
        "Review the interactions and follow dietary recommendations carefully.",
        "راجع التفاعلات واتبع التوصيات الغذائية بعناية.",
    ),
    (
        TemplateId::InteractionAdviceLow,
        "No significant interactions detected. Continue to monitor for any adverse effects.",
        "لم يتم اكتشاف تفاعلات مهمة. استمر في مراقبة أي آثار جانبية.",
    ),
    (
        TemplateId::InteractionTitleAllergyDrug,
        "🚨 CRITICAL: Allergy-Drug Interaction",
        "🚨 حرج: تفاعل بين الحساسية والدواء",
    ),
    (
        TemplateId::InteractionTitleFoodDrug,
        "⚠️ WARNING: Food-Drug Interaction",
        "⚠️ تحذير: تفاعل بين الطعام والدواء",
    ),
    (
        TemplateId::InteractionTitleAgent,
        "⚠️ WARNING: Interaction with {agent}",
        "⚠️ تحذير: تفاعل مع {agent}",
    ),
    (
        TemplateId::InteractionTitleCaution,
        "⚠️ CAUTION: Potential Interaction",
        "⚠️ تنبيه: تفاعل محتمل",
    ),
    (
        TemplateId::DosageWarningTitle,
        "⚠️ Dosage warning: {title}",
        "⚠️ تحذير الجرعة: {title}",
    ),
    (
        TemplateId::UnknownMedication,
        "This medication is not in our database. Ask your pharmacist about interactions before taking it.",
        "هذا الدواء غير موجود في قاعدة بياناتنا. اسأل الصيدلي عن التفاعلات قبل تناوله.",
    ),
    (
        TemplateId::KbDiabetesGeneral,
        "For diabetes management, it's important to monitor carbohydrate intake, maintain stable blood sugar levels, and follow a balanced diet. Focus on whole grains, lean proteins, and plenty of vegetables.",
        "لإدارة مرض السكري، من المهم مراقبة تناول الكربوهيدرات والحفاظ على مستويات السكر في الدم مستقرة واتباع نظام غذائي متوازن. ركز على الحبوب الكاملة والبروتينات الخالية من الدهون والكثير من الخضروات.",
    ),
    (
        TemplateId::KbDiabetesType1,
        "For Type 1 diabetes, coordinate your meals with insulin timing. Count carbohydrates carefully and maintain consistent meal times. Always carry fast-acting glucose for emergencies.",
        "للسكري من النوع الأول، قم بتنسيق وجباتك مع توقيت الأنسولين. احسب الكربوهيدرات بعناية وحافظ على أوقات الوجبات ثابتة. احمل دائماً جلوكوز سريع المفعول للطوارئ.",
    ),
    (
        TemplateId::KbDiabetesType2,
        "For Type 2 diabetes, focus on portion control, low-glycemic foods, and regular physical activity. Monitor your blood sugar regularly and work with your healthcare team.",
        "للسكري من النوع الثاني، ركز على التحكم في الحصص والأطعمة منخفضة المؤشر الجلايسيمي والنشاط البدني المنتظم. راقب سكر الدم بانتظام واعمل مع فريق الرعاية الصحية الخاص بك.",
    ),
    (
        TemplateId::KbPrediabetes,
        "For prediabetes, lifestyle changes can prevent progression to Type 2 diabetes. Focus on whole foods, reduce added sugars, and increase physical activity.",
        "لمقدمات السكري، يمكن أن تمنع تغييرات نمط الحياة التقدم إلى السكري من النوع الثاني. ركز على الأطعمة الكاملة وقلل من السكريات المضافة وزد النشاط البدني.",
    ),
    (
        TemplateId::KbAllergenGeneral,
        "When checking for allergens, always read food labels carefully. Look for common allergens like nuts, dairy, gluten, shellfish, and eggs. When in doubt, avoid the food or contact the manufacturer.",
        "عند التحقق من مسببات الحساسية، اقرأ ملصقات الطعام بعناية دائماً. ابحث عن مسببات الحساسية الشائعة مثل المكسرات والألبان والجلوتين والمأكولات البحرية والبيض. عند الشك، تجنب الطعام أو اتصل بالشركة المصنعة.",
    ),
    (
        TemplateId::KbAllergenWithAllergies,
        "Based on your profile, you have allergies to: {allergies}. Always check ingredient lists carefully and avoid foods that may contain these allergens. Be cautious with processed foods and cross-contamination.",
        "بناءً على ملفك الشخصي، لديك حساسية من: {allergies}. تحقق دائماً من قوائم المكونات بعناية وتجنب الأطعمة التي قد تحتوي على هذه المواد المسببة للحساسية. كن حذراً مع الأطعمة المصنعة والتلوث المتبادل.",
    ),
    (
        TemplateId::KbGeneral,
        "I'm here to help with your health questions! I can assist with diabetes management, allergen information, lab result interpretation, and personalized dietary recommendations. What would you like to know?",
        "أنا هنا لمساعدتك في أسئلتك الصحية! يمكنني المساعدة في إدارة مرض السكري ومعلومات مسببات الحساسية وتفسير نتائج المختبر والتوصيات الغذائية الشخصية. ماذا تريد أن تعرف؟",
    ),
    (
        TemplateId::RecMealType1,
        "For Type 1 diabetes, coordinate meals with insulin. Include balanced carbs, proteins, and fats. Consider: grilled chicken with quinoa and vegetables, or salmon with sweet potato and broccoli.",
        "للسكري من النوع الأول، قم بتنسيق الوجبات مع الأنسولين. اشمل الكربوهيدرات والبروتينات والدهون المتوازنة. فكر في: دجاج مشوي مع الكينوا والخضروات، أو سمك السلمون مع البطاطا الحلوة والبروكلي.",
    ),
    (
        TemplateId::RecMealType2,
        "For Type 2 diabetes, focus on low-glycemic foods. Try: Mediterranean-style meals with fish, whole grains, and plenty of vegetables. Avoid processed foods and added sugars.",
        "للسكري من النوع الثاني، ركز على الأطعمة منخفضة المؤشر الجلايسيمي. جرب: وجبات على الطريقة المتوسطية مع السمك والحبوب الكاملة والكثير من الخضروات. تجنب الأطعمة المصنعة والسكريات المضافة.",
    ),
    (
        TemplateId::RecMealPrediabetes,
        "For prediabetes, emphasize whole foods and portion control. Consider: lean proteins, whole grains, and colorful vegetables. Limit refined carbs and sugars.",
        "لمقدمات السكري، ركز على الأطعمة الكاملة والتحكم في الحصص. فكر في: البروتينات الخالية من الدهون والحبوب الكاملة والخضروات الملونة. قلل من الكربوهيدرات المكررة والسكريات.",
    ),
    (
        TemplateId::RecAllergyWarning,
        "Important: You have allergies to {allergies}. Always check ingredient labels carefully. Consider allergen-free alternatives and be cautious with cross-contamination.",
        "مهم: لديك حساسية من {allergies}. تحقق دائماً من ملصقات المكونات بعناية. فكر في البدائل الخالية من مسببات الحساسية وكن حذراً مع التلوث المتبادل.",
    ),
    (
        TemplateId::RecPreferences,
        "Based on your preferences ({preferences}), focus on meals that align with your dietary style while managing your health needs.",
        "بناءً على تفضيلاتك ({preferences})، ركز على الوجبات التي تتماشى مع نمطك الغذائي مع إدارة احتياجاتك الصحية.",
    ),
    (
        TemplateId::RecExerciseGeneral,
        "Regular exercise helps manage blood sugar. Aim for 150 minutes of moderate activity per week, such as brisk walking, cycling, or swimming.",
        "التمرين المنتظم يساعد في إدارة سكر الدم. استهدف 150 دقيقة من النشاط المعتدل أسبوعياً، مثل المشي السريع أو ركوب الدراجات أو السباحة.",
    ),
    (
        TemplateId::RecExerciseDiabetes,
        "For diabetes management, combine aerobic exercise (walking, swimming) with strength training. Monitor blood sugar before and after exercise.",
        "لإدارة مرض السكري، اجمع بين التمارين الهوائية (المشي، السباحة) وتمارين القوة. راقب سكر الدم قبل وبعد التمرين.",
    ),
    (
        TemplateId::RecNutrition,
        "Based on your profile, aim for approximately {calories} calories per day. Target: {protein}g protein, {carbs}g carbs, {fat}g fat.",
        "بناءً على ملفك الشخصي، استهدف حوالي {calories} سعرة حرارية يومياً. الهدف: {protein} جم بروتين، {carbs} جم كربوهيدرات، {fat} جم دهون.",
    ),
    (
        TemplateId::RecHealthGoals,
        "To achieve your health goals, maintain consistency in your diet and exercise routine. Track your progress regularly and adjust as needed.",
        "لتحقيق أهدافك الصحية، حافظ على الاتساق في نظامك الغذائي وروتين التمارين. تتبع تقدمك بانتظام واضبط حسب الحاجة.",
    ),
    (
        TemplateId::RecGeneralAdvice,
        "Based on your health profile, I recommend maintaining a balanced diet, regular exercise, and consistent monitoring. Always consult with your healthcare provider for personalized medical advice.",
        "بناءً على ملفك الصحي الشخصي، أنصح بالحفاظ على نظام غذائي متوازن وتمرين منتظم ومراقبة مستمرة. استشر دائماً مقدم الرعاية الصحية الخاص بك للحصول على نصيحة طبية شخصية.",
    ),
    (
        TemplateId::PromptIntro,
        "You are an intelligent health assistant specialized in diabetes management, allergy information, lab result interpretation, and personalized dietary recommendations.",
        "أنت مساعد صحي ذكي متخصص في إدارة مرض السكري، معلومات الحساسية، تفسير نتائج المختبرات، والتوصيات الغذائية الشخصية.",
    ),
    (TemplateId::PromptDiabetes, "User has: {diabetes_type}", "المستخدم لديه: {diabetes_type}"),
    (TemplateId::PromptAllergies, "Allergies: {allergies}", "الحساسيات: {allergies}"),
    (
        TemplateId::PromptRestrictions,
        "Dietary Restrictions: {restrictions}",
        "القيود الغذائية: {restrictions}",
    ),
    (
        TemplateId::PromptClosing,
        "Provide helpful and accurate advice in English based on the user's profile.",
        "قدم نصائح مفيدة ودقيقة باللغة العربية بناءً على ملف المستخدم.",
    ),
];

static SHARED_TEMPLATES: LazyLock<Arc<TemplateTable>> =
    LazyLock::new(|| Arc::new(TemplateTable::curated()));

#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    entries: HashMap<(TemplateId, Language), String>,
}

impl TemplateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn curated() -> Self {
        CURATED
            .iter()
            .fold(Self::empty(), |table, &(id, en, ar)| {
                table
                    .with_entry(id, Language::En, en)
                    .with_entry(id, Language::Ar, ar)
            })
    }

    /// Process-wide handle to the curated table.
    pub fn shared() -> Arc<TemplateTable> {
        Arc::clone(&SHARED_TEMPLATES)
    }

    pub fn with_entry(
        mut self,
        id: TemplateId,
        language: Language,
        text: impl Into<String>,
    ) -> Self {
        self.entries.insert((id, language), text.into());
        self
    }

    /// Template text for `language`, falling back to English.
    pub fn get(&self, id: TemplateId, language: Language) -> &str {
        if let Some(text) = self.entries.get(&(id, language)) {
            return text;
        }
        match self.entries.get(&(id, Language::En)) {
            Some(text) => text,
            None => {
                warn!(template = ?id, language = %language, "Template missing in every locale");
                ""
            }
        }
    }

    /// Template text with `{name}` placeholders replaced.
    ///
    /// Substitution is a single pass over the template, so placeholders
    /// inside substituted values are left as they are.
    pub fn render(&self, id: TemplateId, language: Language, vars: &[(&str, &str)]) -> String {
        let template = self.get(id, language);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail.find('}').and_then(|close| {
                let name = &tail[1..close];
                vars.iter()
                    .find(|(var, _)| *var == name)
                    .map(|&(_, value)| (value, close))
            });
            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_entries_cover_both_locales() {
        let table = TemplateTable::curated();
        for (id, _, _) in CURATED {
            assert!(!table.get(*id, Language::En).is_empty(), "{:?}", id);
            assert!(!table.get(*id, Language::Ar).is_empty(), "{:?}", id);
        }
    }

    #[test]
    fn test_missing_locale_falls_back_to_english() {
        let table = TemplateTable::empty().with_entry(TemplateId::KbGeneral, Language::En, "hello");
        assert_eq!(table.get(TemplateId::KbGeneral, Language::Ar), "hello");
        assert_eq!(table.get(TemplateId::KbPrediabetes, Language::Ar), "");
    }

    #[test]
    fn test_render_interpolates_placeholders() {
        let table = TemplateTable::curated();
        let text = table.render(
            TemplateId::AllergenWarningHigh,
            Language::En,
            &[("allergen", "Milk"), ("food", "Cheese pizza")],
        );
        assert_eq!(
            text,
            "⚠️ WARNING: Milk detected in Cheese pizza. DO NOT CONSUME. This could cause a severe allergic reaction."
        );
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_values() {
        let table = TemplateTable::curated();
        let text = table.render(
            TemplateId::AllergenWarningHigh,
            Language::En,
            &[("allergen", "{food}"), ("food", "Cheese pizza")],
        );
        assert!(text.starts_with("⚠️ WARNING: {food} detected in Cheese pizza."));
    }

    #[test]
    fn test_render_keeps_unknown_and_unclosed_braces() {
        let table = TemplateTable::empty().with_entry(TemplateId::KbGeneral, Language::En, "{a} {b} {open");
        assert_eq!(table.render(TemplateId::KbGeneral, Language::En, &[("a", "1")]), "1 {b} {open");
    }
}
