//! Locale handling for the bilingual (English / Arabic) output sets.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// NOTE: expect() is acceptable here: the pattern is a literal and cannot fail at runtime
static ARABIC_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{0600}-\u{06FF}]").expect("Invalid regex: Arabic block"));

/// Supported output language.
/// Deserializes from any code string; unsupported codes become English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    /// Parse a caller-supplied language code.
    ///
    /// Anything other than `ar` (case-insensitive) is treated as English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("ar") {
            Language::Ar
        } else {
            Language::En
        }
    }

    /// Returns the language code
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ar => "Arabic",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Language::from_code(code)
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Language::from_code(&code)
    }
}

/// Detect the language of free text: Arabic if any Arabic-block character is present.
pub fn detect_language(text: &str) -> Language {
    if ARABIC_SCRIPT.is_match(text) {
        Language::Ar
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("ar"), Language::Ar);
        assert_eq!(Language::from_code(" AR "), Language::Ar);
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code("fr"), Language::En);
        assert_eq!(Language::from_code(""), Language::En);
        assert_eq!(Language::Ar.code(), "ar");
    }

    #[test]
    fn test_deserialize_falls_back_to_english() {
        let lang: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(lang, Language::En);
        assert_eq!(serde_json::to_string(&Language::Ar).unwrap(), "\"ar\"");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("ما هو السكري؟"), Language::Ar);
        assert_eq!(detect_language("What is diabetes?"), Language::En);
        assert_eq!(detect_language(""), Language::En);
        assert_eq!(detect_language("Is حليب safe?"), Language::Ar);
    }
}
