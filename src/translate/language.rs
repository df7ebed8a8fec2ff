use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages offered in both translation forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Spanish,
    German,
    Portuguese,
    Italian,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Portuguese,
        Language::Italian,
    ];

    /// ISO 639-1 code, as expected by the document translation API
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
            Language::Portuguese => "pt",
            Language::Italian => "it",
        }
    }

    /// English label for selectors
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Portuguese => "Portuguese",
            Language::Italian => "Italian",
        }
    }

    /// Endonym used when prompting the completion model
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "français",
            Language::Spanish => "español",
            Language::German => "deutsch",
            Language::Portuguese => "português",
            Language::Italian => "italiano",
        }
    }

    /// Parse an optional form value. Blank values mean "not selected".
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Language>, UnsupportedLanguage> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLanguage(pub String);

impl fmt::Display for UnsupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language: {}", self.0)
    }
}

impl std::error::Error for UnsupportedLanguage {}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| {
                lang.code().eq_ignore_ascii_case(needle)
                    || lang.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnsupportedLanguage(needle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("fr".parse::<Language>(), Ok(Language::French));
        assert_eq!("Spanish".parse::<Language>(), Ok(Language::Spanish));
        assert_eq!(" GERMAN ".parse::<Language>(), Ok(Language::German));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn blank_selection_is_none() {
        assert_eq!(Language::parse_optional(None), Ok(None));
        assert_eq!(Language::parse_optional(Some("  ")), Ok(None));
        assert_eq!(Language::parse_optional(Some("pt")), Ok(Some(Language::Portuguese)));
        assert!(Language::parse_optional(Some("xx")).is_err());
    }

    #[test]
    fn native_names_for_prompts() {
        assert_eq!(Language::French.native_name(), "français");
        assert_eq!(Language::Portuguese.code(), "pt");
    }
}
