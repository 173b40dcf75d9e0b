//! UI locale
//!
//! Selects the confirmation dialog's title and button labels. The set is
//! closed; unrecognized codes fall back to English.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported console languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Locale {
    /// `en`, also the fallback
    #[default]
    English,
    /// `cs`
    Czech,
}

/// Localized texts for the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmStrings {
    /// Dialog title
    pub title: &'static str,
    /// Proceed button label
    pub proceed: &'static str,
    /// Cancel button label
    pub cancel: &'static str,
}

impl Locale {
    /// Parse a language code, falling back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "cs" | "cz" | "cs-cz" | "czech" => Self::Czech,
            _ => Self::English,
        }
    }

    /// Language code as it appears in `CPM_LANG` and config files.
    pub fn to_code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Czech => "cs",
        }
    }

    /// Name of the language in itself.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Czech => "Čeština",
        }
    }

    /// Every supported locale.
    pub fn all() -> &'static [Locale] {
        &[Locale::English, Locale::Czech]
    }

    /// Texts for the confirmation dialog in this language.
    pub fn confirm_strings(self) -> ConfirmStrings {
        match self {
            Self::English => ConfirmStrings {
                title: "Confirm",
                proceed: "Yes, proceed",
                cancel: "Cancel",
            },
            Self::Czech => ConfirmStrings {
                title: "Potvrzení",
                proceed: "Ano, provést",
                cancel: "Zrušit",
            },
        }
    }
}

impl From<String> for Locale {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_code().to_string()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Locale::from_code("cs"), Locale::Czech);
        assert_eq!(Locale::from_code("CS"), Locale::Czech);
        assert_eq!(Locale::from_code("en"), Locale::English);
        assert_eq!(Locale::from_code("de"), Locale::English);
        assert_eq!(Locale::from_code(""), Locale::English);
    }

    #[test]
    fn test_confirm_strings() {
        assert_eq!(Locale::English.confirm_strings().title, "Confirm");
        assert_eq!(Locale::Czech.confirm_strings().proceed, "Ano, provést");
        assert_eq!(Locale::from_code("fr").confirm_strings().cancel, "Cancel");
    }

    #[test]
    fn test_round_trip_codes() {
        for locale in Locale::all() {
            assert_eq!(Locale::from_code(locale.to_code()), *locale);
        }
    }
}
