use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "ja")]
    Ja,
}

impl Language {
    /// The locale code persisted in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhTw => "zh-TW",
            Self::Ja => "ja",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "zh-TW" => Ok(Self::ZhTw),
            "ja" => Ok(Self::Ja),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The theme name persisted in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unsupported theme: {other}")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user settings, stored as a single logical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Store-assigned identifier, absent before first insert.
    pub id: Option<i64>,
    pub lang: Language,
    pub theme: Theme,
    /// Set once the first-run populate path has written the row.
    pub is_populated: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: None,
            lang: Language::En,
            theme: Theme::Light,
            is_populated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_locale_codes() {
        for lang in [Language::En, Language::ZhTw, Language::Ja] {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn theme_round_trips() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.as_str(), "light");
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn default_settings_are_english_light() {
        let settings = Settings::default();
        assert_eq!(settings.lang, Language::En);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.id, None);
        assert_eq!(settings.is_populated, None);
    }
}
