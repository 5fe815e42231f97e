use std::{fmt::Display, str::FromStr};

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Closed set of languages content can be translated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "ru_RU")]
    RuRu,
}

pub const SUPPORTED_LANGUAGE_COUNT: usize = LanguageCode::ALL.len();

static LANGUAGE_TAGS: phf::Map<&'static str, LanguageCode> = phf_map! {
    "en" => LanguageCode::EnUs,
    "en-us" => LanguageCode::EnUs,
    "ru" => LanguageCode::RuRu,
    "ru-ru" => LanguageCode::RuRu,
};

impl LanguageCode {
    pub const ALL: [LanguageCode; 2] = [LanguageCode::EnUs, LanguageCode::RuRu];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::EnUs => "en_US",
            LanguageCode::RuRu => "ru_RU",
        }
    }

    /// Matches a BCP 47 like tag (`en`, `en-US`, `ru_RU`), case insensitive.
    /// Region subtags we do not know fall back to the primary language.
    pub fn from_language_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
        if let Some(code) = LANGUAGE_TAGS.get(tag.as_str()) {
            return Some(*code);
        }
        let primary = tag.split('-').next()?;
        LANGUAGE_TAGS.get(primary).copied()
    }

    /// First supported language from an `Accept-Language` header value,
    /// in order of appearance. Entries with `q=0` are skipped.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.split(';');
                let tag = parts.next()?;
                let rejected = parts.any(|p| {
                    p.trim()
                        .strip_prefix("q=")
                        .and_then(|q| q.parse::<f32>().ok())
                        .is_some_and(|q| q <= 0.0)
                });
                if rejected {
                    None
                } else {
                    Self::from_language_tag(tag)
                }
            })
            .next()
    }
}

impl Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownLanguageCode(s.to_string()))
    }
}
