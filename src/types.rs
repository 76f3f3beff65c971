//! Core types used throughout the project.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a language identifier cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid language identifier '{0}'")]
pub struct LanguageIdError(pub String);

/// A language code with an optional region qualifier (e.g. `en`, `en-EU`).
///
/// Equality and hashing are by value, so two identifiers built from the same
/// code and region address the same translation tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId {
    pub code: String,
    pub region: Option<String>,
}

impl LanguageId {
    /// Language without a region qualifier.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), region: None }
    }

    #[must_use]
    pub fn with_region(code: impl Into<String>, region: impl Into<String>) -> Self {
        Self { code: code.into(), region: Some(region.into()) }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{region}", self.code),
            None => f.write_str(&self.code),
        }
    }
}

/// Parses `en`, `en-EU` or `en_EU`.
///
/// Only the first `-` or `_` splits the code from the region, so script
/// subtags stay with the region (`sr-Cyrl-BA` → `sr` + `Cyrl-BA`).
impl FromStr for LanguageId {
    type Err = LanguageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (code, region) = match trimmed.split_once(['-', '_']) {
            Some((code, region)) => (code, Some(region)),
            None => (trimmed, None),
        };

        let valid_part = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !valid_part(code) || region.is_some_and(|r| !valid_part(r)) {
            return Err(LanguageIdError(s.to_string()));
        }

        Ok(Self { code: code.to_string(), region: region.map(ToString::to_string) })
    }
}

/// The language part of every lookup: the current language and the default
/// language it falls back to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLanguages {
    pub current: Option<LanguageId>,
    pub default: Option<LanguageId>,
}

impl ActiveLanguages {
    /// Language used for lookups: the current one, or the default when no
    /// language has been activated yet.
    #[must_use]
    pub fn effective(&self) -> Option<&LanguageId> {
        self.current.as_ref().or(self.default.as_ref())
    }

    /// Returns true if `lang` is either the current or the default language.
    #[must_use]
    pub fn involves(&self, lang: &LanguageId) -> bool {
        self.current.as_ref() == Some(lang) || self.default.as_ref() == Some(lang)
    }
}
