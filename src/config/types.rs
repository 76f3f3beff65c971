use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::types::LanguageId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.filePattern")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `.translate.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateSettings {
    pub key_separator: String,

    /// Language used when no current language is set and as the lookup fallback.
    pub default_language: Option<String>,

    /// Resolve a key missing from the current language in the default language.
    pub use_default_language: bool,

    /// Reload on every request and merge the loaded tree under the resident one.
    pub merge_on_load: bool,

    pub translation_files: TranslationFilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    /// Relative to the project root
    pub directory: String,
    /// Appended to the language id to form the file name
    pub suffix: String,
    /// Relative to `directory`; restricts language discovery
    pub file_pattern: String,
}

impl TranslateSettings {
    /// Parsed `defaultLanguage`, if set and valid.
    #[must_use]
    pub fn default_language_id(&self) -> Option<LanguageId> {
        self.default_language.as_deref().and_then(|lang| lang.parse().ok())
    }

    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Unparsable default language
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if let Some(lang) = &self.default_language
            && let Err(e) = lang.parse::<LanguageId>()
        {
            errors.push(ValidationError::new("defaultLanguage", e.to_string()));
        }

        if self.translation_files.directory.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.directory",
                "The directory cannot be empty. Use \".\" for the project root",
            ));
        }

        if self.translation_files.suffix.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.suffix",
                "The suffix cannot be empty. Example: \".json\"",
            ));
        }

        if self.translation_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.translation_files.file_pattern) {
            errors.push(ValidationError::new(
                "translationFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.translation_files.file_pattern),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self {
            directory: "i18n".to_string(),
            suffix: ".json".to_string(),
            file_pattern: "**/*.json".to_string(),
        }
    }
}

impl Default for TranslateSettings {
    fn default() -> Self {
        Self {
            key_separator: ".".to_string(),
            default_language: None,
            use_default_language: true,
            merge_on_load: false,
            translation_files: TranslationFilesConfig::default(),
        }
    }
}
